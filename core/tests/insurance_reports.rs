//! Insurance expiry and interest-list reports.

use chrono::NaiveDate;
use coop_core::clock::FixedClock;
use coop_core::member::{InsuranceCategory, InsurancePolicy, InsuranceSet, Member};
use coop_core::report::{
    build_insurance_expiry_report, build_interest_list, build_work_interest_list,
};
use serde_json::json;

fn member_with_insurance(id: &str, insurance: InsuranceSet, willing_to_work: &str) -> Member {
    Member {
        member_id: id.to_string(),
        name: format!("Member {id}"),
        phone: None,
        join_date: None,
        payment: Default::default(),
        activities: json!({}),
        payments: json!({}),
        insurance,
        willing_to_work: willing_to_work.to_string(),
        worker_name: None,
        worker_phone: None,
    }
}

fn policy(enabled: &str, want: &str, anniversary: Option<&str>, plan: Option<&str>) -> InsurancePolicy {
    InsurancePolicy {
        enabled: enabled.to_string(),
        want_insurance: want.to_string(),
        anniversary_date: anniversary.map(String::from),
        plan: plan.map(String::from),
    }
}

fn clock() -> FixedClock {
    FixedClock::on(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap())
}

/// Policies inside the two-month window surface; an already-expired policy
/// surfaces with negative days and sorts first. Nothing is clamped.
#[test]
fn expiry_window_includes_overdue_and_sorts_soonest_first() {
    let members = vec![
        member_with_insurance(
            "m-1",
            InsuranceSet {
                health: policy("YES", "NO", Some("2025-07-15"), Some("Family")),
                ..InsuranceSet::default()
            },
            "NO",
        ),
        member_with_insurance(
            "m-2",
            InsuranceSet {
                accidental: policy("YES", "NO", Some("2025-05-20"), None),
                ..InsuranceSet::default()
            },
            "NO",
        ),
        member_with_insurance(
            "m-3",
            InsuranceSet {
                term_life: policy("YES", "NO", Some("2025-12-01"), None),
                ..InsuranceSet::default()
            },
            "NO",
        ),
    ];

    let rows = build_insurance_expiry_report(&members, &clock(), 2);
    assert_eq!(rows.len(), 2, "December is outside the window");
    assert_eq!(rows[0].category, "accidental");
    assert_eq!(rows[0].days_left, -12, "overdue stays negative and first");
    assert_eq!(rows[1].category, "health");
    assert_eq!(rows[1].days_left, 44);
    assert_eq!(rows[1].plan, "Family");
}

/// Disabled policies never appear in the expiry report, whatever their
/// dates say.
#[test]
fn disabled_policies_are_ignored_by_expiry() {
    let members = vec![member_with_insurance(
        "m-1",
        InsuranceSet {
            health: policy("NO", "YES", Some("2025-06-05"), None),
            ..InsuranceSet::default()
        },
        "NO",
    )];

    let rows = build_insurance_expiry_report(&members, &clock(), 2);
    assert!(rows.is_empty());
}

/// Interested means wanting cover you do not have: enabled YES excludes a
/// member from the interest list even with want_insurance YES.
#[test]
fn covered_members_are_never_interested() {
    let members = vec![
        member_with_insurance(
            "m-1",
            InsuranceSet {
                health: policy("YES", "YES", None, None),
                ..InsuranceSet::default()
            },
            "NO",
        ),
        member_with_insurance(
            "m-2",
            InsuranceSet {
                health: policy("NO", "YES", None, None),
                ..InsuranceSet::default()
            },
            "NO",
        ),
        member_with_insurance(
            "m-3",
            InsuranceSet {
                health: policy("NO", "NO", None, None),
                ..InsuranceSet::default()
            },
            "NO",
        ),
    ];

    let interested = build_interest_list(&members, InsuranceCategory::Health);
    assert_eq!(interested.len(), 1);
    assert_eq!(interested[0].member_id, "m-2");
}

/// Interest lists are per category: wanting health says nothing about
/// term life.
#[test]
fn interest_is_per_category() {
    let members = vec![member_with_insurance(
        "m-1",
        InsuranceSet {
            health: policy("NO", "YES", None, None),
            ..InsuranceSet::default()
        },
        "NO",
    )];

    assert_eq!(build_interest_list(&members, InsuranceCategory::Health).len(), 1);
    assert!(build_interest_list(&members, InsuranceCategory::TermLife).is_empty());
}

/// The work list keys off the single top-level flag, independent of any
/// insurance category, and tolerates legacy casing.
#[test]
fn work_interest_uses_the_top_level_flag() {
    let members = vec![
        member_with_insurance("m-1", InsuranceSet::default(), "YES"),
        member_with_insurance("m-2", InsuranceSet::default(), "yes"),
        member_with_insurance("m-3", InsuranceSet::default(), "NO"),
        member_with_insurance("m-4", InsuranceSet::default(), ""),
    ];

    let workers = build_work_interest_list(&members);
    let ids: Vec<&str> = workers.iter().map(|m| m.member_id.as_str()).collect();
    assert_eq!(ids, vec!["m-1", "m-2"]);
}
