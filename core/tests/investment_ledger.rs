//! Investment ledger report tests.

use coop_core::aggregate::extract_investment_fact;
use coop_core::config::CoopConfig;
use coop_core::member::{Member, PaymentRecord};
use coop_core::report::build_investment_ledger;
use serde_json::{json, Value};

fn member(id: &str, name: &str, membership_id: Option<&str>, activities: Value) -> Member {
    Member {
        member_id: id.to_string(),
        name: name.to_string(),
        phone: None,
        join_date: None,
        payment: PaymentRecord {
            membership_id: membership_id.map(String::from),
            ..PaymentRecord::default()
        },
        activities,
        payments: json!({}),
        insurance: Default::default(),
        willing_to_work: String::new(),
        worker_name: None,
        worker_phone: None,
    }
}

/// Receipts REC-12, REC-3, REC-27 must come out ordered 3, 12, 27 with
/// serials 1, 2, 3 — regardless of input order.
#[test]
fn rows_sort_by_receipt_number_and_serials_are_positional() {
    let config = CoopConfig::default();
    let members = vec![
        member(
            "m-1",
            "First",
            Some("MB-1"),
            json!({ "2025": { "Sep": { "type": "investment", "amount": 100, "receipt": "REC-12" } } }),
        ),
        member(
            "m-2",
            "Second",
            Some("MB-2"),
            json!({ "2025": { "Sept": { "type": "investment", "amount": 200, "receipt": "REC-3" } } }),
        ),
        member(
            "m-3",
            "Third",
            Some("MB-3"),
            json!({ "2025": { "09": { "type": "investment", "amount": 300, "receipt": "REC-27" } } }),
        ),
    ];

    let rows = build_investment_ledger(&members, 2025, "Sep", &config.month_aliases);
    let receipts: Vec<&str> = rows.iter().map(|r| r.receipt.as_str()).collect();
    assert_eq!(receipts, vec!["REC-3", "REC-12", "REC-27"]);
    let serials: Vec<usize> = rows.iter().map(|r| r.serial).collect();
    assert_eq!(serials, vec![1, 2, 3]);
}

/// Both nesting shapes yield a fact: a bare investment-typed node and a
/// wrapper holding one under an `investment` key. Other activity types and
/// factless members are skipped without error.
#[test]
fn both_nesting_shapes_are_resolved_and_others_skipped() {
    let config = CoopConfig::default();
    let members = vec![
        member(
            "m-1",
            "Bare",
            None,
            json!({ "2025": { "Sep": { "type": "investment", "amount": 100, "receipt": "R-1" } } }),
        ),
        member(
            "m-2",
            "Wrapped",
            None,
            json!({ "2025": { "Sep": { "investment": { "amount": "250.5", "receipt": "R-2" } } } }),
        ),
        member(
            "m-3",
            "Loan",
            None,
            json!({ "2025": { "Sep": { "type": "loan_repayment", "amount": 900 } } }),
        ),
        member("m-4", "Absent", None, json!({})),
    ];

    let rows = build_investment_ledger(&members, 2025, "Sep", &config.month_aliases);
    assert_eq!(rows.len(), 2, "only the two investment facts survive");
    assert_eq!(rows[0].amount, 100.0);
    assert_eq!(rows[1].amount, 250.5, "string amounts parse as decimals");
}

/// The member column is "<membership_id> <name>", collapsing to the bare
/// name when the id is absent — never a stray separator.
#[test]
fn member_column_omits_absent_membership_id() {
    let config = CoopConfig::default();
    let members = vec![
        member(
            "m-1",
            "With Id",
            Some("MB-77"),
            json!({ "2025": { "Sep": { "type": "investment", "amount": 10, "receipt": "R-1" } } }),
        ),
        member(
            "m-2",
            "No Id",
            None,
            json!({ "2025": { "Sep": { "type": "investment", "amount": 20, "receipt": "R-2" } } }),
        ),
    ];

    let rows = build_investment_ledger(&members, 2025, "Sep", &config.month_aliases);
    assert_eq!(rows[0].member, "MB-77 With Id");
    assert_eq!(rows[1].member, "No Id");
}

/// Dates render as DD Mon YYYY; the audit-tracking columns ship blank for
/// manual completion.
#[test]
fn dates_format_and_audit_columns_are_blank() {
    let config = CoopConfig::default();
    let members = vec![member(
        "m-1",
        "Dated",
        None,
        json!({ "2025": { "Sep": { "type": "investment", "amount": 10,
                                    "receipt": "R-9", "date": "2025-09-05" } } }),
    )];

    let rows = build_investment_ledger(&members, 2025, "Sep", &config.month_aliases);
    assert_eq!(rows[0].date, "05 Sep 2025");
    assert_eq!(rows[0].posted_by, "");
    assert_eq!(rows[0].checked_by, "");
    assert_eq!(rows[0].remarks, "");
}

/// Extraction is total: none of the malformed shapes raises, and a missing
/// receipt sorts first by parsing as 0.
#[test]
fn extraction_never_errors_on_malformed_shapes() {
    assert!(extract_investment_fact(None).is_none());
    assert!(extract_investment_fact(Some(&json!(null))).is_none());
    assert!(extract_investment_fact(Some(&json!({ "type": "meeting" }))).is_none());
    assert!(extract_investment_fact(Some(&json!({ "investment": "oops" }))).is_none());

    let fact = extract_investment_fact(Some(&json!({
        "type": "investment", "amount": "not-a-number"
    })))
    .expect("investment-typed node yields a fact");
    assert_eq!(fact.amount, 0.0, "garbage amount normalizes to zero");
    assert_eq!(fact.receipt, "", "missing receipt is empty, sorts as 0");
}

/// Serials are recomputed per build: the same snapshot always yields the
/// same numbering, and a second call changes nothing.
#[test]
fn serials_are_recomputed_every_build() {
    let config = CoopConfig::default();
    let members = vec![member(
        "m-1",
        "Only",
        None,
        json!({ "2025": { "Sep": { "type": "investment", "amount": 10, "receipt": "R-5" } } }),
    )];

    let first = build_investment_ledger(&members, 2025, "Sep", &config.month_aliases);
    let second = build_investment_ledger(&members, 2025, "Sep", &config.month_aliases);
    assert_eq!(first[0].serial, 1);
    assert_eq!(second[0].serial, 1);
}
