//! Refund state transition: two dependent writes, torn-state reporting.

use chrono::NaiveDate;
use coop_core::clock::FixedClock;
use coop_core::eligibility::{execute_refund, find_torn_refunds, REFUND_ENTRY_TYPE};
use coop_core::error::CoopError;
use coop_core::member::{Member, PaymentRecord};
use coop_core::store::CoopStore;
use serde_json::json;

fn store_with_member(id: &str, membership_id: Option<&str>) -> (CoopStore, Member) {
    let store = CoopStore::in_memory().unwrap();
    store.migrate().unwrap();
    let member = Member {
        member_id: id.to_string(),
        name: format!("Member {id}"),
        phone: None,
        join_date: None,
        payment: PaymentRecord {
            membership_id: membership_id.map(String::from),
            date_of_joining: Some("2020-01-01".to_string()),
            ..PaymentRecord::default()
        },
        activities: json!({}),
        payments: json!({}),
        insurance: Default::default(),
        willing_to_work: String::new(),
        worker_name: None,
        worker_phone: None,
    };
    store.insert_member(&member, "2020-01-01T00:00:00Z").unwrap();
    (store, member)
}

fn clock() -> FixedClock {
    FixedClock::on(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap())
}

/// A successful refund flips the payment record AND appends exactly one
/// membership_refund ledger entry carrying the same amount.
#[test]
fn refund_writes_member_flag_and_ledger_entry() {
    let (store, member) = store_with_member("m-1", Some("MB-9"));

    let entry = execute_refund(&store, &member, 10_000.0, &clock()).unwrap();
    assert_eq!(entry.entry_type, REFUND_ENTRY_TYPE);
    assert_eq!(entry.amount, 10_000.0);
    assert_eq!(entry.membership_id.as_deref(), Some("MB-9"));
    assert!(entry.receipt.starts_with("RFD-"), "receipt is timestamp-derived");

    let stored = store.get_member("m-1").unwrap().unwrap();
    assert!(stored.payment.refunded);
    assert_eq!(stored.payment.refund_amount, Some(10_000.0));
    assert_eq!(
        stored.payment.refund_date,
        Some(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap())
    );

    let entries = store.ledger_entries_of_type(REFUND_ENTRY_TYPE).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].member_name, "Member m-1");
    assert_eq!(store.refunded_member_count().unwrap(), 1);
}

/// Refunding an already-refunded member is rejected before any write.
#[test]
fn double_refund_is_rejected() {
    let (store, member) = store_with_member("m-1", None);
    execute_refund(&store, &member, 10_000.0, &clock()).unwrap();

    let refreshed = store.get_member("m-1").unwrap().unwrap();
    let err = execute_refund(&store, &refreshed, 10_000.0, &clock()).unwrap_err();
    assert!(
        matches!(err, CoopError::Other(_)),
        "expected a rejection, got {err:?}"
    );
    assert_eq!(store.ledger_count().unwrap(), 1, "no second ledger entry");
}

/// When the ledger append fails after the member flag is set, the outcome
/// is the torn-refund failure naming which sub-write survived — never a
/// success report.
#[test]
fn failed_ledger_append_reports_torn_state() {
    let (store, member) = store_with_member("m-1", None);
    store.drop_ledger_table().unwrap();

    let err = execute_refund(&store, &member, 10_000.0, &clock()).unwrap_err();
    match err {
        CoopError::TornRefund {
            member_id,
            member_updated,
            ledger_written,
        } => {
            assert_eq!(member_id, "m-1");
            assert!(member_updated);
            assert!(!ledger_written);
        }
        other => panic!("expected TornRefund, got {other:?}"),
    }

    // The member flag did land; the scan-side detection must agree once
    // the ledger table is back.
    let stored = store.get_member("m-1").unwrap().unwrap();
    assert!(stored.payment.refunded, "first sub-write persisted");
}

/// The repair scan finds members flagged refunded with no matching ledger
/// entry, and only those.
#[test]
fn torn_refund_scan_finds_flag_without_entry() {
    let (store, member) = store_with_member("m-1", None);

    // A clean refund first: not torn.
    execute_refund(&store, &member, 10_000.0, &clock()).unwrap();
    assert!(find_torn_refunds(&store).unwrap().is_empty());

    // Flag a second member directly, skipping the ledger: torn.
    let other = Member {
        member_id: "m-2".to_string(),
        name: "Member m-2".to_string(),
        phone: None,
        join_date: None,
        payment: PaymentRecord::default(),
        activities: json!({}),
        payments: json!({}),
        insurance: Default::default(),
        willing_to_work: String::new(),
        worker_name: None,
        worker_phone: None,
    };
    store.insert_member(&other, "2020-01-01T00:00:00Z").unwrap();
    store
        .mark_member_refunded("m-2", NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(), 10_000.0)
        .unwrap();

    let torn = find_torn_refunds(&store).unwrap();
    assert_eq!(torn, vec!["m-2".to_string()]);
}
