//! Refund eligibility rules and the refund state transition.
//!
//! Eligibility is pure date arithmetic over the joining date; the evaluator
//! knows nothing about the Refunded flag. Bucket partitioning — every member
//! in exactly one of {Eligible, Waiting, Refunded} — happens here too, on
//! behalf of callers.

use crate::clock::Clock;
use crate::error::{CoopError, CoopResult};
use crate::member::Member;
use crate::store::CoopStore;
use crate::types::{MemberId, RecordId};
use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// One calendar year of membership before a refund can be requested.
const ELIGIBILITY_MONTHS: u32 = 12;

pub const REFUND_ENTRY_TYPE: &str = "membership_refund";

/// A transaction-ledger entry. Refund processing appends exactly one of
/// these alongside the member-flag update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub entry_id: RecordId,
    pub entry_type: String,
    pub amount: f64,
    pub member_id: Option<MemberId>,
    pub member_name: String,
    pub membership_id: Option<String>,
    pub receipt: String,
    pub created_at: String,
}

/// The date the member completes one calendar year. Chrono's month
/// arithmetic clamps Feb 29 joins to Feb 28 in non-leap years.
pub fn eligible_on(member: &Member) -> Option<NaiveDate> {
    member
        .payment
        .date_of_joining()
        .and_then(|d| d.checked_add_months(Months::new(ELIGIBILITY_MONTHS)))
}

/// False without a joining date; else true once a full calendar year has
/// elapsed.
pub fn is_refund_eligible(member: &Member, clock: &dyn Clock) -> bool {
    match eligible_on(member) {
        Some(date) => clock.today() >= date,
        None => false,
    }
}

/// Whole days until the member turns eligible, floored at zero. `None`
/// when the joining date is absent.
pub fn days_until_eligible(member: &Member, clock: &dyn Clock) -> Option<i64> {
    let date = eligible_on(member)?;
    Some((date - clock.today()).num_days().max(0))
}

/// The three refund buckets. Refunded is checked first so a member never
/// lands in two buckets; the union is always the full input set.
#[derive(Debug, Default)]
pub struct RefundBuckets<'a> {
    pub eligible: Vec<&'a Member>,
    pub waiting: Vec<&'a Member>,
    pub refunded: Vec<&'a Member>,
}

pub fn bucket_members<'a>(members: &'a [Member], clock: &dyn Clock) -> RefundBuckets<'a> {
    let mut buckets = RefundBuckets::default();
    for member in members {
        if member.payment.refunded {
            buckets.refunded.push(member);
        } else if is_refund_eligible(member, clock) {
            buckets.eligible.push(member);
        } else {
            buckets.waiting.push(member);
        }
    }
    buckets
}

/// Process a membership refund: flag the member's payment record and append
/// the matching ledger entry.
///
/// The two writes are dependent but not atomic. If the ledger append fails
/// after the member update succeeded, the result is `TornRefund` — never
/// success, never a retry. The caller repairs by hand.
pub fn execute_refund(
    store: &CoopStore,
    member: &Member,
    amount: f64,
    clock: &dyn Clock,
) -> CoopResult<LedgerEntry> {
    if member.payment.refunded {
        return Err(anyhow::anyhow!("Member {} is already refunded", member.member_id).into());
    }

    store.mark_member_refunded(&member.member_id, clock.today(), amount)?;

    let entry = LedgerEntry {
        entry_id: uuid::Uuid::new_v4().to_string(),
        entry_type: REFUND_ENTRY_TYPE.to_string(),
        amount,
        member_id: Some(member.member_id.clone()),
        member_name: member.name.clone(),
        membership_id: member.payment.membership_id.clone(),
        receipt: format!("RFD-{}", clock.now().timestamp()),
        created_at: clock.now().to_rfc3339(),
    };

    if let Err(e) = store.append_ledger_entry(&entry) {
        log::error!(
            "Refund ledger append failed for member {} after flag update: {e}",
            member.member_id
        );
        return Err(CoopError::TornRefund {
            member_id: member.member_id.clone(),
            member_updated: true,
            ledger_written: false,
        });
    }

    Ok(entry)
}

/// Members flagged refunded with no matching ledger entry. Feeds manual
/// repair of torn refunds.
pub fn find_torn_refunds(store: &CoopStore) -> CoopResult<Vec<MemberId>> {
    let mut torn = Vec::new();
    for member in store.all_members()? {
        if member.payment.refunded && !store.has_refund_entry_for(&member.member_id)? {
            torn.push(member.member_id);
        }
    }
    Ok(torn)
}
