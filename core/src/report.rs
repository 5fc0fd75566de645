//! Report row assembly.
//!
//! Column sets and their order are part of the exported-report contract —
//! downstream spreadsheet generation preserves them verbatim. Serial
//! numbers are positional, recomputed on every build, and never persisted.

use crate::aggregate::{extract_investment_fact, receipt_number, InvestmentFact};
use crate::clock::Clock;
use crate::config::MonthAlias;
use crate::member::{yes, InsuranceCategory, Member};
use crate::period::lookup_period;
use chrono::{Months, NaiveDate};
use serde::Serialize;

/// One row of the monthly investment ledger. Field order is the export
/// order. The trailing audit columns ship blank, reserved for manual
/// completion on the printed sheet.
#[derive(Debug, Clone, Serialize)]
pub struct LedgerRow {
    pub serial: usize,
    pub date: String,
    pub member: String,
    pub receipt: String,
    pub amount: f64,
    pub fine: f64,
    pub posted_by: String,
    pub checked_by: String,
    pub remarks: String,
}

/// Build the investment ledger for one period: resolve each member's
/// period node, keep the investment facts, order ascending by the number
/// embedded in the receipt label (absent parses as 0 and sorts first), and
/// assign 1-based serials in that order.
pub fn build_investment_ledger(
    members: &[Member],
    year: i32,
    month: &str,
    aliases: &[MonthAlias],
) -> Vec<LedgerRow> {
    let mut facts: Vec<(InvestmentFact, &Member)> = members
        .iter()
        .filter_map(|m| {
            let node = lookup_period(&m.activities, year, month, aliases);
            extract_investment_fact(node).map(|fact| (fact, m))
        })
        .collect();

    facts.sort_by_key(|(fact, _)| receipt_number(&fact.receipt));

    facts
        .into_iter()
        .enumerate()
        .map(|(i, (fact, member))| LedgerRow {
            serial: i + 1,
            date: fact.date.map(format_report_date).unwrap_or_default(),
            member: composite_name(member),
            receipt: fact.receipt,
            amount: fact.amount,
            fine: fact.fine,
            posted_by: String::new(),
            checked_by: String::new(),
            remarks: String::new(),
        })
        .collect()
}

/// `"<membership_id> <name>"`, or the bare name when the id is absent —
/// never a stray separator.
fn composite_name(member: &Member) -> String {
    match member.payment.membership_id.as_deref() {
        Some(id) if !id.trim().is_empty() => format!("{id} {}", member.name),
        _ => member.name.clone(),
    }
}

/// `DD Mon YYYY`, e.g. `07 Sep 2025`.
pub fn format_report_date(date: NaiveDate) -> String {
    date.format("%d %b %Y").to_string()
}

/// One row of the insurance expiry report.
#[derive(Debug, Clone, Serialize)]
pub struct ExpiryRow {
    pub member: String,
    pub category: String,
    pub plan: String,
    pub expiry_date: String,
    pub days_left: i64,
}

/// Enabled policies whose anniversary falls within `horizon_months` of
/// today. Already-past anniversaries are included with zero or negative
/// `days_left` — clamping would hide overdue renewals — and sort first.
pub fn build_insurance_expiry_report(
    members: &[Member],
    clock: &dyn Clock,
    horizon_months: u32,
) -> Vec<ExpiryRow> {
    let today = clock.today();
    let cutoff = today
        .checked_add_months(Months::new(horizon_months))
        .unwrap_or(today);

    let mut rows: Vec<ExpiryRow> = Vec::new();
    for member in members {
        for category in InsuranceCategory::all() {
            let policy = member.insurance.policy(category);
            if !yes(&policy.enabled) {
                continue;
            }
            let Some(anniversary) = policy.anniversary() else {
                continue;
            };
            if anniversary <= cutoff {
                rows.push(ExpiryRow {
                    member: composite_name(member),
                    category: category.label().to_string(),
                    plan: policy.plan.clone().unwrap_or_default(),
                    expiry_date: format_report_date(anniversary),
                    days_left: (anniversary - today).num_days(),
                });
            }
        }
    }
    rows.sort_by_key(|r| r.days_left);
    rows
}

/// Members interested in cover they do not yet have: enabled NO and
/// want-insurance YES for the category. Already-covered members are never
/// "interested".
pub fn build_interest_list<'a>(
    members: &'a [Member],
    category: InsuranceCategory,
) -> Vec<&'a Member> {
    members
        .iter()
        .filter(|m| {
            let policy = m.insurance.policy(category);
            !yes(&policy.enabled) && yes(&policy.want_insurance)
        })
        .collect()
}

/// Members whose top-level willing-to-work flag is YES, independent of any
/// insurance category.
pub fn build_work_interest_list(members: &[Member]) -> Vec<&Member> {
    members.iter().filter(|m| yes(&m.willing_to_work)).collect()
}
