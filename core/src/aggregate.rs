//! Financial fact extraction over legacy period trees.
//!
//! RULE: Extraction is total. A period node of any shape — absent, a
//! different activity type, a wrapper missing its payload, amounts stored
//! as strings — yields a well-defined fact or a well-defined absence.
//! One malformed member must never blank a whole report.

use crate::config::MonthAlias;
use crate::member::{parse_flexible_date, Member};
use crate::period::lookup_period;
use chrono::NaiveDate;
use serde_json::Value;

/// One investment fact resolved from a member's (year, month) slot.
#[derive(Debug, Clone, PartialEq)]
pub struct InvestmentFact {
    pub amount: f64,
    pub fine: f64,
    pub receipt: String,
    pub date: Option<NaiveDate>,
}

/// The shapes a stored period node can take. Wrapper objects are checked
/// before bare investment nodes — that probing order is part of the
/// contract, not an implementation detail.
#[derive(Debug, Clone, PartialEq)]
pub enum PeriodNode {
    /// Object carrying the fact under a nested `investment` key.
    Wrapped(InvestmentFact),
    /// The node itself is the investment fact.
    Investment(InvestmentFact),
    /// Present, but some other activity type.
    Other,
    /// Nothing stored for the slot.
    Empty,
}

pub fn classify_period_node(node: Option<&Value>) -> PeriodNode {
    let Some(node) = node else {
        return PeriodNode::Empty;
    };
    if node.is_null() {
        return PeriodNode::Empty;
    }
    if let Some(inner) = node.get("investment") {
        if inner.is_object() {
            return PeriodNode::Wrapped(parse_fact(inner));
        }
        // An `investment` key holding a non-object is drift we cannot
        // interpret; fall through to the bare-shape check.
    }
    if is_investment_shaped(node) {
        return PeriodNode::Investment(parse_fact(node));
    }
    PeriodNode::Other
}

/// Resolve a period node to its investment fact, if it has one.
pub fn extract_investment_fact(node: Option<&Value>) -> Option<InvestmentFact> {
    match classify_period_node(node) {
        PeriodNode::Wrapped(fact) | PeriodNode::Investment(fact) => Some(fact),
        PeriodNode::Other | PeriodNode::Empty => None,
    }
}

fn is_investment_shaped(node: &Value) -> bool {
    node.get("type")
        .and_then(Value::as_str)
        .is_some_and(|t| t.eq_ignore_ascii_case("investment"))
}

fn parse_fact(node: &Value) -> InvestmentFact {
    InvestmentFact {
        amount: coerce_decimal(node.get("amount"), "amount"),
        fine: coerce_decimal(node.get("fine"), "fine"),
        receipt: coerce_label(node.get("receipt")),
        date: node
            .get("date")
            .and_then(Value::as_str)
            .and_then(parse_flexible_date),
    }
}

/// Decimal coercion for legacy values: JSON numbers pass through, numeric
/// strings parse, everything else normalizes to zero. Present-but-garbage
/// values are logged; plain absence is not.
pub fn coerce_decimal(value: Option<&Value>, field: &str) -> f64 {
    match value {
        None | Some(Value::Null) => 0.0,
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => match s.trim().parse::<f64>() {
            Ok(v) => v,
            Err(_) => {
                log::warn!("Unparseable {field} value {s:?}; normalized to 0");
                0.0
            }
        },
        Some(other) => {
            log::warn!("Unexpected {field} shape {other}; normalized to 0");
            0.0
        }
    }
}

fn coerce_label(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// The integer sequence embedded in a receipt label — the canonical sort
/// key within a period. Absent or non-numeric labels parse as 0.
pub fn receipt_number(receipt: &str) -> i64 {
    let digits: String = receipt
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().unwrap_or(0)
}

/// Count members whose legacy `payments` tree shows a strictly positive
/// payment for the period. Values may be bare numbers, numeric strings, or
/// objects exposing an `amount` field.
pub fn count_paid_members(
    members: &[Member],
    year: i32,
    month: &str,
    aliases: &[MonthAlias],
) -> usize {
    members
        .iter()
        .filter(|m| {
            lookup_period(&m.payments, year, month, aliases)
                .map(|v| paid_amount(v) > 0.0)
                .unwrap_or(false)
        })
        .count()
}

fn paid_amount(value: &Value) -> f64 {
    match value {
        Value::Object(_) => coerce_decimal(value.get("amount"), "amount"),
        _ => coerce_decimal(Some(value), "payment"),
    }
}
