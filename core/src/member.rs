//! Member records as the store hands them out.
//!
//! Scalar fields are typed; the activity and payment trees stay raw
//! `serde_json::Value` so every legacy key spelling survives the round trip.
//! Old records also carry "YES"/"NO" string flags and free-form date
//! strings — those are kept verbatim and interpreted through the tolerant
//! helpers below.

use crate::types::MemberId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    pub member_id: MemberId,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub join_date: Option<NaiveDate>,
    #[serde(default)]
    pub payment: PaymentRecord,
    /// year-key → month-key → period node. Keys are legacy-inconsistent.
    #[serde(default = "empty_tree")]
    pub activities: Value,
    /// Second legacy tree (year → month → paid value), used only for
    /// "did they pay" checks.
    #[serde(default = "empty_tree")]
    pub payments: Value,
    #[serde(default)]
    pub insurance: InsuranceSet,
    #[serde(default)]
    pub willing_to_work: String,
    #[serde(default)]
    pub worker_name: Option<String>,
    #[serde(default)]
    pub worker_phone: Option<String>,
}

fn empty_tree() -> Value {
    Value::Object(serde_json::Map::new())
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentRecord {
    #[serde(default)]
    pub membership_id: Option<String>,
    /// Free-form legacy date string; read through `date_of_joining()`.
    #[serde(default)]
    pub date_of_joining: Option<String>,
    #[serde(default)]
    pub refunded: bool,
    #[serde(default)]
    pub refund_date: Option<NaiveDate>,
    #[serde(default)]
    pub refund_amount: Option<f64>,
    #[serde(default)]
    pub share_count: Option<u32>,
    #[serde(default)]
    pub share_value: Option<f64>,
}

impl PaymentRecord {
    pub fn date_of_joining(&self) -> Option<NaiveDate> {
        self.date_of_joining.as_deref().and_then(parse_flexible_date)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsuranceCategory {
    Health,
    Accidental,
    TermLife,
}

impl InsuranceCategory {
    pub fn all() -> [InsuranceCategory; 3] {
        [
            InsuranceCategory::Health,
            InsuranceCategory::Accidental,
            InsuranceCategory::TermLife,
        ]
    }

    pub fn label(self) -> &'static str {
        match self {
            InsuranceCategory::Health => "health",
            InsuranceCategory::Accidental => "accidental",
            InsuranceCategory::TermLife => "term_life",
        }
    }
}

impl std::fmt::Display for InsuranceCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InsuranceSet {
    #[serde(default)]
    pub health: InsurancePolicy,
    #[serde(default)]
    pub accidental: InsurancePolicy,
    #[serde(default)]
    pub term_life: InsurancePolicy,
}

impl InsuranceSet {
    pub fn policy(&self, category: InsuranceCategory) -> &InsurancePolicy {
        match category {
            InsuranceCategory::Health => &self.health,
            InsuranceCategory::Accidental => &self.accidental,
            InsuranceCategory::TermLife => &self.term_life,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InsurancePolicy {
    /// Legacy "YES"/"NO" flag.
    #[serde(default)]
    pub enabled: String,
    #[serde(default)]
    pub want_insurance: String,
    /// Policy anniversary as a free-form legacy date string.
    #[serde(default)]
    pub anniversary_date: Option<String>,
    #[serde(default)]
    pub plan: Option<String>,
}

impl InsurancePolicy {
    pub fn anniversary(&self) -> Option<NaiveDate> {
        self.anniversary_date.as_deref().and_then(parse_flexible_date)
    }
}

/// Interpret a legacy "YES"/"NO" flag. Anything that is not a spelling of
/// yes counts as no.
pub fn yes(flag: &str) -> bool {
    flag.trim().eq_ignore_ascii_case("yes")
}

/// Parse the date spellings found in member trees. ISO first, then the
/// day-first forms older records carry. Unparseable input is `None`, never
/// an error.
pub fn parse_flexible_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    for format in ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return Some(date);
        }
    }
    None
}
