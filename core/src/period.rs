//! Period key resolution.
//!
//! Member trees were written by several generations of the front office, so
//! one calendar slot hides behind many spellings: months as "Sep", "Sept",
//! "September", "9" or "09"; years as string or number. The resolver maps a
//! canonical label to every spelling seen historically and probes them in a
//! fixed order, most specific first.
//!
//! RULE: Resolution never invents data. A key that matches nothing is
//! "not found", which callers must keep distinct from a present zero value.

use crate::config::MonthAlias;
use serde_json::Value;

/// The 12 canonical 3-letter month labels, in calendar order.
pub const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

const FULL_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// 1-based month number for a canonical label.
pub fn month_number(label: &str) -> Option<u32> {
    MONTHS.iter().position(|m| *m == label).map(|i| i as u32 + 1)
}

/// Every on-disk key variant to probe for a canonical month label, most
/// specific first: the label itself, configured legacy aliases, the full
/// English name, the plain month number, the zero-padded month number.
///
/// Unrecognized labels degrade to the raw label plus its first three
/// characters — old trees occasionally carry full names as primary keys.
pub fn candidate_keys(label: &str, aliases: &[MonthAlias]) -> Vec<String> {
    let mut keys: Vec<String> = Vec::with_capacity(5);
    keys.push(label.to_string());

    match month_number(label) {
        Some(n) => {
            for alias in aliases {
                if alias.canonical == label {
                    keys.push(alias.alias.clone());
                }
            }
            keys.push(FULL_NAMES[(n - 1) as usize].to_string());
            keys.push(n.to_string());
            keys.push(format!("{n:02}"));
        }
        None => {
            let prefix: String = label.chars().take(3).collect();
            keys.push(prefix);
        }
    }

    keys.dedup();
    keys
}

static NULL: Value = Value::Null;

/// Probe a year→month tree for the given year, first by its plain digit
/// form, then against any key whose parsed numeric value matches — old
/// writers padded or re-typed year keys. Returns `Value::Null` when no
/// form is present, so month probes on the result fall through naturally.
pub fn resolve_year_node(tree: &Value, year: i32) -> &Value {
    let as_string = year.to_string();
    if let Some(node) = tree.get(&as_string) {
        return node;
    }
    if let Some(map) = tree.as_object() {
        for (key, node) in map {
            if key.trim().parse::<i32>() == Ok(year) {
                return node;
            }
        }
    }
    &NULL
}

/// First value found for (year, month) across every month-key candidate, or
/// `None`. Absence is distinct from a present-but-zero value.
pub fn lookup_period<'a>(
    tree: &'a Value,
    year: i32,
    month: &str,
    aliases: &[MonthAlias],
) -> Option<&'a Value> {
    let year_node = resolve_year_node(tree, year);
    for key in candidate_keys(month, aliases) {
        if let Some(node) = year_node.get(&key) {
            return Some(node);
        }
    }
    None
}

// ── Quarters ───────────────────────────────────────────────────────

/// A fixed group of 3 consecutive canonical months. Ordering is calendar
/// order, so sorting descending puts the most recent quarter first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Quarter {
    Q1,
    Q2,
    Q3,
    Q4,
}

impl Quarter {
    pub fn label(self) -> &'static str {
        match self {
            Quarter::Q1 => "Q1",
            Quarter::Q2 => "Q2",
            Quarter::Q3 => "Q3",
            Quarter::Q4 => "Q4",
        }
    }

    /// The 3 canonical month labels this quarter covers.
    pub fn months(self) -> [&'static str; 3] {
        match self {
            Quarter::Q1 => ["Jan", "Feb", "Mar"],
            Quarter::Q2 => ["Apr", "May", "Jun"],
            Quarter::Q3 => ["Jul", "Aug", "Sep"],
            Quarter::Q4 => ["Oct", "Nov", "Dec"],
        }
    }

    pub fn of_month(label: &str) -> Option<Quarter> {
        let n = month_number(label)?;
        Some(match (n - 1) / 3 {
            0 => Quarter::Q1,
            1 => Quarter::Q2,
            2 => Quarter::Q3,
            _ => Quarter::Q4,
        })
    }

    pub fn parse(s: &str) -> Option<Quarter> {
        match s.trim() {
            "Q1" | "q1" => Some(Quarter::Q1),
            "Q2" | "q2" => Some(Quarter::Q2),
            "Q3" | "q3" => Some(Quarter::Q3),
            "Q4" | "q4" => Some(Quarter::Q4),
            _ => None,
        }
    }
}

impl std::fmt::Display for Quarter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_label_falls_back_to_raw_and_prefix() {
        let keys = candidate_keys("Septiembre", &[]);
        assert_eq!(keys, vec!["Septiembre".to_string(), "Sep".to_string()]);
    }

    #[test]
    fn may_does_not_duplicate_its_full_name() {
        // "May" is its own full name; the candidate list must not repeat it.
        let keys = candidate_keys("May", &[]);
        assert_eq!(keys, vec!["May", "5", "05"]);
    }

    #[test]
    fn every_month_maps_to_a_quarter() {
        for m in MONTHS {
            let q = Quarter::of_month(m).unwrap();
            assert!(q.months().contains(&m), "{m} missing from {q}");
        }
    }
}
