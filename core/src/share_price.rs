//! Quarterly share-price reconciliation.
//!
//! Prices are stored per month but administered per quarter. The store may
//! or may not carry a uniqueness constraint on (year, quarter_label) —
//! deployments differ — so the upsert path must succeed under both schemas.
//!
//! RULE: A quarter is written whole or not at all via add. Updates and
//! deletes always cover every record id a quarter view captured; anything
//! less leaves the three months diverged.

use crate::clock::Clock;
use crate::error::{CoopError, CoopResult};
use crate::period::Quarter;
use crate::store::CoopStore;
use crate::types::RecordId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharePriceRecord {
    pub record_id: RecordId,
    pub year: i32,
    /// Canonical 3-letter month label.
    pub month: String,
    pub price: f64,
    /// Legacy free-text quarter label; redundant with year+month but the
    /// store requires it non-null.
    pub quarter_label: String,
    pub created_at: String,
    pub updated_at: String,
}

/// One (year, quarter) group of monthly records, for display and for
/// whole-quarter updates.
#[derive(Debug, Clone)]
pub struct QuarterView {
    pub year: i32,
    pub quarter: Quarter,
    /// Representative price: last record seen wins. When the three months
    /// disagree, `price_drift` is set instead of the disagreement being
    /// silently masked.
    pub price: f64,
    pub price_drift: bool,
    pub record_ids: Vec<RecordId>,
    pub months: Vec<String>,
}

impl QuarterView {
    /// True once all three months of the quarter are stored.
    pub fn complete(&self) -> bool {
        self.months.len() == 3
    }
}

/// Group monthly price records into quarter views, most recent period
/// first (year descending, then Q4→Q1 within a year).
pub fn group_by_quarter(records: &[SharePriceRecord]) -> Vec<QuarterView> {
    let mut views: Vec<QuarterView> = Vec::new();
    for record in records {
        let Some(quarter) = Quarter::of_month(&record.month) else {
            log::warn!(
                "Share price record {} has unknown month {:?}; skipped from grouping",
                record.record_id,
                record.month
            );
            continue;
        };
        match views
            .iter_mut()
            .find(|v| v.year == record.year && v.quarter == quarter)
        {
            Some(view) => {
                if view.price != record.price {
                    view.price_drift = true;
                }
                view.price = record.price;
                view.record_ids.push(record.record_id.clone());
                view.months.push(record.month.clone());
            }
            None => views.push(QuarterView {
                year: record.year,
                quarter,
                price: record.price,
                price_drift: false,
                record_ids: vec![record.record_id.clone()],
                months: vec![record.month.clone()],
            }),
        }
    }
    views.sort_by(|a, b| b.year.cmp(&a.year).then(b.quarter.cmp(&a.quarter)));
    views
}

/// Add a whole quarter of prices: exactly one record per month.
///
/// Rejected outright when any target (year, month) already has a record —
/// changes go through `update_quarter_price`. The write is one batch insert
/// with a shared quarter label; if the store holds a uniqueness constraint
/// over (year, quarter_label), the batch is retried as three single-row
/// inserts whose labels embed their month. Success means 3/3 persisted;
/// 1–2 is a partial-write failure, surfaced with the count.
pub fn upsert_quarter_price(
    store: &CoopStore,
    year: i32,
    quarter: Quarter,
    price: f64,
    clock: &dyn Clock,
) -> CoopResult<Vec<SharePriceRecord>> {
    if price < 0.0 {
        return Err(anyhow::anyhow!("Share price must be non-negative, got {price}").into());
    }
    for month in quarter.months() {
        if store.month_has_price(year, month)? {
            return Err(CoopError::QuarterOccupied {
                year,
                quarter: quarter.label().to_string(),
            });
        }
    }

    let now = clock.now().to_rfc3339();
    let records: Vec<SharePriceRecord> = quarter
        .months()
        .iter()
        .map(|month| SharePriceRecord {
            record_id: uuid::Uuid::new_v4().to_string(),
            year,
            month: month.to_string(),
            price,
            quarter_label: quarter.label().to_string(),
            created_at: now.clone(),
            updated_at: now.clone(),
        })
        .collect();

    match store.insert_share_prices(&records) {
        Ok(()) => Ok(records),
        Err(e) if is_unique_violation(&e) => {
            log::debug!(
                "Batch insert for {quarter} {year} hit a quarter-label uniqueness \
                 constraint; falling back to month-suffixed single inserts"
            );
            insert_individually(store, records)
        }
        Err(e) => Err(e),
    }
}

/// Fallback path: three single-row inserts, each labeled uniquely so a
/// (year, quarter_label) constraint cannot reject them. Not rolled back on
/// partial failure — the caller learns exactly how many rows landed.
fn insert_individually(
    store: &CoopStore,
    mut records: Vec<SharePriceRecord>,
) -> CoopResult<Vec<SharePriceRecord>> {
    let required = records.len();
    let mut succeeded = 0usize;
    for record in &mut records {
        record.quarter_label = format!("{}-{}", record.quarter_label, record.month);
        match store.insert_share_price(record) {
            Ok(()) => succeeded += 1,
            Err(e) => log::warn!(
                "Single insert of {} {} failed during fallback: {e}",
                record.month,
                record.year
            ),
        }
    }
    if succeeded == required {
        Ok(records)
    } else {
        Err(CoopError::PartialWrite {
            succeeded,
            required,
        })
    }
}

/// Re-price every record a quarter view captured. Attempts all ids even
/// after a failure so the partial count is exact.
pub fn update_quarter_price(
    store: &CoopStore,
    view: &QuarterView,
    new_price: f64,
    clock: &dyn Clock,
) -> CoopResult<()> {
    if new_price < 0.0 {
        return Err(anyhow::anyhow!("Share price must be non-negative, got {new_price}").into());
    }
    let now = clock.now().to_rfc3339();
    apply_to_all(&view.record_ids, |id| {
        store.update_price_by_id(id, new_price, &now)
    })
}

/// Delete every record a quarter view captured.
pub fn delete_quarter_price(store: &CoopStore, view: &QuarterView) -> CoopResult<()> {
    apply_to_all(&view.record_ids, |id| store.delete_price_by_id(id))
}

fn apply_to_all<F>(ids: &[RecordId], mut op: F) -> CoopResult<()>
where
    F: FnMut(&str) -> CoopResult<bool>,
{
    let required = ids.len();
    let mut succeeded = 0usize;
    for id in ids {
        match op(id.as_str()) {
            Ok(true) => succeeded += 1,
            Ok(false) => log::warn!("Share price record {id} no longer exists"),
            Err(e) => log::warn!("Write to share price record {id} failed: {e}"),
        }
    }
    if succeeded == required {
        Ok(())
    } else {
        Err(CoopError::PartialWrite {
            succeeded,
            required,
        })
    }
}

fn is_unique_violation(err: &CoopError) -> bool {
    match err {
        CoopError::Database(rusqlite::Error::SqliteFailure(f, message)) => {
            f.code == rusqlite::ErrorCode::ConstraintViolation
                && message
                    .as_deref()
                    .is_some_and(|m| m.contains("UNIQUE") && m.contains("quarter_label"))
        }
        _ => false,
    }
}
