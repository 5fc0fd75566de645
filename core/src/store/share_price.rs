use super::CoopStore;
use crate::error::CoopResult;
use crate::share_price::SharePriceRecord;
use rusqlite::params;

fn price_row_mapper(row: &rusqlite::Row<'_>) -> rusqlite::Result<SharePriceRecord> {
    Ok(SharePriceRecord {
        record_id: row.get(0)?,
        year: row.get(1)?,
        month: row.get(2)?,
        price: row.get(3)?,
        quarter_label: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

const PRICE_COLUMNS: &str =
    "record_id, year, month, price, quarter_label, created_at, updated_at";

impl CoopStore {
    // ── Share price ────────────────────────────────────────────────

    /// Batch insert inside one transaction: all rows land or none do.
    pub fn insert_share_prices(&self, records: &[SharePriceRecord]) -> CoopResult<()> {
        let tx = self.conn().unchecked_transaction()?;
        for r in records {
            tx.execute(
                "INSERT INTO share_price (
                    record_id, year, month, price, quarter_label, created_at, updated_at
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    &r.record_id,
                    r.year,
                    &r.month,
                    r.price,
                    &r.quarter_label,
                    &r.created_at,
                    &r.updated_at
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    pub fn insert_share_price(&self, r: &SharePriceRecord) -> CoopResult<()> {
        self.conn().execute(
            "INSERT INTO share_price (
                record_id, year, month, price, quarter_label, created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                &r.record_id,
                r.year,
                &r.month,
                r.price,
                &r.quarter_label,
                &r.created_at,
                &r.updated_at
            ],
        )?;
        Ok(())
    }

    pub fn all_share_prices(&self) -> CoopResult<Vec<SharePriceRecord>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {PRICE_COLUMNS} FROM share_price ORDER BY year ASC, month ASC"
        ))?;
        let rows = stmt.query_map([], price_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn share_prices_for_year(&self, year: i32) -> CoopResult<Vec<SharePriceRecord>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {PRICE_COLUMNS} FROM share_price WHERE year = ?1 ORDER BY month ASC"
        ))?;
        let rows = stmt.query_map(params![year], price_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn month_has_price(&self, year: i32, month: &str) -> CoopResult<bool> {
        let count: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM share_price WHERE year = ?1 AND month = ?2",
            params![year, month],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Returns whether a row was actually changed — a vanished id is a
    /// partial-write signal for the caller, not a silent no-op.
    pub fn update_price_by_id(
        &self,
        record_id: &str,
        price: f64,
        updated_at: &str,
    ) -> CoopResult<bool> {
        let changed = self.conn().execute(
            "UPDATE share_price SET price = ?1, updated_at = ?2 WHERE record_id = ?3",
            params![price, updated_at, record_id],
        )?;
        Ok(changed > 0)
    }

    pub fn delete_price_by_id(&self, record_id: &str) -> CoopResult<bool> {
        let changed = self.conn().execute(
            "DELETE FROM share_price WHERE record_id = ?1",
            params![record_id],
        )?;
        Ok(changed > 0)
    }

    // ── Test / summary helpers ─────────────────────────────────────

    pub fn share_price_count(&self) -> CoopResult<i64> {
        self.conn()
            .query_row("SELECT COUNT(*) FROM share_price", [], |row| row.get(0))
            .map_err(Into::into)
    }
}
