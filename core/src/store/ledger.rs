use super::CoopStore;
use crate::eligibility::{LedgerEntry, REFUND_ENTRY_TYPE};
use crate::error::CoopResult;
use rusqlite::params;

fn ledger_row_mapper(row: &rusqlite::Row<'_>) -> rusqlite::Result<LedgerEntry> {
    Ok(LedgerEntry {
        entry_id: row.get(0)?,
        entry_type: row.get(1)?,
        amount: row.get(2)?,
        member_id: row.get(3)?,
        member_name: row.get(4)?,
        membership_id: row.get(5)?,
        receipt: row.get(6)?,
        created_at: row.get(7)?,
    })
}

impl CoopStore {
    // ── Transaction ledger ─────────────────────────────────────────

    pub fn append_ledger_entry(&self, entry: &LedgerEntry) -> CoopResult<()> {
        self.conn().execute(
            "INSERT INTO txn_ledger (
                entry_id, entry_type, amount, member_id, member_name,
                membership_id, receipt, created_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                &entry.entry_id,
                &entry.entry_type,
                entry.amount,
                entry.member_id.as_deref(),
                &entry.member_name,
                entry.membership_id.as_deref(),
                &entry.receipt,
                &entry.created_at,
            ],
        )?;
        Ok(())
    }

    pub fn ledger_entries_of_type(&self, entry_type: &str) -> CoopResult<Vec<LedgerEntry>> {
        let mut stmt = self.conn().prepare(
            "SELECT entry_id, entry_type, amount, member_id, member_name,
                    membership_id, receipt, created_at
             FROM txn_ledger WHERE entry_type = ?1
             ORDER BY created_at ASC",
        )?;
        let rows = stmt.query_map(params![entry_type], ledger_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Torn-state detection: does a refund ledger entry exist for this
    /// member?
    pub fn has_refund_entry_for(&self, member_id: &str) -> CoopResult<bool> {
        let count: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM txn_ledger
             WHERE entry_type = ?1 AND member_id = ?2",
            params![REFUND_ENTRY_TYPE, member_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    pub fn ledger_count(&self) -> CoopResult<i64> {
        self.conn()
            .query_row("SELECT COUNT(*) FROM txn_ledger", [], |row| row.get(0))
            .map_err(Into::into)
    }
}
