//! SQLite persistence layer.
//!
//! RULE: Only the store modules talk to the database.
//! Engine code calls store methods — it never executes SQL directly.

mod ledger;
mod member;
mod share_price;

use crate::error::CoopResult;
use rusqlite::Connection;

pub struct CoopStore {
    conn: Connection,
}

impl CoopStore {
    /// Open (or create) the cooperative database at `path`.
    pub fn open(path: &str) -> CoopResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> CoopResult<Self> {
        let conn = Connection::open(":memory:")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> CoopResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_foundation.sql"))?;
        Ok(())
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    // ── Test helpers ───────────────────────────────────────────

    /// Recreate the unique index legacy deployments carry over
    /// (year, quarter_label). Tests use it to exercise the fallback
    /// insert path; production schemas may or may not have it.
    pub fn add_quarter_label_unique_index(&self) -> CoopResult<()> {
        self.conn.execute_batch(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_share_price_year_quarter
             ON share_price (year, quarter_label);",
        )?;
        Ok(())
    }

    /// Drop the ledger table so dependent-write failures can be exercised.
    pub fn drop_ledger_table(&self) -> CoopResult<()> {
        self.conn.execute_batch("DROP TABLE txn_ledger;")?;
        Ok(())
    }
}
