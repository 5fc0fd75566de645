//! Shared primitive types used across the entire engine.

/// A stable, unique identifier for a member record.
pub type MemberId = String;

/// A stable, unique identifier for a stored record (share price, ledger entry).
pub type RecordId = String;

/// A calendar year as stored in period trees.
pub type Year = i32;
