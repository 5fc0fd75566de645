use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoopError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Quarter {quarter} {year} already has price records")]
    QuarterOccupied { year: i32, quarter: String },

    #[error("Partial write: {succeeded} of {required} records persisted")]
    PartialWrite { succeeded: usize, required: usize },

    #[error(
        "Torn refund for member {member_id}: member_updated={member_updated} ledger_written={ledger_written}"
    )]
    TornRefund {
        member_id: String,
        member_updated: bool,
        ledger_written: bool,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type CoopResult<T> = Result<T, CoopError>;
