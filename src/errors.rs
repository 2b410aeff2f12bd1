use thiserror::Error;
use uuid::Uuid;

use crate::storage::Table;

/// Error type that captures storage and persistence failures.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("No row with id {id} in {table}")]
    NotFound { table: Table, id: Uuid },
    #[error("Store rejected write to {table}: {reason}")]
    Rejected { table: Table, reason: String },
    #[error("Invalid record: {0}")]
    InvalidRecord(String),
}
