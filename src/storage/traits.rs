//! Durable backend contract and error types

use crate::storage::ContactRecord;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt record on line {line}: {reason}")]
    CorruptLine { line: usize, reason: String },

    #[error("Invalid timestamp: {0}")]
    Timestamp(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// A durable table of contact records, one row per URL
///
/// Backends are driven by [`ContactStore`](crate::storage::ContactStore),
/// which serializes every call behind its own lock, so implementations need
/// not be `Sync`.
pub trait ContactTable: Send {
    /// Reads every stored record
    fn load_all(&mut self) -> StorageResult<Vec<ContactRecord>>;

    /// Inserts the record, replacing any row with the same URL
    fn upsert(&mut self, record: &ContactRecord) -> StorageResult<()>;

    /// Removes every row
    fn delete_all(&mut self) -> StorageResult<()>;
}
