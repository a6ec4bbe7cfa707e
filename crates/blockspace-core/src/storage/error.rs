//! Storage error handling
//!
//! Typed errors for repository operations. SQLite interruptions are
//! classified as cancellations so the service can report them distinctly.

use std::io;
use std::path::PathBuf;

use rusqlite::ErrorCode;
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur during repository operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// No block with this ID (in the requested scope)
    #[error("block not found: '{id}'")]
    NotFound { id: Uuid },

    /// The call was interrupted before it completed
    #[error("operation interrupted")]
    Canceled,

    /// Failed to create data directory
    #[error("Failed to create data directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A sibling group has no position left past its last sibling
    #[error("sort positions exhausted in space {space_id}")]
    SortExhausted { space_id: Uuid },

    /// A stored row could not be decoded
    #[error("stored block '{id}' is corrupted: {details}")]
    Corrupt { id: String, details: String },

    /// SQLite database error
    #[error("Database error: {0}")]
    Database(#[source] rusqlite::Error),

    /// Error reported by a non-SQLite backend
    #[error("backend error: {0}")]
    Backend(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(error: rusqlite::Error) -> Self {
        match error.sqlite_error_code() {
            Some(ErrorCode::OperationInterrupted) => StoreError::Canceled,
            _ => StoreError::Database(error),
        }
    }
}

impl StoreError {
    /// Check if this error means the block does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

/// Result type for repository operations
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interrupt_classified_as_canceled() {
        let err = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_INTERRUPT),
            None,
        );
        let err: StoreError = err.into();
        assert!(matches!(err, StoreError::Canceled));
    }

    #[test]
    fn test_busy_is_database_error() {
        let err = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
            None,
        );
        let err: StoreError = err.into();
        assert!(matches!(err, StoreError::Database(_)));
    }

    #[test]
    fn test_not_found_display() {
        let id = Uuid::new_v4();
        let err = StoreError::NotFound { id };
        assert!(err.is_not_found());
        assert!(err.to_string().contains(&id.to_string()));
    }

    #[test]
    fn test_corrupt_display() {
        let err = StoreError::Corrupt {
            id: "abc".to_string(),
            details: "unknown block type 'video'".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("corrupted"));
        assert!(msg.contains("video"));
    }
}
