//! Hierarchy service errors
//!
//! Every failure of a service operation is a `BlockError`. Validation
//! failures are raised before any repository write; repository failures are
//! passed through with the name of the operation that hit them.

use thiserror::Error;
use uuid::Uuid;

use crate::models::BlockType;
use crate::storage::StoreError;

/// Errors returned by the block hierarchy service
#[derive(Error, Debug)]
pub enum BlockError {
    /// The block type is missing or not recognised
    #[error("invalid block type: {0}")]
    InvalidType(String),

    /// The block type cannot live at the root of a space
    #[error("{block_type} block requires a parent")]
    MissingParent { block_type: BlockType },

    /// The referenced parent could not be loaded
    #[error("failed to look up parent block {parent_id}: {source}")]
    ParentLookupFailed {
        parent_id: Uuid,
        #[source]
        source: StoreError,
    },

    /// The parent is a leaf type
    #[error("parent cannot have children: {parent_type} blocks are leaves")]
    ParentCannotHaveChildren { parent_type: BlockType },

    /// The child/parent pairing is not in the compatibility table
    #[error("{child} cannot be a child of {parent}")]
    InvalidChildForParent { child: BlockType, parent: String },

    /// The block does not exist
    #[error("block not found: {0}")]
    NotFound(Uuid),

    /// The repository reported that the call was interrupted
    #[error("operation canceled")]
    OperationCanceled,

    /// Any other repository failure
    #[error("{operation} failed: {source}")]
    BackendFailure {
        operation: &'static str,
        #[source]
        source: StoreError,
    },
}

impl BlockError {
    /// Wrap a repository error raised while running `operation`
    ///
    /// Not-found and interruption keep their own variants so callers can
    /// match on them without digging through the source chain.
    pub fn from_store(operation: &'static str, error: StoreError) -> Self {
        match error {
            StoreError::NotFound { id } => BlockError::NotFound(id),
            StoreError::Canceled => BlockError::OperationCanceled,
            source => BlockError::BackendFailure { operation, source },
        }
    }

    /// Check if this error was raised by validation (no write happened)
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            BlockError::InvalidType(_)
                | BlockError::MissingParent { .. }
                | BlockError::ParentLookupFailed { .. }
                | BlockError::ParentCannotHaveChildren { .. }
                | BlockError::InvalidChildForParent { .. }
        )
    }

    /// Check if this is a not-found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, BlockError::NotFound(_))
    }
}

/// Result type for hierarchy service operations
pub type BlockResult<T> = Result<T, BlockError>;
