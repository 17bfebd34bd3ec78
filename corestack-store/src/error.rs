//! Error types for the store layer.

use crate::record::ObjectId;
use corestack_model::ModelError;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while opening, migrating, flushing or resetting
/// the backing store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Store file unreadable, corrupt, or bound to a different model.
    #[error("store open failed: {0}")]
    Open(String),

    /// No safe automatic migration exists for the on-disk schema.
    #[error("incompatible migration: {0}")]
    Incompatible(String),

    /// The backing file could not be deleted or replaced during reset.
    #[error("store reset failed: {0}")]
    Drop(String),

    /// A flushed change referenced an object the store does not hold.
    #[error("unknown object: {0}")]
    MissingObject(ObjectId),

    /// IO error (file system).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot serialization error.
    #[error("snapshot serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<ModelError> for StoreError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::Incompatible(reason) => Self::Incompatible(reason),
            other => Self::Open(other.to_string()),
        }
    }
}
