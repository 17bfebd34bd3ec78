//! Error types for the model layer.

use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors that can occur while loading schemas or planning migrations.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Model file could not be parsed.
    #[error("model parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// IO error while reading a model file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A schema with the same (name, version) is already registered.
    #[error("schema {name} v{version} is already registered")]
    DuplicateSchema { name: String, version: u32 },

    /// No schema with the given name is registered in the catalog.
    #[error("unknown schema: {0}")]
    UnknownSchema(String),

    /// No safe automatic migration exists between the two schema versions.
    #[error("incompatible schema change: {0}")]
    Incompatible(String),
}

impl ModelError {
    /// Shorthand for an [`ModelError::Incompatible`] with a formatted reason.
    pub fn incompatible(reason: impl Into<String>) -> Self {
        Self::Incompatible(reason.into())
    }
}
