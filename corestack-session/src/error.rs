//! Error types for sessions, commits, and stack construction.

use corestack_model::{AttributeKind, ModelError};
use corestack_store::StoreError;
use thiserror::Error;

/// Errors raised by session operations outside of commit.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The schema describes no entity with this name.
    #[error("unknown entity: {0}")]
    UnknownEntity(String),

    /// The entity has no attribute with this name.
    #[error("unknown attribute {entity}.{attribute}")]
    UnknownAttribute { entity: String, attribute: String },

    /// The written value does not match the attribute's declared kind.
    #[error("attribute {attribute} expects {expected}, got {found}")]
    KindMismatch {
        attribute: String,
        expected: AttributeKind,
        found: AttributeKind,
    },

    /// The session was discarded; no further operations are possible.
    #[error("session is discarded")]
    Discarded,

    /// The session's confinement queue is no longer running.
    #[error("session queue unavailable: {0}")]
    Queue(String),
}

/// Errors raised by [`Session::commit`](crate::Session::commit).
///
/// The session keeps its change set on failure so the caller can fix the
/// problem and retry, or discard.
#[derive(Debug, Error)]
pub enum CommitError {
    /// The commit collides unresolvably with the parent's state, e.g. an
    /// update to an object an ancestor already deleted.
    #[error("commit conflict: {0}")]
    Conflict(String),

    /// A pending change violates a schema constraint.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The root flush into the backing store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The session itself was unusable (discarded, queue gone).
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Errors raised while constructing a [`Stack`](crate::Stack).
///
/// Construction fails fast: no partially initialized stack is ever
/// returned.
#[derive(Debug, Error)]
pub enum StackError {
    /// The named schema is not registered in the catalog.
    #[error("unknown schema: {0}")]
    UnknownSchema(String),

    /// Model loading failed.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// The store could not be opened or migrated.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A session queue could not be brought up.
    #[error(transparent)]
    Session(#[from] SessionError),
}
