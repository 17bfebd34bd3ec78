//! Session hierarchy and commit propagation for corestack.
//!
//! A [`Stack`] owns one store plus a tree of queue-confined [`Session`]s:
//! a hidden root writer, a long-lived main session (child of root),
//! caller-owned background sessions (children of root), and detached
//! disposable sessions with no path to the store at all.
//!
//! Commits flow one hop at a time: a child merges its change set into its
//! parent's pending state on the parent's queue; when the parent is the
//! root, the merged state flushes transactionally into the store in the
//! same queue job. Sibling commits therefore serialize FIFO, and no
//! partial commit is ever observable.

mod error;
mod predicate;
mod queue;
mod save;
mod session;
mod stack;

pub use error::{CommitError, SessionError, StackError};
pub use predicate::Predicate;
pub use session::{Lifecycle, Session, SessionId, SessionRole};
pub use stack::{SchemaSource, Stack};

pub use corestack_model::{
    AttributeDescription, AttributeKind, AttributeValue, EntityDescription, ModelCatalog, Schema,
};
pub use corestack_store::{ObjectId, ObjectRef, Record, StoreError, StoreKind};
