//! Backing store layer for corestack.
//!
//! Owns the open store — in-memory or a schema-versioned snapshot file on
//! disk — and the lifecycle operations around it:
//!
//! - [`StoreCoordinator`] opens a store against a [`Schema`], running an
//!   automatic migration first when the on-disk schema version differs,
//!   and implements the reset ("drop") operation
//! - [`StoreHandle`] is the shared handle sessions flush into; exactly one
//!   exists per stack and it is rebound in place across a reset
//! - [`ChangeSet`] is the unit of pending mutation that flows from
//!   sessions down to the store
//!
//! The embedded relational engine proper (query execution, indexing, WAL)
//! is out of scope; records persist as a single JSON snapshot document
//! that is atomically replaced on every flush.
//!
//! [`Schema`]: corestack_model::Schema

mod changeset;
mod coordinator;
mod error;
mod handle;
mod record;
mod snapshot;

pub use changeset::ChangeSet;
pub use coordinator::{StoreCoordinator, StoreKind};
pub use error::{StoreError, StoreResult};
pub use handle::StoreHandle;
pub use record::{ObjectId, ObjectRef, Record};
