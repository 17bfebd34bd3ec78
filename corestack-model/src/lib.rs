//! Schema model for corestack.
//!
//! Defines the versioned entity/attribute description that every other
//! corestack subsystem is built against:
//! - [`Schema`] — an immutable, versioned set of entity descriptions with a
//!   name-keyed lookup index built once at load time
//! - [`AttributeValue`] — the typed values a stored object may carry
//! - [`ModelCatalog`] — loads model files and resolves schemas by name
//! - [`MigrationPlan`] — the ordered set of compatible changes between two
//!   schema versions, or a refusal when no safe automatic mapping exists
//!
//! Schemas are loaded from JSON model files. Entity lookup is string-keyed
//! at the API surface but resolved through the index, so no per-call scan
//! of the entity list is needed.

mod catalog;
mod error;
mod migration;
mod schema;

pub use catalog::ModelCatalog;
pub use error::{ModelError, ModelResult};
pub use migration::{MigrationPlan, MigrationStep};
pub use schema::{AttributeDescription, AttributeKind, AttributeValue, EntityDescription, Schema};
