//! Opening, migrating and resetting the backing store.

use crate::error::{StoreError, StoreResult};
use crate::handle::StoreHandle;
use crate::record::Record;
use crate::snapshot::{self, StoreSnapshot};
use corestack_model::{MigrationPlan, Schema};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Where the store keeps its data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreKind {
    /// Fresh per-process store; persists nothing.
    InMemory,
    /// Schema-versioned snapshot file at the given path.
    OnDisk(PathBuf),
}

/// Owns the backing store: opens it against a schema, runs migrations,
/// and implements the reset ("drop") lifecycle operation.
#[derive(Clone)]
pub struct StoreCoordinator {
    handle: Arc<StoreHandle>,
}

impl StoreCoordinator {
    /// Opens (or creates) a store bound to `schema`.
    ///
    /// In-memory stores are always allocated fresh. File-backed stores
    /// read the existing snapshot if one is present; if its schema
    /// version differs from `schema`, migration runs before the open
    /// completes. An incompatible migration fails the open and leaves the
    /// file byte-for-byte unchanged.
    pub fn open(schema: Arc<Schema>, kind: StoreKind) -> StoreResult<Self> {
        let handle = match &kind {
            StoreKind::InMemory => {
                info!(schema = %schema, "opened in-memory store");
                StoreHandle::new(kind.clone(), schema, Vec::new())
            }
            StoreKind::OnDisk(path) => {
                let records = if path.exists() {
                    let on_disk = snapshot::read(path)?;
                    Self::reconcile(path, on_disk, &schema)?
                } else {
                    snapshot::write(path, &StoreSnapshot::empty((*schema).clone()))?;
                    info!(schema = %schema, path = %path.display(), "created store file");
                    Vec::new()
                };
                StoreHandle::new(kind.clone(), schema, records)
            }
        };
        Ok(Self {
            handle: Arc::new(handle),
        })
    }

    /// Brings an existing snapshot up to `target`, migrating if needed.
    fn reconcile(
        path: &std::path::Path,
        on_disk: StoreSnapshot,
        target: &Arc<Schema>,
    ) -> StoreResult<Vec<Record>> {
        if on_disk.schema.name() != target.name() {
            return Err(StoreError::Open(format!(
                "store file {} belongs to model {}, not {}",
                path.display(),
                on_disk.schema.name(),
                target.name()
            )));
        }
        if on_disk.schema.version() == target.version() {
            info!(
                schema = %target,
                records = on_disk.records.len(),
                path = %path.display(),
                "opened store file"
            );
            return Ok(on_disk.records);
        }

        // The plan is computed before anything is written; an incompatible
        // change aborts here with the file untouched.
        let plan = MigrationPlan::compute(&on_disk.schema, target).inspect_err(|e| {
            warn!(
                from = on_disk.schema.version(),
                to = target.version(),
                error = %e,
                "migration refused"
            );
        })?;
        info!(
            schema = target.name(),
            from = plan.from_version(),
            to = plan.to_version(),
            steps = plan.steps().len(),
            records = on_disk.records.len(),
            "migrating store file"
        );

        // Additive steps never touch existing rows; the rewrite swaps the
        // schema header and re-persists the records atomically.
        let migrated = StoreSnapshot {
            schema: (**target).clone(),
            records: on_disk.records,
        };
        snapshot::write(path, &migrated)?;
        Ok(migrated.records)
    }

    /// The shared handle sessions flush into.
    #[must_use]
    pub fn handle(&self) -> Arc<StoreHandle> {
        Arc::clone(&self.handle)
    }

    /// Resets the store: deletes the backing file (no-op in memory) and
    /// reinstalls a fresh empty store at the same location with the same
    /// schema. The handle is rebound in place, so existing references
    /// keep working and immediately see the empty store.
    ///
    /// The caller is responsible for quiescing writers first; the stack
    /// runs this on the root session's queue.
    pub fn reset(&self) -> StoreResult<()> {
        self.handle.reset()?;
        info!("store reset to empty");
        Ok(())
    }
}
