//! The shared handle to the open backing store.

use crate::changeset::ChangeSet;
use crate::coordinator::StoreKind;
use crate::error::{StoreError, StoreResult};
use crate::record::{ObjectId, Record};
use crate::snapshot::{self, StoreSnapshot};
use corestack_model::Schema;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// The open backing store. Exactly one exists per stack; it owns the
/// active [`Schema`] and all committed records.
///
/// The handle is shared (`Arc`) between the coordinator and the root
/// session. A reset swaps the contents in place behind the lock, so every
/// existing reference immediately reflects the fresh, empty store.
pub struct StoreHandle {
    kind: StoreKind,
    state: RwLock<StoreState>,
}

struct StoreState {
    schema: Arc<Schema>,
    records: HashMap<ObjectId, Record>,
}

impl StoreHandle {
    pub(crate) fn new(kind: StoreKind, schema: Arc<Schema>, records: Vec<Record>) -> Self {
        let records = records.into_iter().map(|r| (r.id, r)).collect();
        Self {
            kind,
            state: RwLock::new(StoreState { schema, records }),
        }
    }

    /// The schema the store is currently bound to.
    #[must_use]
    pub fn schema(&self) -> Arc<Schema> {
        Arc::clone(&self.state.read().schema)
    }

    /// Whether the store persists to disk.
    #[must_use]
    pub fn is_file_backed(&self) -> bool {
        matches!(self.kind, StoreKind::OnDisk(_))
    }

    /// Number of committed records across all entities.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.state.read().records.len()
    }

    /// True if the store holds a committed record with this identity.
    #[must_use]
    pub fn contains(&self, id: &ObjectId) -> bool {
        self.state.read().records.contains_key(id)
    }

    /// Snapshot of all committed records of one entity type.
    #[must_use]
    pub fn records_of(&self, entity_type: &str) -> HashMap<ObjectId, Record> {
        self.state
            .read()
            .records
            .iter()
            .filter(|(_, r)| r.entity_type == entity_type)
            .map(|(id, r)| (*id, r.clone()))
            .collect()
    }

    /// Flushes a merged change set transactionally.
    ///
    /// All-or-nothing: the batch is applied to a staged copy first, and a
    /// file-backed store writes the new snapshot to disk before the copy
    /// is installed. Any failure leaves both memory and disk at the
    /// previous state. Updates to objects the store no longer holds fail
    /// with [`StoreError::MissingObject`]; deletes of unknown objects are
    /// no-ops (the object may have lived only in pending state upstream).
    pub fn apply(&self, batch: &ChangeSet) -> StoreResult<()> {
        let mut state = self.state.write();
        let mut staged = state.records.clone();

        for record in batch.inserts() {
            staged.insert(record.id, record.clone());
        }
        for (id, attrs) in batch.updates() {
            let Some(record) = staged.get_mut(id) else {
                return Err(StoreError::MissingObject(*id));
            };
            for (key, value) in attrs {
                record.set(key.clone(), value.clone());
            }
        }
        for id in batch.deletes() {
            staged.remove(id);
        }

        if let StoreKind::OnDisk(path) = &self.kind {
            let snapshot = StoreSnapshot {
                schema: (*state.schema).clone(),
                records: staged.values().cloned().collect(),
            };
            snapshot::write(path, &snapshot)?;
        }

        debug!(
            inserts = batch.inserts().count(),
            updates = batch.updates().len(),
            deletes = batch.deletes().len(),
            total = staged.len(),
            "store flush applied"
        );
        state.records = staged;
        Ok(())
    }

    /// Swaps in a fresh empty store at the same location, same schema.
    /// Used by [`StoreCoordinator::reset`](crate::StoreCoordinator::reset).
    pub(crate) fn reset(&self) -> StoreResult<()> {
        let mut state = self.state.write();
        if let StoreKind::OnDisk(path) = &self.kind {
            if path.exists() {
                std::fs::remove_file(path).map_err(|e| {
                    StoreError::Drop(format!("cannot delete {}: {e}", path.display()))
                })?;
            }
            snapshot::write(path, &StoreSnapshot::empty((*state.schema).clone()))
                .map_err(|e| StoreError::Drop(format!("cannot recreate store: {e}")))?;
        }
        state.records.clear();
        Ok(())
    }
}
