//! Pending mutations staged in a session before commit.
//!
//! A change set is the only vehicle state travels in between sessions and
//! down to the store: child commits hand their change set to the parent,
//! the root hands its merged change set to [`StoreHandle::apply`].
//!
//! [`StoreHandle::apply`]: crate::StoreHandle::apply

use crate::record::{ObjectId, Record};
use corestack_model::AttributeValue;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Uncommitted inserts, per-attribute updates and deletes.
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    inserts: HashMap<ObjectId, Record>,
    updates: HashMap<ObjectId, BTreeMap<String, AttributeValue>>,
    deletes: HashSet<ObjectId>,
}

impl ChangeSet {
    /// Creates an empty change set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// True if nothing is staged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inserts.is_empty() && self.updates.is_empty() && self.deletes.is_empty()
    }

    /// Number of staged objects (inserted, updated or deleted).
    #[must_use]
    pub fn len(&self) -> usize {
        self.inserts.len() + self.updates.len() + self.deletes.len()
    }

    /// Drops everything staged.
    pub fn clear(&mut self) {
        self.inserts.clear();
        self.updates.clear();
        self.deletes.clear();
    }

    /// Stages a freshly inserted record.
    pub fn stage_insert(&mut self, record: Record) {
        self.deletes.remove(&record.id);
        self.inserts.insert(record.id, record);
    }

    /// Stages an attribute write. Writes to an object inserted in this
    /// same change set land directly on the staged record.
    pub fn stage_update(&mut self, id: ObjectId, key: impl Into<String>, value: AttributeValue) {
        if let Some(record) = self.inserts.get_mut(&id) {
            record.set(key, value);
        } else {
            self.updates.entry(id).or_default().insert(key.into(), value);
        }
    }

    /// Stages a deletion. Deleting an object inserted in this same change
    /// set simply cancels the insert; nothing propagates.
    pub fn stage_delete(&mut self, id: ObjectId) {
        self.updates.remove(&id);
        if self.inserts.remove(&id).is_none() {
            self.deletes.insert(id);
        }
    }

    /// The staged record for an object inserted in this change set.
    #[must_use]
    pub fn inserted(&self, id: &ObjectId) -> Option<&Record> {
        self.inserts.get(id)
    }

    /// True if the object is staged for deletion.
    #[must_use]
    pub fn deletes_object(&self, id: &ObjectId) -> bool {
        self.deletes.contains(id)
    }

    /// Staged inserts.
    pub fn inserts(&self) -> impl Iterator<Item = &Record> {
        self.inserts.values()
    }

    /// Staged per-object attribute updates.
    #[must_use]
    pub fn updates(&self) -> &HashMap<ObjectId, BTreeMap<String, AttributeValue>> {
        &self.updates
    }

    /// Staged deletions.
    #[must_use]
    pub fn deletes(&self) -> &HashSet<ObjectId> {
        &self.deletes
    }

    /// Merges a committed child change set into this one.
    ///
    /// Replays the child's staged operations: inserts and deletes always
    /// apply; attribute writes overwrite this set's values per attribute,
    /// keyed by object identity (last writer wins).
    pub fn merge(&mut self, child: ChangeSet) {
        let (inserts, updates, deletes) = child.into_parts();
        for (_, record) in inserts {
            self.stage_insert(record);
        }
        for (id, attrs) in updates {
            for (key, value) in attrs {
                self.stage_update(id, key, value);
            }
        }
        for id in deletes {
            self.stage_delete(id);
        }
    }

    /// Consumes the change set into (inserts, updates, deletes).
    #[must_use]
    pub fn into_parts(
        self,
    ) -> (
        HashMap<ObjectId, Record>,
        HashMap<ObjectId, BTreeMap<String, AttributeValue>>,
        HashSet<ObjectId>,
    ) {
        (self.inserts, self.updates, self.deletes)
    }
}
