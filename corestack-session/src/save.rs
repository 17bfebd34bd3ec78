//! Commit propagation — the save coordinator.
//!
//! One commit moves state exactly one hop: a child merges its change set
//! into its parent's pending state on the parent's queue, and when that
//! parent is the root, the merged state flushes transactionally into the
//! store within the same queue job. The root queue therefore serializes
//! sibling commits FIFO, and an observer can never see half a commit.
//!
//! Merging is last-writer-wins per attribute, keyed by object identity;
//! inserts and deletes always apply. A failed hop aborts only that hop:
//! the committing session keeps its change set and moves to
//! `CommitFailed` so the caller can fix and retry.

use crate::error::{CommitError, SessionError};
use crate::session::{Lifecycle, Session, SessionRole};
use corestack_model::Schema;
use corestack_store::{ChangeSet, ObjectId, Record, StoreError};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Commits a session's pending changes. Entry point behind
/// [`Session::commit`].
pub(crate) fn commit(session: &Session) -> Result<(), CommitError> {
    let this = session.clone();
    session
        .run(move || commit_on_queue(&this))
        .map_err(CommitError::from)?
}

fn commit_on_queue(session: &Session) -> Result<(), CommitError> {
    let batch = {
        let mut state = session.lock_state();
        if state.lifecycle == Lifecycle::Discarded {
            return Err(SessionError::Discarded.into());
        }
        state.lifecycle = Lifecycle::Committing;
        if let Err(e) = validate(session.schema(), &state.pending) {
            state.lifecycle = Lifecycle::CommitFailed;
            warn!(session = %session.id(), error = %e, "commit validation failed");
            return Err(e);
        }
        if state.pending.is_empty() {
            state.lifecycle = Lifecycle::Active;
            return Ok(());
        }
        state.pending.clone()
    };

    let staged = batch.len();
    let result = match session.role() {
        SessionRole::Disposable => {
            let mut state = session.lock_state();
            apply_local(&mut state.local, batch)
        }
        SessionRole::Root => flush_root(session),
        SessionRole::Main | SessionRole::Background => match session.parent() {
            Some(parent) => receive_commit(parent, batch),
            None => Err(CommitError::Conflict(
                "session has no parent to merge into".to_string(),
            )),
        },
    };

    let mut state = session.lock_state();
    match &result {
        Ok(()) => {
            state.pending.clear();
            state.lifecycle = Lifecycle::Active;
            debug!(session = %session.id(), role = ?session.role(), staged, "commit propagated");
        }
        Err(e) => {
            state.lifecycle = Lifecycle::CommitFailed;
            warn!(session = %session.id(), error = %e, "commit failed; change set retained");
        }
    }
    result
}

/// Validates pending changes against schema constraints: every inserted
/// object must carry all required attributes of its entity. Attribute
/// names and kinds were already checked when the writes were staged.
fn validate(schema: &Schema, pending: &ChangeSet) -> Result<(), CommitError> {
    for record in pending.inserts() {
        let Some(entity) = schema.entity(&record.entity_type) else {
            return Err(CommitError::Validation(format!(
                "unknown entity: {}",
                record.entity_type
            )));
        };
        for attr in entity.required_attributes() {
            if record.get(&attr.name).is_none() {
                return Err(CommitError::Validation(format!(
                    "{}.{} is required but missing",
                    record.entity_type, attr.name
                )));
            }
        }
    }
    Ok(())
}

/// Accepts a child's change set on the parent's queue: conflict-check,
/// merge, and — when the parent is root — flush to the store.
fn receive_commit(parent: &Session, batch: ChangeSet) -> Result<(), CommitError> {
    let this = parent.clone();
    parent
        .run(move || receive_on_queue(&this, batch))
        .map_err(CommitError::from)?
}

fn receive_on_queue(parent: &Session, batch: ChangeSet) -> Result<(), CommitError> {
    // Updates must target objects still visible at the parent. Deletes
    // apply unconditionally; deleting what an ancestor already deleted
    // resolves to a no-op, not a conflict.
    for id in batch.updates().keys() {
        if !parent.contains_visible(id)? {
            return Err(CommitError::Conflict(format!(
                "object {id} no longer exists at the parent"
            )));
        }
    }

    {
        let mut state = parent.lock_state();
        if state.lifecycle == Lifecycle::Discarded {
            return Err(SessionError::Discarded.into());
        }
        state.pending.merge(batch);
    }

    if parent.role() == SessionRole::Root {
        flush_root(parent)?;
    }
    Ok(())
}

/// Flushes the root's merged pending state into the store, all or
/// nothing. Runs on the root queue; on failure the merged state stays in
/// root's pending and the error is reported to the committing caller.
fn flush_root(root: &Session) -> Result<(), CommitError> {
    let Some(store) = root.store_handle() else {
        return Err(CommitError::Conflict(
            "root session has no store handle".to_string(),
        ));
    };
    let mut state = root.lock_state();
    store.apply(&state.pending).map_err(map_store_error)?;
    state.pending.clear();
    Ok(())
}

fn map_store_error(err: StoreError) -> CommitError {
    match err {
        StoreError::MissingObject(id) => {
            CommitError::Conflict(format!("object {id} no longer exists in the store"))
        }
        other => CommitError::Store(other),
    }
}

/// Applies a disposable session's commit to its private local state.
/// The store is never touched.
fn apply_local(
    local: &mut HashMap<ObjectId, Record>,
    batch: ChangeSet,
) -> Result<(), CommitError> {
    let (inserts, updates, deletes) = batch.into_parts();
    for id in updates.keys() {
        if !local.contains_key(id) && !inserts.contains_key(id) {
            return Err(CommitError::Conflict(format!(
                "object {id} does not exist in this disposable session"
            )));
        }
    }
    for (id, record) in inserts {
        local.insert(id, record);
    }
    for (id, attrs) in updates {
        if let Some(record) = local.get_mut(&id) {
            for (key, value) in attrs {
                record.set(key, value);
            }
        }
    }
    for id in deletes {
        local.remove(&id);
    }
    Ok(())
}
