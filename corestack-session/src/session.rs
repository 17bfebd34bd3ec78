//! Queue-confined sessions over a schema.
//!
//! A session is a unit of pending mutations: inserts, attribute writes
//! and deletes staged in a [`ChangeSet`] until commit. Every session owns
//! an exclusive serial queue and all state access happens in jobs on that
//! queue; the public methods here are thin dispatch wrappers.
//!
//! Hierarchy rules: the root is the only session bound to the store; main
//! and background sessions are direct children of root; disposable
//! sessions have no parent and no store path, so nothing committed on
//! them is ever observable elsewhere.

use crate::error::{CommitError, SessionError};
use crate::predicate::Predicate;
use crate::queue::WorkQueue;
use crate::save;
use corestack_model::{AttributeValue, Schema};
use corestack_store::{ChangeSet, ObjectId, ObjectRef, Record, StoreHandle};
use parking_lot::{Mutex, MutexGuard};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Unique identifier for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Creates a new session ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Position of a session in the stack's hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionRole {
    /// The hidden writer; the only session that flushes into the store.
    Root,
    /// The long-lived caller-facing session, child of root.
    Main,
    /// A child-of-root session for batch or concurrent work.
    Background,
    /// Detached: no parent, no store path, commits stay private.
    Disposable,
}

/// Session lifecycle state.
///
/// `Committing` is only ever held while the commit job runs on the
/// session's queue, so outside observers see `Active`, `CommitFailed` or
/// `Discarded`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Active,
    Committing,
    CommitFailed,
    Discarded,
}

pub(crate) struct SessionState {
    pub(crate) lifecycle: Lifecycle,
    pub(crate) pending: ChangeSet,
    /// Committed state of a disposable session. Unused for other roles.
    pub(crate) local: HashMap<ObjectId, Record>,
}

impl SessionState {
    fn ensure_usable(&self) -> Result<(), SessionError> {
        if self.lifecycle == Lifecycle::Discarded {
            Err(SessionError::Discarded)
        } else {
            Ok(())
        }
    }
}

struct Shared {
    id: SessionId,
    role: SessionRole,
    schema: Arc<Schema>,
    queue: WorkQueue,
    /// Back-reference up the tree; children never own their parent's
    /// children, so the ownership graph stays acyclic.
    parent: Option<Session>,
    /// Bound only on the root session.
    store: Option<Arc<StoreHandle>>,
    state: Mutex<SessionState>,
}

/// A confined unit of pending mutations over a [`Schema`].
///
/// Cloning a `Session` clones the handle, not the state.
#[derive(Clone)]
pub struct Session {
    shared: Arc<Shared>,
}

impl Session {
    fn build(
        role: SessionRole,
        schema: Arc<Schema>,
        parent: Option<Session>,
        store: Option<Arc<StoreHandle>>,
        label: &str,
    ) -> Result<Self, SessionError> {
        let queue = WorkQueue::spawn(label)?;
        Ok(Self {
            shared: Arc::new(Shared {
                id: SessionId::new(),
                role,
                schema,
                queue,
                parent,
                store,
                state: Mutex::new(SessionState {
                    lifecycle: Lifecycle::Active,
                    pending: ChangeSet::new(),
                    local: HashMap::new(),
                }),
            }),
        })
    }

    pub(crate) fn root(
        schema: Arc<Schema>,
        store: Arc<StoreHandle>,
    ) -> Result<Self, SessionError> {
        Self::build(
            SessionRole::Root,
            schema,
            None,
            Some(store),
            "corestack-root",
        )
    }

    pub(crate) fn child_of(
        parent: &Session,
        role: SessionRole,
        label: &str,
    ) -> Result<Self, SessionError> {
        debug_assert_eq!(parent.role(), SessionRole::Root);
        Self::build(
            role,
            Arc::clone(&parent.shared.schema),
            Some(parent.clone()),
            None,
            label,
        )
    }

    pub(crate) fn disposable(schema: Arc<Schema>) -> Result<Self, SessionError> {
        Self::build(
            SessionRole::Disposable,
            schema,
            None,
            None,
            "corestack-disposable",
        )
    }

    /// This session's identifier.
    #[must_use]
    pub fn id(&self) -> SessionId {
        self.shared.id
    }

    /// This session's position in the hierarchy.
    #[must_use]
    pub fn role(&self) -> SessionRole {
        self.shared.role
    }

    /// The schema this session mutates against.
    #[must_use]
    pub fn schema(&self) -> &Arc<Schema> {
        &self.shared.schema
    }

    /// Current lifecycle state, observed through the queue.
    pub fn lifecycle(&self) -> Result<Lifecycle, SessionError> {
        let this = self.clone();
        self.run(move || this.lock_state().lifecycle)
    }

    /// True if uncommitted changes are staged.
    pub fn has_pending_changes(&self) -> Result<bool, SessionError> {
        let this = self.clone();
        self.run(move || !this.lock_state().pending.is_empty())
    }

    // ── Mutation surface ─────────────────────────────────────────

    /// Creates a new object of the named entity type.
    ///
    /// Entity resolution is a registry lookup against the schema's
    /// load-time index; an unknown name fails here, not at commit.
    pub fn insert(&self, entity_type: &str) -> Result<ObjectRef, SessionError> {
        let this = self.clone();
        let entity = entity_type.to_string();
        self.run(move || {
            let mut state = this.lock_state();
            state.ensure_usable()?;
            if !this.shared.schema.contains_entity(&entity) {
                return Err(SessionError::UnknownEntity(entity));
            }
            let record = Record::new(ObjectId::new(), entity);
            let obj = record.object_ref();
            state.pending.stage_insert(record);
            Ok(obj)
        })?
    }

    /// Stages an attribute write on an object.
    ///
    /// The attribute must exist on the object's entity and the value must
    /// match its declared kind; required-presence is checked at commit.
    pub fn set_attribute(
        &self,
        obj: &ObjectRef,
        key: &str,
        value: impl Into<AttributeValue>,
    ) -> Result<(), SessionError> {
        let this = self.clone();
        let obj = obj.clone();
        let key = key.to_string();
        let value = value.into();
        self.run(move || {
            let entity = this
                .shared
                .schema
                .entity(&obj.entity_type)
                .ok_or_else(|| SessionError::UnknownEntity(obj.entity_type.clone()))?;
            let attr = entity
                .attribute(&key)
                .ok_or_else(|| SessionError::UnknownAttribute {
                    entity: obj.entity_type.clone(),
                    attribute: key.clone(),
                })?;
            if attr.kind != value.kind() {
                return Err(SessionError::KindMismatch {
                    attribute: key,
                    expected: attr.kind,
                    found: value.kind(),
                });
            }
            let mut state = this.lock_state();
            state.ensure_usable()?;
            state.pending.stage_update(obj.id, key, value);
            Ok(())
        })?
    }

    /// Stages a deletion.
    pub fn delete(&self, obj: &ObjectRef) -> Result<(), SessionError> {
        let this = self.clone();
        let id = obj.id;
        self.run(move || {
            let mut state = this.lock_state();
            state.ensure_usable()?;
            state.pending.stage_delete(id);
            Ok(())
        })?
    }

    /// Fetches all visible objects of an entity type, filtered by an
    /// optional predicate, ordered by object identity.
    ///
    /// Visibility is this session's pending changes overlaid on its
    /// ancestor chain's pending state overlaid on the store. Siblings'
    /// uncommitted changes are never visible.
    pub fn fetch(
        &self,
        entity_type: &str,
        predicate: Option<&Predicate>,
    ) -> Result<Vec<Record>, SessionError> {
        if !self.shared.schema.contains_entity(entity_type) {
            return Err(SessionError::UnknownEntity(entity_type.to_string()));
        }
        let visible = self.visible(entity_type)?;
        let mut records: Vec<Record> = visible
            .into_values()
            .filter(|r| predicate.is_none_or(|p| p.matches(r)))
            .collect();
        records.sort_by_key(|r| r.id);
        Ok(records)
    }

    /// Commits pending changes: merge into the parent (and flush the
    /// store when the parent is root), or flush directly when this is the
    /// root, or apply locally when disposable. The change set is retained
    /// on failure for fix-and-retry.
    pub fn commit(&self) -> Result<(), CommitError> {
        save::commit(self)
    }

    /// Discards the session: pending changes are dropped and every
    /// further operation fails with [`SessionError::Discarded`].
    pub fn discard(&self) {
        let this = self.clone();
        let _ = self.run(move || {
            let mut state = this.lock_state();
            state.lifecycle = Lifecycle::Discarded;
            state.pending.clear();
            state.local.clear();
        });
    }

    /// Runs `work` on this session's queue and blocks until it returns.
    ///
    /// This is the scoped-execution call background sessions confine
    /// their operations through. Session operations invoked inside `work`
    /// run inline on the queue thread, so re-entry cannot deadlock.
    pub fn perform<R, F>(&self, work: F) -> Result<R, SessionError>
    where
        R: Send + 'static,
        F: FnOnce(&Session) -> R + Send + 'static,
    {
        let this = self.clone();
        self.run(move || work(&this))
    }

    // ── Crate-internal plumbing ──────────────────────────────────

    pub(crate) fn run<R, F>(&self, job: F) -> Result<R, SessionError>
    where
        R: Send + 'static,
        F: FnOnce() -> R + Send + 'static,
    {
        self.shared.queue.run(job)
    }

    pub(crate) fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.shared.state.lock()
    }

    pub(crate) fn parent(&self) -> Option<&Session> {
        self.shared.parent.as_ref()
    }

    pub(crate) fn store_handle(&self) -> Option<&Arc<StoreHandle>> {
        self.shared.store.as_ref()
    }

    /// Clears pending state after a store reset; a failed commit's
    /// retained change set is dropped along with it.
    pub(crate) fn clear_pending(&self) -> Result<(), SessionError> {
        let this = self.clone();
        self.run(move || {
            let mut state = this.lock_state();
            state.pending.clear();
            if state.lifecycle == Lifecycle::CommitFailed {
                state.lifecycle = Lifecycle::Active;
            }
        })
    }

    /// All visible records of one entity type, keyed by identity.
    pub(crate) fn visible(
        &self,
        entity_type: &str,
    ) -> Result<HashMap<ObjectId, Record>, SessionError> {
        let this = self.clone();
        let entity = entity_type.to_string();
        self.run(move || this.visible_on_queue(&entity))?
    }

    fn visible_on_queue(
        &self,
        entity_type: &str,
    ) -> Result<HashMap<ObjectId, Record>, SessionError> {
        self.lock_state().ensure_usable()?;
        let base = match self.shared.role {
            SessionRole::Disposable => {
                let state = self.lock_state();
                state
                    .local
                    .iter()
                    .filter(|(_, r)| r.entity_type == entity_type)
                    .map(|(id, r)| (*id, r.clone()))
                    .collect()
            }
            SessionRole::Root => match &self.shared.store {
                Some(store) => store.records_of(entity_type),
                None => HashMap::new(),
            },
            SessionRole::Main | SessionRole::Background => match &self.shared.parent {
                Some(parent) => parent.visible(entity_type)?,
                None => HashMap::new(),
            },
        };
        let state = self.lock_state();
        Ok(overlay(&state.pending, base, entity_type))
    }

    /// True if the object is visible from this session's position:
    /// staged here, or (when not deleted here) visible from the parent
    /// or present in the store.
    pub(crate) fn contains_visible(&self, id: &ObjectId) -> Result<bool, SessionError> {
        let this = self.clone();
        let id = *id;
        self.run(move || {
            {
                let state = this.lock_state();
                state.ensure_usable()?;
                if state.pending.deletes_object(&id) {
                    return Ok(false);
                }
                if state.pending.inserted(&id).is_some() {
                    return Ok(true);
                }
            }
            match this.shared.role {
                SessionRole::Root => Ok(this
                    .shared
                    .store
                    .as_ref()
                    .is_some_and(|store| store.contains(&id))),
                SessionRole::Disposable => Ok(this.lock_state().local.contains_key(&id)),
                SessionRole::Main | SessionRole::Background => match &this.shared.parent {
                    Some(parent) => parent.contains_visible(&id),
                    None => Ok(false),
                },
            }
        })?
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.shared.id)
            .field("role", &self.shared.role)
            .field("schema", &self.shared.schema.name())
            .finish_non_exhaustive()
    }
}

/// Applies a pending change set on top of a base snapshot of one entity.
fn overlay(
    pending: &ChangeSet,
    mut base: HashMap<ObjectId, Record>,
    entity_type: &str,
) -> HashMap<ObjectId, Record> {
    for record in pending.inserts() {
        if record.entity_type == entity_type {
            base.insert(record.id, record.clone());
        }
    }
    for (id, attrs) in pending.updates() {
        if let Some(record) = base.get_mut(id) {
            for (key, value) in attrs {
                record.set(key.clone(), value.clone());
            }
        }
    }
    for id in pending.deletes() {
        base.remove(id);
    }
    base
}
