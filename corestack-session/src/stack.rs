//! The stack facade: store + session hierarchy, wired together.

use crate::error::{SessionError, StackError};
use crate::session::{Session, SessionRole};
use corestack_model::{ModelCatalog, Schema};
use corestack_store::{StoreCoordinator, StoreError, StoreKind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

/// Where the stack's schema comes from.
pub enum SchemaSource<'a> {
    /// A schema already loaded by the caller.
    Loaded(Arc<Schema>),
    /// Resolve the latest version of a named model from a catalog.
    Catalog {
        catalog: &'a ModelCatalog,
        name: &'a str,
    },
}

/// A persistence stack: one open store, one hidden root writer session,
/// one long-lived main session, and factories for background and
/// disposable sessions.
pub struct Stack {
    coordinator: StoreCoordinator,
    root: Session,
    main: Session,
    background_seq: AtomicU64,
}

impl Stack {
    /// Opens a stack for the given schema and store kind.
    ///
    /// Fails fast: if the store cannot be opened or migrated, or the
    /// session hierarchy cannot be brought up, no stack is returned and
    /// nothing is left half-initialized.
    pub fn open(source: SchemaSource<'_>, kind: StoreKind) -> Result<Self, StackError> {
        let schema = match source {
            SchemaSource::Loaded(schema) => schema,
            SchemaSource::Catalog { catalog, name } => catalog
                .schema(name)
                .ok_or_else(|| StackError::UnknownSchema(name.to_string()))?,
        };
        let coordinator = StoreCoordinator::open(Arc::clone(&schema), kind)?;
        let root = Session::root(Arc::clone(&schema), coordinator.handle())?;
        let main = Session::child_of(&root, SessionRole::Main, "corestack-main")?;
        info!(schema = %schema, "stack opened");
        Ok(Self {
            coordinator,
            root,
            main,
            background_seq: AtomicU64::new(0),
        })
    }

    /// The stack's singleton main session. Created at construction, lives
    /// as long as the stack.
    #[must_use]
    pub fn main_session(&self) -> &Session {
        &self.main
    }

    /// Runs `work` with a transient background session (child of root) on
    /// that session's private queue, blocking the caller until `work`
    /// returns and any commit inside it has fully propagated. The session
    /// is discarded afterwards.
    ///
    /// Visibility through other sessions requires `work` to commit
    /// explicitly; returning without a commit abandons the changes.
    pub fn perform_in_background<R, F>(&self, work: F) -> Result<R, StackError>
    where
        R: Send + 'static,
        F: FnOnce(&Session) -> R + Send + 'static,
    {
        let session = self.spawn_background()?;
        let result = session.perform(work);
        session.discard();
        result.map_err(StackError::from)
    }

    /// Creates a caller-owned background session (child of root). The
    /// caller must confine all operations to it through
    /// [`Session::perform`] and is responsible for commit or discard.
    pub fn new_background_session(&self) -> Result<Session, StackError> {
        self.spawn_background().map_err(StackError::from)
    }

    /// Creates a disposable session: same schema, no parent, no path to
    /// the store. Commits update only its own private state and vanish
    /// with the session.
    pub fn new_disposable_session(&self) -> Result<Session, StackError> {
        Session::disposable(Arc::clone(self.root.schema())).map_err(StackError::from)
    }

    /// Resets the store: waits for in-flight commits to drain off the
    /// root queue, deletes the backing file (no-op in memory), reinstalls
    /// a fresh empty store at the same location with the same schema, and
    /// clears root and main pending state. Existing session handles stay
    /// valid and immediately reflect the empty store.
    pub fn reset_store(&self) -> Result<(), StoreError> {
        let coordinator = self.coordinator.clone();
        let root = self.root.clone();
        // Running the reset as a root-queue job is what guarantees the
        // writer is idle while the file is deleted and recreated.
        self.root
            .run(move || {
                coordinator.reset()?;
                root.clear_pending()
                    .map_err(|e| StoreError::Drop(e.to_string()))?;
                Ok::<(), StoreError>(())
            })
            .map_err(|e: SessionError| StoreError::Drop(e.to_string()))??;
        self.main
            .clear_pending()
            .map_err(|e| StoreError::Drop(e.to_string()))?;
        info!("stack store reset");
        Ok(())
    }

    fn spawn_background(&self) -> Result<Session, SessionError> {
        let n = self.background_seq.fetch_add(1, Ordering::Relaxed);
        Session::child_of(
            &self.root,
            SessionRole::Background,
            &format!("corestack-bg-{n}"),
        )
    }
}

impl Drop for Stack {
    fn drop(&mut self) {
        // Hierarchy teardown: both long-lived sessions end Discarded.
        self.main.discard();
        self.root.discard();
    }
}
