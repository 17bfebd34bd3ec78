use corestack_model::{
    AttributeDescription, AttributeKind, AttributeValue, EntityDescription, Schema,
};
use corestack_store::{ChangeSet, ObjectId, Record, StoreCoordinator, StoreError, StoreKind};
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn v1() -> Arc<Schema> {
    Arc::new(Schema::new(
        "AppModel",
        1,
        vec![EntityDescription::new(
            "User",
            vec![
                AttributeDescription::required("remoteID", AttributeKind::Int),
                AttributeDescription::required("name", AttributeKind::String),
            ],
        )],
    ))
}

fn v2_with_email() -> Arc<Schema> {
    Arc::new(Schema::new(
        "AppModel",
        2,
        vec![EntityDescription::new(
            "User",
            vec![
                AttributeDescription::required("remoteID", AttributeKind::Int),
                AttributeDescription::required("name", AttributeKind::String),
                AttributeDescription::optional("email", AttributeKind::String),
            ],
        )],
    ))
}

fn insert_user(coordinator: &StoreCoordinator, remote_id: i64, name: &str) -> ObjectId {
    let mut record = Record::new(ObjectId::new(), "User");
    record.set("remoteID", AttributeValue::Int(remote_id));
    record.set("name", AttributeValue::from(name));
    let id = record.id;
    let mut batch = ChangeSet::new();
    batch.stage_insert(record);
    coordinator.handle().apply(&batch).expect("flush succeeds");
    id
}

// ── Opening ──────────────────────────────────────────────────────

#[test]
fn in_memory_store_opens_empty() {
    let coordinator = StoreCoordinator::open(v1(), StoreKind::InMemory).unwrap();
    let handle = coordinator.handle();
    assert_eq!(handle.record_count(), 0);
    assert!(!handle.is_file_backed());
    assert_eq!(handle.schema().version(), 1);
}

#[test]
fn file_store_creates_and_reloads() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.store");

    let coordinator =
        StoreCoordinator::open(v1(), StoreKind::OnDisk(path.clone())).unwrap();
    assert!(path.exists(), "open creates the store file");
    insert_user(&coordinator, 1, "Joshua Ivanof");
    drop(coordinator);

    let reopened = StoreCoordinator::open(v1(), StoreKind::OnDisk(path)).unwrap();
    let users = reopened.handle().records_of("User");
    assert_eq!(users.len(), 1);
    let user = users.values().next().unwrap();
    assert_eq!(user.get("name"), Some(&AttributeValue::from("Joshua Ivanof")));
}

#[test]
fn corrupt_file_is_an_open_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.store");
    std::fs::write(&path, b"not json at all").unwrap();

    match StoreCoordinator::open(v1(), StoreKind::OnDisk(path)) {
        Err(StoreError::Open(reason)) => assert!(reason.contains("corrupt")),
        other => panic!("expected Open error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn wrong_model_name_is_an_open_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.store");
    let other = Arc::new(Schema::new("OtherModel", 1, Vec::new()));
    StoreCoordinator::open(other, StoreKind::OnDisk(path.clone())).unwrap();

    match StoreCoordinator::open(v1(), StoreKind::OnDisk(path)) {
        Err(StoreError::Open(reason)) => assert!(reason.contains("OtherModel")),
        other => panic!("expected Open error, got {:?}", other.map(|_| ())),
    }
}

// ── Migration ────────────────────────────────────────────────────

#[test]
fn additive_migration_preserves_records() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.store");

    let coordinator =
        StoreCoordinator::open(v1(), StoreKind::OnDisk(path.clone())).unwrap();
    let id = insert_user(&coordinator, 1, "Joshua Ivanof");
    drop(coordinator);

    let migrated =
        StoreCoordinator::open(v2_with_email(), StoreKind::OnDisk(path.clone())).unwrap();
    let handle = migrated.handle();
    assert_eq!(handle.schema().version(), 2);

    let users = handle.records_of("User");
    assert_eq!(users.len(), 1, "existing data survives migration");
    let user = &users[&id];
    assert_eq!(user.get("remoteID"), Some(&AttributeValue::Int(1)));
    assert_eq!(user.get("name"), Some(&AttributeValue::from("Joshua Ivanof")));

    // the new optional attribute is settable and persists
    let mut batch = ChangeSet::new();
    batch.stage_update(id, "email", AttributeValue::from("j@example.com"));
    handle.apply(&batch).unwrap();
    drop(migrated);

    let reopened = StoreCoordinator::open(v2_with_email(), StoreKind::OnDisk(path)).unwrap();
    let users = reopened.handle().records_of("User");
    assert_eq!(
        users[&id].get("email"),
        Some(&AttributeValue::from("j@example.com"))
    );
}

#[test]
fn incompatible_migration_leaves_file_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.store");

    let coordinator =
        StoreCoordinator::open(v1(), StoreKind::OnDisk(path.clone())).unwrap();
    insert_user(&coordinator, 1, "Joshua Ivanof");
    drop(coordinator);
    let before = std::fs::read(&path).unwrap();

    // v2 drops the `name` attribute — destructive, refused
    let destructive = Arc::new(Schema::new(
        "AppModel",
        2,
        vec![EntityDescription::new(
            "User",
            vec![AttributeDescription::required(
                "remoteID",
                AttributeKind::Int,
            )],
        )],
    ));
    match StoreCoordinator::open(destructive, StoreKind::OnDisk(path.clone())) {
        Err(StoreError::Incompatible(_)) => {}
        other => panic!("expected Incompatible, got {:?}", other.map(|_| ())),
    }

    let after = std::fs::read(&path).unwrap();
    assert_eq!(before, after, "refused migration must not mutate the file");

    // the original schema still opens it
    let reopened = StoreCoordinator::open(v1(), StoreKind::OnDisk(path)).unwrap();
    assert_eq!(reopened.handle().record_count(), 1);
}

// ── Flush semantics ──────────────────────────────────────────────

#[test]
fn update_to_missing_object_fails_whole_batch() {
    let coordinator = StoreCoordinator::open(v1(), StoreKind::InMemory).unwrap();
    let handle = coordinator.handle();

    let mut record = Record::new(ObjectId::new(), "User");
    record.set("remoteID", AttributeValue::Int(1));
    record.set("name", AttributeValue::from("a"));
    let mut batch = ChangeSet::new();
    batch.stage_insert(record);
    batch.stage_update(ObjectId::new(), "name", AttributeValue::from("ghost"));

    match handle.apply(&batch) {
        Err(StoreError::MissingObject(_)) => {}
        other => panic!("expected MissingObject, got {other:?}"),
    }
    assert_eq!(handle.record_count(), 0, "all-or-nothing: insert rolled back");
}

#[test]
fn delete_of_unknown_object_is_a_noop() {
    let coordinator = StoreCoordinator::open(v1(), StoreKind::InMemory).unwrap();
    let mut batch = ChangeSet::new();
    batch.stage_delete(ObjectId::new());
    coordinator.handle().apply(&batch).unwrap();
}

// ── Reset ────────────────────────────────────────────────────────

#[test]
fn reset_empties_store_and_keeps_schema() {
    let coordinator = StoreCoordinator::open(v1(), StoreKind::InMemory).unwrap();
    insert_user(&coordinator, 1, "a");
    insert_user(&coordinator, 2, "b");
    assert_eq!(coordinator.handle().record_count(), 2);

    coordinator.reset().unwrap();
    let handle = coordinator.handle();
    assert_eq!(handle.record_count(), 0);
    assert_eq!(handle.schema().version(), 1);

    // store stays usable after reset
    insert_user(&coordinator, 3, "c");
    assert_eq!(handle.record_count(), 1);
}

#[test]
fn reset_recreates_store_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.store");

    let coordinator =
        StoreCoordinator::open(v1(), StoreKind::OnDisk(path.clone())).unwrap();
    insert_user(&coordinator, 1, "a");
    coordinator.reset().unwrap();

    assert!(path.exists(), "reset reinstates an empty store file");
    drop(coordinator);
    let reopened = StoreCoordinator::open(v1(), StoreKind::OnDisk(path)).unwrap();
    assert_eq!(reopened.handle().record_count(), 0);
}
