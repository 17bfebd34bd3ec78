use corestack_model::AttributeValue;
use corestack_store::{ChangeSet, ObjectId, Record};
use proptest::prelude::*;

fn record(entity: &str) -> Record {
    Record::new(ObjectId::new(), entity)
}

// ── Staging semantics ────────────────────────────────────────────

#[test]
fn empty_by_default() {
    let cs = ChangeSet::new();
    assert!(cs.is_empty());
    assert_eq!(cs.len(), 0);
}

#[test]
fn update_on_own_insert_lands_on_the_record() {
    let mut cs = ChangeSet::new();
    let r = record("User");
    let id = r.id;
    cs.stage_insert(r);
    cs.stage_update(id, "name", AttributeValue::from("x"));

    assert!(cs.updates().is_empty(), "no standalone update recorded");
    assert_eq!(
        cs.inserted(&id).unwrap().get("name"),
        Some(&AttributeValue::from("x"))
    );
}

#[test]
fn delete_cancels_own_insert() {
    let mut cs = ChangeSet::new();
    let r = record("User");
    let id = r.id;
    cs.stage_insert(r);
    cs.stage_update(id, "name", AttributeValue::from("x"));
    cs.stage_delete(id);

    assert!(cs.is_empty(), "nothing propagates for a cancelled insert");
    assert!(!cs.deletes_object(&id));
}

#[test]
fn delete_of_foreign_object_is_recorded() {
    let mut cs = ChangeSet::new();
    let id = ObjectId::new();
    cs.stage_update(id, "name", AttributeValue::from("x"));
    cs.stage_delete(id);

    assert!(cs.deletes_object(&id));
    assert!(cs.updates().is_empty(), "updates to a deleted object drop");
}

#[test]
fn clear_drops_everything() {
    let mut cs = ChangeSet::new();
    cs.stage_insert(record("User"));
    cs.stage_delete(ObjectId::new());
    cs.clear();
    assert!(cs.is_empty());
}

// ── Merge semantics ──────────────────────────────────────────────

#[test]
fn merge_carries_child_inserts() {
    let mut parent = ChangeSet::new();
    let mut child = ChangeSet::new();
    let r = record("User");
    let id = r.id;
    child.stage_insert(r);

    parent.merge(child);
    assert!(parent.inserted(&id).is_some());
}

#[test]
fn merge_child_delete_cancels_parent_insert() {
    let mut parent = ChangeSet::new();
    let r = record("User");
    let id = r.id;
    parent.stage_insert(r);

    let mut child = ChangeSet::new();
    child.stage_delete(id);
    parent.merge(child);

    assert!(parent.inserted(&id).is_none());
    assert!(!parent.deletes_object(&id), "cancelled, nothing to propagate");
}

#[test]
fn merge_child_update_lands_on_parent_inserted_record() {
    let mut parent = ChangeSet::new();
    let r = record("User");
    let id = r.id;
    parent.stage_insert(r);

    let mut child = ChangeSet::new();
    child.stage_update(id, "name", AttributeValue::from("updated"));
    parent.merge(child);

    assert_eq!(
        parent.inserted(&id).unwrap().get("name"),
        Some(&AttributeValue::from("updated"))
    );
}

proptest! {
    /// Last writer wins per attribute: after a merge, every attribute the
    /// child wrote carries the child's value, and attributes only the
    /// parent wrote are untouched.
    #[test]
    fn merge_is_last_writer_wins_per_attribute(
        parent_writes in proptest::collection::btree_map("[a-e]", any::<i64>(), 0..5),
        child_writes in proptest::collection::btree_map("[a-e]", any::<i64>(), 0..5),
    ) {
        let id = ObjectId::new();
        let mut parent = ChangeSet::new();
        for (key, value) in &parent_writes {
            parent.stage_update(id, key.clone(), AttributeValue::Int(*value));
        }
        let mut child = ChangeSet::new();
        for (key, value) in &child_writes {
            child.stage_update(id, key.clone(), AttributeValue::Int(*value));
        }

        parent.merge(child);
        let empty = std::collections::BTreeMap::new();
        let merged = parent.updates().get(&id).unwrap_or(&empty);
        for (key, value) in &child_writes {
            prop_assert_eq!(merged.get(key), Some(&AttributeValue::Int(*value)));
        }
        for (key, value) in &parent_writes {
            if !child_writes.contains_key(key) {
                prop_assert_eq!(merged.get(key), Some(&AttributeValue::Int(*value)));
            }
        }
    }
}
