use corestack_session::{
    AttributeDescription, AttributeKind, EntityDescription, Schema, SchemaSource, Stack, StoreKind,
};
use std::sync::Arc;

/// The `User { remoteID: Int, name: String }` model used across the
/// stack tests, plus an optional email.
pub fn user_schema() -> Arc<Schema> {
    Arc::new(Schema::new(
        "AppModel",
        1,
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

pub fn in_memory_stack() -> Stack {
    Stack::open(SchemaSource::Loaded(user_schema()), StoreKind::InMemory)
        .expect("in-memory stack opens")
}
