//! Stored object identity and row representation.
//!
//! Uses UUID v7 for object identity so record ordering follows creation
//! time without a separate sequence column.

use corestack_model::AttributeValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for a stored object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(Uuid);

impl ObjectId {
    /// Creates a new object ID with the current timestamp.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates an object ID from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ObjectId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Caller-facing handle to an object created in a session.
///
/// Carries identity plus entity type; the attribute data lives in the
/// session's pending change set (or the store, once committed).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    pub id: ObjectId,
    pub entity_type: String,
}

impl ObjectRef {
    /// Creates a reference to an object of the given entity type.
    #[must_use]
    pub fn new(id: ObjectId, entity_type: impl Into<String>) -> Self {
        Self {
            id,
            entity_type: entity_type.into(),
        }
    }
}

/// A stored object: identity, entity type, and attribute values.
///
/// Attributes use a `BTreeMap` so snapshot files serialize with a stable
/// key order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: ObjectId,
    pub entity_type: String,
    pub attributes: BTreeMap<String, AttributeValue>,
}

impl Record {
    /// Creates an empty record of the given entity type.
    #[must_use]
    pub fn new(id: ObjectId, entity_type: impl Into<String>) -> Self {
        Self {
            id,
            entity_type: entity_type.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Returns a reference handle to this record.
    #[must_use]
    pub fn object_ref(&self) -> ObjectRef {
        ObjectRef::new(self.id, self.entity_type.clone())
    }

    /// Reads an attribute value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.get(key)
    }

    /// Sets an attribute value, replacing any previous one.
    pub fn set(&mut self, key: impl Into<String>, value: AttributeValue) {
        self.attributes.insert(key.into(), value);
    }
}
