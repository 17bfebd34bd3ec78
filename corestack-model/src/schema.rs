use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A versioned, immutable description of the entity types a store holds.
///
/// Identified by `(name, version)`. The entity-name index is built once
/// when the schema is constructed (or deserialized from a model file), so
/// string-keyed entity lookup never scans the entity list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "SchemaDoc", into = "SchemaDoc")]
pub struct Schema {
    name: String,
    version: u32,
    entities: Vec<EntityDescription>,
    index: HashMap<String, usize>,
}

/// On-disk/JSON representation of a [`Schema`] (no derived index).
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SchemaDoc {
    name: String,
    version: u32,
    entities: Vec<EntityDescription>,
}

impl From<SchemaDoc> for Schema {
    fn from(doc: SchemaDoc) -> Self {
        Self::new(doc.name, doc.version, doc.entities)
    }
}

impl From<Schema> for SchemaDoc {
    fn from(schema: Schema) -> Self {
        Self {
            name: schema.name,
            version: schema.version,
            entities: schema.entities,
        }
    }
}

impl Schema {
    /// Creates a schema and builds its entity-name index.
    ///
    /// If two entities share a name, the first one wins the index slot;
    /// model files are expected not to do this.
    #[must_use]
    pub fn new(name: impl Into<String>, version: u32, entities: Vec<EntityDescription>) -> Self {
        let mut index = HashMap::with_capacity(entities.len());
        for (i, entity) in entities.iter().enumerate() {
            index.entry(entity.name.clone()).or_insert(i);
        }
        Self {
            name: name.into(),
            version,
            entities,
            index,
        }
    }

    /// The model name this schema belongs to.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The schema version.
    #[must_use]
    pub fn version(&self) -> u32 {
        self.version
    }

    /// All entity descriptions, in model-file order.
    #[must_use]
    pub fn entities(&self) -> &[EntityDescription] {
        &self.entities
    }

    /// Looks up an entity description by name via the load-time index.
    #[must_use]
    pub fn entity(&self, name: &str) -> Option<&EntityDescription> {
        self.index.get(name).map(|&i| &self.entities[i])
    }

    /// True if the schema describes an entity with the given name.
    #[must_use]
    pub fn contains_entity(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} v{}", self.name, self.version)
    }
}

/// Describes one entity type: its name and attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityDescription {
    pub name: String,
    pub attributes: Vec<AttributeDescription>,
}

impl EntityDescription {
    /// Creates an entity description.
    #[must_use]
    pub fn new(name: impl Into<String>, attributes: Vec<AttributeDescription>) -> Self {
        Self {
            name: name.into(),
            attributes,
        }
    }

    /// Looks up an attribute description by name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&AttributeDescription> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Attributes that must be present on every committed object.
    pub fn required_attributes(&self) -> impl Iterator<Item = &AttributeDescription> {
        self.attributes.iter().filter(|a| !a.optional)
    }
}

/// Describes a single attribute of an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeDescription {
    pub name: String,
    pub kind: AttributeKind,
    /// Optional attributes may be absent on committed objects. Only
    /// optional attributes can be added by automatic migration.
    #[serde(default)]
    pub optional: bool,
}

impl AttributeDescription {
    /// Shorthand for a required attribute.
    #[must_use]
    pub fn required(name: impl Into<String>, kind: AttributeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            optional: false,
        }
    }

    /// Shorthand for an optional attribute.
    #[must_use]
    pub fn optional(name: impl Into<String>, kind: AttributeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            optional: true,
        }
    }
}

/// The data type of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKind {
    Int,
    Float,
    Bool,
    String,
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::String => "string",
        };
        f.write_str(s)
    }
}

/// A typed attribute value carried by a stored object.
///
/// Tagged serde representation so `Int` and `Float` survive round-trips
/// unambiguously.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AttributeValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    String(String),
}

impl AttributeValue {
    /// The kind this value satisfies, for validation against a schema.
    #[must_use]
    pub fn kind(&self) -> AttributeKind {
        match self {
            Self::Int(_) => AttributeKind::Int,
            Self::Float(_) => AttributeKind::Float,
            Self::Bool(_) => AttributeKind::Bool,
            Self::String(_) => AttributeKind::String,
        }
    }

    /// The integer value, if this is an `Int`.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// The string value, if this is a `String`.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    /// The boolean value, if this is a `Bool`.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// The float value, if this is a `Float`.
    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<i64> for AttributeValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for AttributeValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for AttributeValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for AttributeValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}
