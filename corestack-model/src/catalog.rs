//! Named registry of loaded schemas.
//!
//! The catalog plays the role of the "bundle" in stack construction: model
//! files are loaded into it once, then stacks resolve a schema by name.
//! Registered schemas are shared via `Arc` and never mutated.

use crate::error::{ModelError, ModelResult};
use crate::schema::Schema;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Loads model files and resolves schemas by `(name, version)`.
#[derive(Debug, Default)]
pub struct ModelCatalog {
    /// Versions per model name, kept sorted ascending by version.
    schemas: HashMap<String, Vec<Arc<Schema>>>,
}

impl ModelCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a schema from a JSON model document.
    pub fn parse(json: &str) -> ModelResult<Schema> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and registers a model file, returning the loaded schema.
    pub fn load_file(&mut self, path: &Path) -> ModelResult<Arc<Schema>> {
        let json = std::fs::read_to_string(path)?;
        let schema = Self::parse(&json)?;
        self.register(schema)
    }

    /// Registers a schema. Fails if the same (name, version) is already
    /// present; distinct versions of one model coexist.
    pub fn register(&mut self, schema: Schema) -> ModelResult<Arc<Schema>> {
        let versions = self.schemas.entry(schema.name().to_string()).or_default();
        if versions.iter().any(|s| s.version() == schema.version()) {
            return Err(ModelError::DuplicateSchema {
                name: schema.name().to_string(),
                version: schema.version(),
            });
        }
        let schema = Arc::new(schema);
        versions.push(Arc::clone(&schema));
        versions.sort_by_key(|s| s.version());
        Ok(schema)
    }

    /// Resolves the latest registered version of a model.
    #[must_use]
    pub fn schema(&self, name: &str) -> Option<Arc<Schema>> {
        self.schemas
            .get(name)
            .and_then(|versions| versions.last())
            .cloned()
    }

    /// Resolves a specific version of a model.
    #[must_use]
    pub fn schema_version(&self, name: &str, version: u32) -> Option<Arc<Schema>> {
        self.schemas
            .get(name)?
            .iter()
            .find(|s| s.version() == version)
            .cloned()
    }

    /// Names of all registered models.
    pub fn model_names(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }
}
