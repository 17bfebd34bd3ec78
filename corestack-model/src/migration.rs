//! Migration planning between schema versions.
//!
//! A plan is computed purely from the two schema descriptions; it never
//! looks at stored data. Only strictly additive changes are considered
//! safe for automatic migration:
//! - a new entity type (no existing rows to backfill)
//! - a new **optional** attribute on an existing entity
//!
//! Everything else — removed entities or attributes, kind changes,
//! optionality changes, version downgrades — yields
//! [`ModelError::Incompatible`]. Renames are indistinguishable from a
//! remove-plus-add and are therefore incompatible as well.

use crate::error::{ModelError, ModelResult};
use crate::schema::{AttributeDescription, Schema};

/// One compatible change applied during migration.
#[derive(Debug, Clone, PartialEq)]
pub enum MigrationStep {
    /// A new entity type exists in the target schema.
    AddEntity { entity: String },
    /// A new optional attribute exists on an entity that already has rows.
    AddAttribute {
        entity: String,
        attribute: AttributeDescription,
    },
}

/// The ordered set of compatible changes between two schema versions.
#[derive(Debug, Clone, PartialEq)]
pub struct MigrationPlan {
    from_version: u32,
    to_version: u32,
    steps: Vec<MigrationStep>,
}

impl MigrationPlan {
    /// Computes the migration plan from `from` to `to`.
    ///
    /// Steps are ordered by the target schema's entity order: added
    /// entities first, then added attributes. Returns
    /// [`ModelError::Incompatible`] when any non-additive change is found,
    /// naming the offending entity or attribute.
    pub fn compute(from: &Schema, to: &Schema) -> ModelResult<Self> {
        if from.name() != to.name() {
            return Err(ModelError::incompatible(format!(
                "model name changed: {} -> {}",
                from.name(),
                to.name()
            )));
        }
        if to.version() <= from.version() {
            return Err(ModelError::incompatible(format!(
                "cannot migrate {} v{} to v{}: target version must be higher",
                from.name(),
                from.version(),
                to.version()
            )));
        }

        // Every entity the old schema knows must survive unchanged apart
        // from added optional attributes.
        for old_entity in from.entities() {
            let Some(new_entity) = to.entity(&old_entity.name) else {
                return Err(ModelError::incompatible(format!(
                    "entity {} was removed",
                    old_entity.name
                )));
            };
            for old_attr in &old_entity.attributes {
                let Some(new_attr) = new_entity.attribute(&old_attr.name) else {
                    return Err(ModelError::incompatible(format!(
                        "attribute {}.{} was removed or renamed",
                        old_entity.name, old_attr.name
                    )));
                };
                if new_attr.kind != old_attr.kind {
                    return Err(ModelError::incompatible(format!(
                        "attribute {}.{} changed kind: {} -> {}",
                        old_entity.name, old_attr.name, old_attr.kind, new_attr.kind
                    )));
                }
                if new_attr.optional != old_attr.optional {
                    return Err(ModelError::incompatible(format!(
                        "attribute {}.{} changed optionality",
                        old_entity.name, old_attr.name
                    )));
                }
            }
        }

        let mut steps = Vec::new();
        for new_entity in to.entities() {
            match from.entity(&new_entity.name) {
                None => steps.push(MigrationStep::AddEntity {
                    entity: new_entity.name.clone(),
                }),
                Some(old_entity) => {
                    for new_attr in &new_entity.attributes {
                        if old_entity.attribute(&new_attr.name).is_some() {
                            continue;
                        }
                        if !new_attr.optional {
                            return Err(ModelError::incompatible(format!(
                                "new attribute {}.{} is required; existing rows cannot satisfy it",
                                new_entity.name, new_attr.name
                            )));
                        }
                        steps.push(MigrationStep::AddAttribute {
                            entity: new_entity.name.clone(),
                            attribute: new_attr.clone(),
                        });
                    }
                }
            }
        }

        Ok(Self {
            from_version: from.version(),
            to_version: to.version(),
            steps,
        })
    }

    /// The version migrated away from.
    #[must_use]
    pub fn from_version(&self) -> u32 {
        self.from_version
    }

    /// The version migrated to.
    #[must_use]
    pub fn to_version(&self) -> u32 {
        self.to_version
    }

    /// The ordered compatible changes.
    #[must_use]
    pub fn steps(&self) -> &[MigrationStep] {
        &self.steps
    }
}
