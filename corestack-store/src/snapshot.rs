//! On-disk snapshot format for file-backed stores.
//!
//! One JSON document per store file: the full schema the data was written
//! under, plus every record. Writes go to a sibling temp file first and
//! are renamed over the target, so the store file is always either the
//! previous snapshot or the new one in full.

use crate::error::{StoreError, StoreResult};
use crate::record::Record;
use corestack_model::Schema;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The persisted form of a file-backed store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct StoreSnapshot {
    pub schema: Schema,
    pub records: Vec<Record>,
}

impl StoreSnapshot {
    pub(crate) fn empty(schema: Schema) -> Self {
        Self {
            schema,
            records: Vec::new(),
        }
    }
}

/// Reads a snapshot. Parse failures surface as [`StoreError::Open`] since
/// they mean the store file is corrupt, not that a write went wrong.
pub(crate) fn read(path: &Path) -> StoreResult<StoreSnapshot> {
    let bytes = std::fs::read(path)?;
    serde_json::from_slice(&bytes)
        .map_err(|e| StoreError::Open(format!("corrupt store file {}: {e}", path.display())))
}

/// Writes a snapshot atomically: serialize to `<path>.tmp`, then rename.
pub(crate) fn write(path: &Path, snapshot: &StoreSnapshot) -> StoreResult<()> {
    let tmp = tmp_path(path);
    let bytes = serde_json::to_vec_pretty(snapshot)?;
    std::fs::write(&tmp, bytes)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}
