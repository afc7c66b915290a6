//! Registry file persistence
//!
//! The registry is one JSON object: a reserved `count` entry plus one entry
//! per serialized [`CdeKey`]. It is read whole at startup and rewritten whole
//! (atomically) when it changed.

use super::CdeRegistry;
use crate::errors::{CdeError, CdeResult};
use crate::key::CdeKey;
use crate::persist;
use crate::types::CdeRecord;
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Reserved entry holding the highest allocated id
pub const COUNT_KEY: &str = "count";

/// File-backed registry store
#[derive(Debug, Clone)]
pub struct RegistryStore {
    path: PathBuf,
}

impl RegistryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load and validate the registry file
    pub fn load(&self) -> CdeResult<CdeRegistry> {
        let content = persist::read_to_string(&self.path)?;
        let registry = Self::from_json(&content).map_err(|e| match e {
            CdeError::Json { source, .. } => CdeError::json(&self.path, source),
            other => other,
        })?;
        info!(
            "Loaded {} CDEs from {}",
            registry.len(),
            self.path.display()
        );
        Ok(registry)
    }

    /// Write the registry back and mark it clean
    pub fn save(&self, registry: &mut CdeRegistry) -> CdeResult<()> {
        persist::write_json_atomic(&self.path, &Self::to_document(registry)?)?;
        registry.mark_clean();
        info!("Saved {} CDEs to {}", registry.len(), self.path.display());
        Ok(())
    }

    /// Write the registry only if it changed. Returns whether it was written.
    pub fn save_if_dirty(&self, registry: &mut CdeRegistry) -> CdeResult<bool> {
        if !registry.is_dirty() {
            debug!("Registry unchanged, not rewriting {}", self.path.display());
            return Ok(false);
        }
        self.save(registry)?;
        Ok(true)
    }

    /// Parse a registry document
    pub fn from_json(content: &str) -> CdeResult<CdeRegistry> {
        let document: Map<String, Value> =
            serde_json::from_str(content).map_err(|e| CdeError::json("<registry>", e))?;

        let mut count: Option<u64> = None;
        let mut records: IndexMap<CdeKey, CdeRecord> = IndexMap::with_capacity(document.len());

        for (raw_key, value) in document {
            if raw_key == COUNT_KEY {
                let n = value.as_u64().ok_or_else(|| {
                    CdeError::InvalidCount(format!("expected a non-negative integer, got {}", value))
                })?;
                count = Some(n);
                continue;
            }

            let key = CdeKey::parse(&raw_key)?;
            let record: CdeRecord =
                serde_json::from_value(value).map_err(|e| CdeError::json(&raw_key, e))?;
            if records.insert(key, record).is_some() {
                return Err(CdeError::malformed(
                    &raw_key,
                    "decodes to a key that is already present",
                ));
            }
        }

        let count = count.ok_or_else(|| CdeError::InvalidCount("missing count entry".into()))?;
        CdeRegistry::from_records(records, count)
    }

    /// Build the JSON document for a registry, `count` first
    pub fn to_document(registry: &CdeRegistry) -> CdeResult<Map<String, Value>> {
        let mut document = Map::new();
        document.insert(COUNT_KEY.to_string(), Value::from(registry.count()));
        for (key, record) in registry.iter() {
            let raw_key = key.format();
            let value = serde_json::to_value(record).map_err(|e| CdeError::json(&raw_key, e))?;
            document.insert(raw_key, value);
        }
        Ok(document)
    }
}
