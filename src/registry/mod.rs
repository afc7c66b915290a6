//! CDE registry
//!
//! In-memory view of the KWYK common data elements file: an ordered map from
//! [`CdeKey`] to [`CdeRecord`] plus the `count` of allocated ids. Ids are
//! handed out in first-seen order and never change once assigned.

mod store;


pub use store::{RegistryStore, COUNT_KEY};

use crate::errors::{CdeError, CdeResult};
use crate::key::CdeKey;
use crate::types::{CdeRecord, StructuralIndex};
use indexmap::IndexMap;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Width of the zero-padded id
pub const ID_WIDTH: usize = 6;

/// Format a numeric id the way the registry stores it
pub fn format_id(n: u64) -> String {
    format!("{:0>width$}", n, width = ID_WIDTH)
}

/// The common data element registry
#[derive(Debug, Clone, Default)]
pub struct CdeRegistry {
    records: IndexMap<CdeKey, CdeRecord>,
    count: u64,
    dirty: bool,
}

// Equality is over content; the dirty flag is bookkeeping
impl PartialEq for CdeRegistry {
    fn eq(&self, other: &Self) -> bool {
        self.count == other.count && self.records == other.records
    }
}

impl CdeRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from loaded records, checking the id invariants
    pub fn from_records(records: IndexMap<CdeKey, CdeRecord>, count: u64) -> CdeResult<Self> {
        if count != records.len() as u64 {
            return Err(CdeError::InvalidCount(format!(
                "count is {} but the registry holds {} records",
                count,
                records.len()
            )));
        }

        let mut seen: HashMap<u64, &CdeKey> = HashMap::with_capacity(records.len());
        for (key, record) in &records {
            let n = record.numeric_id().ok_or_else(|| {
                CdeError::InvalidCount(format!("record {} has non-numeric id {:?}", key, record.id))
            })?;
            if n == 0 || n > count {
                return Err(CdeError::InvalidCount(format!(
                    "record {} has id {} outside 1..={}",
                    key, record.id, count
                )));
            }
            if record.id != format_id(n) {
                return Err(CdeError::InvalidCount(format!(
                    "record {} has non-canonical id {:?}, expected {:?}",
                    key,
                    record.id,
                    format_id(n)
                )));
            }
            if let Some(first) = seen.insert(n, key) {
                return Err(CdeError::DuplicateId {
                    id: record.id.clone(),
                    first: first.to_string(),
                    second: key.to_string(),
                });
            }
        }

        Ok(Self {
            records,
            count,
            dirty: false,
        })
    }

    /// Highest allocated id
    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether the registry changed since it was loaded or last saved
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(crate) fn mark_clean(&mut self) {
        self.dirty = false;
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn get(&self, key: &CdeKey) -> Option<&CdeRecord> {
        self.records.get(key)
    }

    pub fn contains(&self, key: &CdeKey) -> bool {
        self.records.contains_key(key)
    }

    /// Find a record by its id
    pub fn find_by_id(&self, id: &str) -> Option<(&CdeKey, &CdeRecord)> {
        self.records.iter().find(|(_, record)| record.id == id)
    }

    /// Records in first-seen order
    pub fn iter(&self) -> impl Iterator<Item = (&CdeKey, &CdeRecord)> {
        self.records.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (&CdeKey, &mut CdeRecord)> {
        self.records.iter_mut()
    }

    /// Return the id for `key`, allocating the next id if the key is new.
    ///
    /// Returns `(id, mutated)`. In strict mode an unknown key is still
    /// allocated, then reported as [`CdeError::UnknownKey`] so the new
    /// placeholder is reviewed before it becomes a permanent identifier.
    pub fn lookup_or_allocate(
        &mut self,
        key: &CdeKey,
        structural_index: &StructuralIndex,
        strict: bool,
    ) -> CdeResult<(String, bool)> {
        if let Some(record) = self.records.get(key) {
            return Ok((record.id.clone(), false));
        }

        let id = self.allocate(key, structural_index);

        if strict {
            warn!("Unknown CDE key {} (placeholder {})", key, id);
            return Err(CdeError::UnknownKey {
                key: key.to_string(),
                id,
            });
        }

        Ok((id, true))
    }

    fn allocate(&mut self, key: &CdeKey, structural_index: &StructuralIndex) -> String {
        self.count += 1;
        let id = format_id(self.count);
        let record = CdeRecord::placeholder(id.clone(), structural_index.clone(), key.label());
        self.records.insert(key.clone(), record);
        self.dirty = true;

        debug!("Allocated CDE {} for {}", id, key);
        id
    }
}
