//! KWYK → ReproNim ontology mapping
//!
//! The mapping file (`kwykmap.json`) holds two hand-curated sections:
//!
//! - `Structures`: segmentation label → `{isAbout, kwyk_index}`
//! - `Measures`: measure name → `{measureOf, datumType, hasUnit}`
//!
//! [`merge`] pushes curated annotations into the CDE registry. Information
//! only flows from mapping to registry; the only thing the registry
//! contributes back is a placeholder entry for labels the mapping has never
//! seen, so curators know what is waiting for annotation.

use crate::errors::{CdeError, CdeResult};
use crate::persist;
use crate::registry::CdeRegistry;
use crate::types::StructuralIndex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// `isAbout` values containing one of these are placeholders awaiting curation
pub const PLACEHOLDER_MARKERS: [&str; 2] = ["UNKNOWN", "CUSTOM"];

/// Record fields a measure bundle may never overwrite
const RESERVED_RECORD_FIELDS: [&str; 3] = ["id", "structure_id", "label"];

/// Anatomical annotation for one segmentation label
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructureMapping {
    #[serde(rename = "isAbout", default)]
    pub is_about: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kwyk_index: Option<StructuralIndex>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl StructureMapping {
    /// Curated anatomical IRI, ignoring placeholder markers
    pub fn curated_is_about(&self) -> Option<&str> {
        self.is_about
            .as_deref()
            .filter(|iri| !PLACEHOLDER_MARKERS.iter().any(|m| iri.contains(m)))
    }
}

/// Measurement-type annotation bundle
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeasureMapping {
    #[serde(rename = "datumType", default)]
    pub datum_type: Option<String>,

    #[serde(rename = "hasUnit", default)]
    pub has_unit: Option<String>,

    #[serde(rename = "measureOf", default)]
    pub measure_of: Option<String>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// The full ontology mapping document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OntologyMapping {
    #[serde(rename = "Measures", default)]
    pub measures: BTreeMap<String, MeasureMapping>,

    #[serde(rename = "Structures", default)]
    pub structures: BTreeMap<String, StructureMapping>,
}

/// What a merge changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub structures_added: usize,
    pub measures_added: usize,
    pub records_updated: usize,
}

impl MergeReport {
    pub fn is_noop(&self) -> bool {
        self.structures_added == 0 && self.measures_added == 0 && self.records_updated == 0
    }
}

/// Reconcile the ontology mapping with the registry, in place
pub fn merge(mapping: &mut OntologyMapping, registry: &mut CdeRegistry) -> MergeReport {
    let mut report = MergeReport::default();

    for (key, record) in registry.iter_mut() {
        let structure = mapping
            .structures
            .entry(key.structure.clone())
            .or_insert_with(|| {
                report.structures_added += 1;
                StructureMapping {
                    is_about: None,
                    kwyk_index: Some(record.structure_id.clone()),
                    extra: BTreeMap::new(),
                }
            });

        let measure = mapping
            .measures
            .entry(key.measure.as_str().to_string())
            .or_insert_with(|| {
                report.measures_added += 1;
                MeasureMapping {
                    has_unit: Some(key.unit.as_str().to_string()),
                    ..MeasureMapping::default()
                }
            });

        let before = record.clone();

        if let Some(iri) = structure.curated_is_about() {
            record.is_about = Some(iri.to_string());
        }

        // Measure annotations replace the record's values wholesale
        if measure.measure_of.is_some() {
            record.measure_of = measure.measure_of.clone();
            record.datum_type = measure.datum_type.clone();
            record.has_unit = measure.has_unit.clone();
            for (field, value) in &measure.extra {
                if RESERVED_RECORD_FIELDS.contains(&field.as_str()) {
                    continue;
                }
                record.extra.insert(field.clone(), value.clone());
            }
        }

        if *record != before {
            debug!("Merged annotations into CDE {} ({})", record.id, key);
            report.records_updated += 1;
        }
    }

    if report.records_updated > 0 {
        registry.mark_dirty();
    }

    info!(
        "Mapping merge: {} structures added, {} measures added, {} CDEs updated",
        report.structures_added, report.measures_added, report.records_updated
    );
    report
}

/// File-backed mapping store
#[derive(Debug, Clone)]
pub struct MappingStore {
    path: PathBuf,
}

impl MappingStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> CdeResult<OntologyMapping> {
        let content = persist::read_to_string(&self.path)?;
        let mapping: OntologyMapping =
            serde_json::from_str(&content).map_err(|e| CdeError::json(&self.path, e))?;
        info!(
            "Loaded mapping with {} structures and {} measures from {}",
            mapping.structures.len(),
            mapping.measures.len(),
            self.path.display()
        );
        Ok(mapping)
    }

    /// Write the mapping with keys sorted at every level
    pub fn save(&self, mapping: &OntologyMapping) -> CdeResult<()> {
        let document = serde_json::to_value(mapping).map_err(|e| CdeError::json(&self.path, e))?;
        persist::write_json_atomic(&self.path, &sorted_value(document))?;
        info!("Saved mapping to {}", self.path.display());
        Ok(())
    }
}

/// Rebuild a JSON value with object keys in sorted order, recursively
fn sorted_value(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, sorted_value(value)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sorted_value).collect()),
        other => other,
    }
}
