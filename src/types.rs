use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Measure recorded for a segmented structure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Measure {
    #[serde(rename = "number_voxels")]
    NumberVoxels,
    #[serde(rename = "vol_inmm3")]
    VolInMm3,
}

impl Measure {
    pub fn as_str(&self) -> &'static str {
        match self {
            Measure::NumberVoxels => "number_voxels",
            Measure::VolInMm3 => "vol_inmm3",
        }
    }

    /// Unit a measure is always reported in
    pub fn unit(&self) -> Unit {
        match self {
            Measure::NumberVoxels => Unit::Voxels,
            Measure::VolInMm3 => Unit::CubicMillimeters,
        }
    }

    pub fn all() -> [Measure; 2] {
        [Measure::NumberVoxels, Measure::VolInMm3]
    }
}

impl std::fmt::Display for Measure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Measure {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "number_voxels" => Ok(Measure::NumberVoxels),
            "vol_inmm3" => Ok(Measure::VolInMm3),
            other => Err(format!("unknown measure '{}'", other)),
        }
    }
}

/// Unit of a measure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Unit {
    #[serde(rename = "voxels")]
    Voxels,
    #[serde(rename = "mm^3")]
    CubicMillimeters,
}

impl Unit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Voxels => "voxels",
            Unit::CubicMillimeters => "mm^3",
        }
    }
}

impl std::fmt::Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Unit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "voxels" => Ok(Unit::Voxels),
            "mm^3" => Ok(Unit::CubicMillimeters),
            other => Err(format!("unknown unit '{}'", other)),
        }
    }
}

/// Opaque structural index from the segmentation source.
///
/// Carried through unchanged, so both numeric and textual forms survive a
/// load/save cycle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StructuralIndex {
    Int(i64),
    Text(String),
}

impl StructuralIndex {
    /// Parse a raw table cell, keeping integers numeric
    pub fn from_cell(cell: &str) -> Self {
        cell.parse::<i64>()
            .map(StructuralIndex::Int)
            .unwrap_or_else(|_| StructuralIndex::Text(cell.to_string()))
    }
}

impl std::fmt::Display for StructuralIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StructuralIndex::Int(n) => write!(f, "{}", n),
            StructuralIndex::Text(s) => write!(f, "{}", s),
        }
    }
}

/// A common data element record as stored in the registry file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CdeRecord {
    /// Zero-padded six digit identifier
    pub id: String,

    pub structure_id: StructuralIndex,

    /// "{structure} {measure} ({unit})"
    pub label: String,

    /// Anatomical concept IRI, set only once curated
    #[serde(rename = "isAbout", default, skip_serializing_if = "Option::is_none")]
    pub is_about: Option<String>,

    #[serde(rename = "measureOf", default, skip_serializing_if = "Option::is_none")]
    pub measure_of: Option<String>,

    #[serde(rename = "datumType", default, skip_serializing_if = "Option::is_none")]
    pub datum_type: Option<String>,

    #[serde(rename = "hasUnit", default, skip_serializing_if = "Option::is_none")]
    pub has_unit: Option<String>,

    /// Any other curated fields, preserved verbatim
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_json::Value>,
}

impl CdeRecord {
    /// Placeholder record for a newly allocated id
    pub fn placeholder(id: String, structure_id: StructuralIndex, label: String) -> Self {
        Self {
            id,
            structure_id,
            label,
            is_about: None,
            measure_of: None,
            datum_type: None,
            has_unit: None,
            extra: IndexMap::new(),
        }
    }

    /// Numeric value of the id, if it is well formed
    pub fn numeric_id(&self) -> Option<u64> {
        self.id.parse().ok()
    }
}

/// One parsed row of a KWYK stats table
#[derive(Debug, Clone, PartialEq)]
pub struct StatsRow {
    pub label: String,
    pub kwyk_index: StructuralIndex,
    /// Voxel count, verbatim from the table
    pub number_voxels: String,
    /// Volume in mm^3, verbatim from the table
    pub vol_inmm3: String,
}

impl StatsRow {
    /// Raw value reported for a measure
    pub fn value_of(&self, measure: Measure) -> &str {
        match measure {
            Measure::NumberVoxels => &self.number_voxels,
            Measure::VolInMm3 => &self.vol_inmm3,
        }
    }
}

/// A measured value bound to its CDE id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Measurement {
    pub cde_id: String,
    pub value: String,
}

impl Measurement {
    pub fn new(cde_id: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            cde_id: cde_id.into(),
            value: value.into(),
        }
    }

    pub fn as_pair(&self) -> (&str, &str) {
        (&self.cde_id, &self.value)
    }

    /// Whether the value should be typed as a float rather than an integer
    pub fn is_float(&self) -> bool {
        self.value.parse::<i64>().is_err()
    }
}
