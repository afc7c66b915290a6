//! CLI command logic - extracted for testability
//!
//! `main.rs` parses arguments and prints status; the conversion run itself
//! lives here.

use crate::config::Kwyk2NidmConfig;
use crate::graph::{self, TurtleWriter};
use crate::mapping::{self, MappingStore, MergeReport};
use crate::provenance::ProvDocument;
use crate::registry::RegistryStore;
use crate::stats;
use anyhow::Context;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Options for one conversion run, after config and flags are combined
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertOptions {
    pub stats_file: PathBuf,
    pub outfile: Option<PathBuf>,
    pub gen_nidm: bool,
    pub strict: bool,
    pub merge_mapping: bool,
    pub restrict: bool,
}

impl ConvertOptions {
    pub fn new(stats_file: impl Into<PathBuf>) -> Self {
        Self {
            stats_file: stats_file.into(),
            outfile: None,
            gen_nidm: false,
            strict: true,
            merge_mapping: false,
            restrict: false,
        }
    }
}

/// What a conversion run produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertSummary {
    pub measurements: usize,
    pub outfile: PathBuf,
    pub registry_saved: bool,
    pub merge: Option<MergeReport>,
    pub cde_graph: Option<PathBuf>,
}

/// Default output name: the stats file name with `.ttl` appended, in the
/// working directory
pub fn default_outfile(stats_file: &Path) -> PathBuf {
    let name = stats_file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "kwyk".to_string());
    PathBuf::from(format!("{}.ttl", name))
}

// ============================================================================
// Conversion
// ============================================================================

/// Run the full conversion: optional merge, stats resolution, provenance
/// document, and optional CDE graph.
///
/// A strict-mode failure leaves the registry file untouched.
pub fn run_conversion(
    config: &Kwyk2NidmConfig,
    options: &ConvertOptions,
) -> anyhow::Result<ConvertSummary> {
    let registry_store = RegistryStore::new(&config.registry.cde_file);
    let mut registry = registry_store
        .load()
        .with_context(|| format!("Failed to load CDE registry {}", registry_store.path().display()))?;

    let merge = if options.merge_mapping {
        Some(merge_mapping(config, &registry_store, &mut registry)?)
    } else {
        None
    };

    let (measurements, _) =
        stats::read_kwyk_stats(&options.stats_file, &mut registry, options.strict).with_context(
            || format!("Failed to convert {}", options.stats_file.display()),
        )?;

    let registry_saved = registry_store
        .save_if_dirty(&mut registry)
        .context("Failed to save CDE registry")?;

    let outfile = options
        .outfile
        .clone()
        .unwrap_or_else(|| default_outfile(&options.stats_file));
    let document = ProvDocument::for_stats_file(
        &measurements,
        &options.stats_file,
        &config.agent.software_agent(),
    )?;
    let writer = TurtleWriter::new();
    writer
        .write_file(&document.graph, &outfile)
        .with_context(|| format!("Failed to write {}", outfile.display()))?;

    let cde_graph = if options.gen_nidm {
        let restrict_to: Option<HashSet<String>> = options
            .restrict
            .then(|| measurements.iter().map(|m| m.cde_id.clone()).collect());
        let graph = graph::project(&registry, restrict_to.as_ref())?;
        let path = config.output.cde_graph_file.clone();
        writer
            .write_file(&graph, &path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Some(path)
    } else {
        None
    };

    Ok(ConvertSummary {
        measurements: measurements.len(),
        outfile,
        registry_saved,
        merge,
        cde_graph,
    })
}

/// Merge the ontology mapping into the registry and write both back
fn merge_mapping(
    config: &Kwyk2NidmConfig,
    registry_store: &RegistryStore,
    registry: &mut crate::registry::CdeRegistry,
) -> anyhow::Result<MergeReport> {
    let mapping_store = MappingStore::new(&config.registry.map_file);
    let mut ontology = mapping_store
        .load()
        .with_context(|| format!("Failed to load mapping {}", mapping_store.path().display()))?;

    let report = mapping::merge(&mut ontology, registry);
    if report.structures_added + report.measures_added > 0 {
        warn!(
            "Mapping has {} new structures and {} new measures awaiting curation",
            report.structures_added, report.measures_added
        );
    }

    mapping_store.save(&ontology)?;
    registry_store.save(registry)?;
    info!("Registry merged with mapping {}", mapping_store.path().display());
    Ok(report)
}
