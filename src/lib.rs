// Library exports for the KWYK to NIDM converter
pub mod cli;
pub mod config;
pub mod errors;
pub mod graph;
pub mod key;
pub mod mapping;
pub mod persist;
pub mod provenance;
pub mod registry;
pub mod stats;
pub mod types;

// Re-export key types for convenience
pub use config::Kwyk2NidmConfig;
pub use errors::{CdeError, CdeResult};
pub use graph::{project, GraphProjector, TurtleWriter};
pub use key::CdeKey;
pub use mapping::{merge, MappingStore, MergeReport, OntologyMapping};
pub use provenance::{ProvDocument, SoftwareAgent};
pub use registry::{CdeRegistry, RegistryStore};
pub use stats::read_kwyk_stats;
pub use types::{CdeRecord, Measure, Measurement, StatsRow, StructuralIndex, Unit};
