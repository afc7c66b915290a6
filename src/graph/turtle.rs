//! Turtle serialization
//!
//! Thin wrapper over `oxttl` with the standard prefix table bound. Triples
//! are sorted before serialization so the same graph always produces the
//! same text, with each subject's triples grouped and `rdf:type` first.

use super::namespaces::{standard_namespaces, Namespace, RDF};
use crate::errors::{CdeError, CdeResult};
use crate::persist;
use oxrdf::{Graph, TripleRef};
use oxttl::TurtleSerializer;
use std::io;
use std::path::Path;
use tracing::info;

/// Turtle writer with a prefix table
#[derive(Debug, Clone)]
pub struct TurtleWriter {
    prefixes: Vec<Namespace>,
}

impl Default for TurtleWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl TurtleWriter {
    /// Writer bound to the standard namespaces
    pub fn new() -> Self {
        Self {
            prefixes: standard_namespaces().to_vec(),
        }
    }

    /// Writer with no prefixes, every IRI written in full
    pub fn bare() -> Self {
        Self {
            prefixes: Vec::new(),
        }
    }

    pub fn with_namespace(mut self, ns: Namespace) -> Self {
        self.prefixes.retain(|p| p.prefix() != ns.prefix());
        self.prefixes.push(ns);
        self
    }

    /// Serialize a graph to a Turtle string
    pub fn serialize(&self, graph: &Graph) -> CdeResult<String> {
        let mut serializer = TurtleSerializer::new();
        for ns in &self.prefixes {
            serializer = serializer
                .with_prefix(ns.prefix(), ns.iri())
                .map_err(|e| CdeError::InvalidIri {
                    value: ns.iri().to_string(),
                    reason: e.to_string(),
                })?;
        }

        let mut writer = serializer.for_writer(Vec::new());
        for triple in sorted_triples(graph) {
            writer.serialize_triple(triple).map_err(CdeError::Turtle)?;
        }
        let bytes = writer.finish().map_err(CdeError::Turtle)?;

        String::from_utf8(bytes)
            .map_err(|e| CdeError::Turtle(io::Error::new(io::ErrorKind::InvalidData, e)))
    }

    /// Serialize and atomically write a graph to `path`
    pub fn write_file(&self, graph: &Graph, path: &Path) -> CdeResult<()> {
        persist::write_atomic(path, self.serialize(graph)?.as_bytes())?;
        info!("Wrote {} triples to {}", graph.len(), path.display());
        Ok(())
    }
}

/// Triples ordered by subject, then `rdf:type` before other predicates
fn sorted_triples(graph: &Graph) -> Vec<TripleRef<'_>> {
    let rdf_type = RDF.term("type");
    let mut triples: Vec<TripleRef<'_>> = graph.iter().collect();
    triples.sort_by_cached_key(|t| {
        (
            t.subject.to_string(),
            t.predicate != rdf_type.as_ref(),
            t.predicate.as_str().to_string(),
            t.object.to_string(),
        )
    });
    triples
}
