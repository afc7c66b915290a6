//! NIDM provenance document for a converted stats file
//!
//! One conversion run is described as:
//!
//! - a `nidm:KWYKStatsCollection` entity carrying one `kwyk:kwyk_{id}`
//!   attribute per measurement,
//! - the source stats file as an entity identified by its SHA-512 digest,
//! - the conversion activity, associated with this tool as a software agent,
//! - a derivation from the source entity to the collection via the activity.

use crate::errors::{CdeError, CdeResult};
use crate::graph::namespaces::{CRYPTO, KWYK, NIDM, NIIRI, PROV, RDF, XSD};
use crate::types::Measurement;
use oxrdf::{BlankNode, Graph, Literal, NamedNode, Triple};
use sha2::{Digest, Sha512};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use uuid::Uuid;

/// Where this tool lives, recorded on the software agent
pub const DEFAULT_HOMEPAGE: &str = "https://github.com/ReproNim/kwyk2nidm";

/// Software agent description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoftwareAgent {
    pub homepage: String,
    pub version: String,
}

impl Default for SoftwareAgent {
    fn default() -> Self {
        Self {
            homepage: DEFAULT_HOMEPAGE.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Hex encoded SHA-512 digest of a file
pub fn sha512_file(path: &Path) -> CdeResult<String> {
    let file = File::open(path).map_err(|e| CdeError::io(path, e))?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha512::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = reader.read(&mut buf).map_err(|e| CdeError::io(path, e))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Mint a fresh `niiri:` identifier
fn new_niiri_id() -> NamedNode {
    NIIRI.term(&Uuid::new_v4().simple().to_string())
}

/// Typed literal for a measured value: integer if it parses as one, float otherwise
pub fn measurement_literal(measurement: &Measurement) -> Literal {
    let datatype = if measurement.is_float() { "float" } else { "integer" };
    Literal::new_typed_literal(measurement.value.as_str(), XSD.term(datatype))
}

/// A provenance document and the identifiers of its main nodes
#[derive(Debug, Clone)]
pub struct ProvDocument {
    pub graph: Graph,
    pub collection: NamedNode,
    pub source: NamedNode,
    pub activity: NamedNode,
    pub agent: NamedNode,
}

impl ProvDocument {
    /// Build the document for a set of measurements and the source digest
    pub fn build(measurements: &[Measurement], source_sha512: &str, agent: &SoftwareAgent) -> Self {
        let mut graph = Graph::new();
        let rdf_type = RDF.term("type");

        let collection = new_niiri_id();
        graph.insert(&Triple::new(collection.clone(), rdf_type.clone(), PROV.term("Entity")));
        graph.insert(&Triple::new(
            collection.clone(),
            rdf_type.clone(),
            NIDM.term("KWYKStatsCollection"),
        ));
        for measurement in measurements {
            graph.insert(&Triple::new(
                collection.clone(),
                KWYK.term(&format!("kwyk_{}", measurement.cde_id)),
                measurement_literal(measurement),
            ));
        }

        let source = new_niiri_id();
        graph.insert(&Triple::new(source.clone(), rdf_type.clone(), PROV.term("Entity")));
        graph.insert(&Triple::new(
            source.clone(),
            CRYPTO.term("sha512"),
            Literal::new_simple_literal(source_sha512),
        ));

        let activity = new_niiri_id();
        graph.insert(&Triple::new(activity.clone(), rdf_type.clone(), PROV.term("Activity")));

        let agent_id = new_niiri_id();
        graph.insert(&Triple::new(agent_id.clone(), rdf_type.clone(), PROV.term("Agent")));
        graph.insert(&Triple::new(
            agent_id.clone(),
            rdf_type.clone(),
            PROV.term("SoftwareAgent"),
        ));
        graph.insert(&Triple::new(
            agent_id.clone(),
            NIDM.term("NIDM_0000164"),
            Literal::new_typed_literal(agent.homepage.as_str(), XSD.term("anyURI")),
        ));
        graph.insert(&Triple::new(
            agent_id.clone(),
            NIDM.term("NIDM_0000122"),
            Literal::new_simple_literal(agent.version.as_str()),
        ));

        graph.insert(&Triple::new(
            activity.clone(),
            PROV.term("wasAssociatedWith"),
            agent_id.clone(),
        ));

        graph.insert(&Triple::new(
            collection.clone(),
            PROV.term("wasDerivedFrom"),
            source.clone(),
        ));
        let derivation = BlankNode::default();
        graph.insert(&Triple::new(
            collection.clone(),
            PROV.term("qualifiedDerivation"),
            derivation.clone(),
        ));
        graph.insert(&Triple::new(derivation.clone(), rdf_type, PROV.term("Derivation")));
        graph.insert(&Triple::new(derivation.clone(), PROV.term("entity"), source.clone()));
        graph.insert(&Triple::new(derivation, PROV.term("hadActivity"), activity.clone()));

        Self {
            graph,
            collection,
            source,
            activity,
            agent: agent_id,
        }
    }

    /// Build the document for a stats file on disk
    pub fn for_stats_file(
        measurements: &[Measurement],
        stats_file: &Path,
        agent: &SoftwareAgent,
    ) -> CdeResult<Self> {
        let digest = sha512_file(stats_file)?;
        Ok(Self::build(measurements, &digest, agent))
    }
}
