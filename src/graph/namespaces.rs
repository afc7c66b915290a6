//! Vocabulary namespaces used in emitted graphs

use crate::errors::{CdeError, CdeResult};
use oxrdf::NamedNode;

/// A prefix bound to a namespace IRI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Namespace {
    prefix: &'static str,
    iri: &'static str,
}

impl Namespace {
    pub const fn new(prefix: &'static str, iri: &'static str) -> Self {
        Self { prefix, iri }
    }

    pub fn prefix(&self) -> &'static str {
        self.prefix
    }

    pub fn iri(&self) -> &'static str {
        self.iri
    }

    /// Term for a local name known to be IRI-safe
    pub fn term(&self, local: &str) -> NamedNode {
        NamedNode::new_unchecked(format!("{}{}", self.iri, local))
    }

    /// Term for an arbitrary local name, validating the resulting IRI
    pub fn try_term(&self, local: &str) -> CdeResult<NamedNode> {
        let iri = format!("{}{}", self.iri, local);
        NamedNode::new(iri.clone()).map_err(|e| CdeError::InvalidIri {
            value: iri,
            reason: e.to_string(),
        })
    }
}

pub const KWYK: Namespace = Namespace::new("kwyk", "http://purl.org/nidash/kwyk#");
pub const NIDM: Namespace = Namespace::new("nidm", "http://purl.org/nidash/nidm#");
pub const NIIRI: Namespace = Namespace::new("niiri", "http://iri.nidash.org/");
pub const PROV: Namespace = Namespace::new("prov", "http://www.w3.org/ns/prov#");
pub const CRYPTO: Namespace = Namespace::new(
    "crypto",
    "http://id.loc.gov/vocabulary/preservation/cryptographicHashFunctions#",
);
pub const UBERON: Namespace = Namespace::new("uberon", "http://purl.obolibrary.org/obo/UBERON_");
pub const ILX: Namespace = Namespace::new("ilx", "http://uri.interlex.org/base/ilx_");
pub const RDF: Namespace = Namespace::new("rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#");
pub const RDFS: Namespace = Namespace::new("rdfs", "http://www.w3.org/2000/01/rdf-schema#");
pub const XSD: Namespace = Namespace::new("xsd", "http://www.w3.org/2001/XMLSchema#");

/// Prefixes bound in every document this crate writes
pub fn standard_namespaces() -> [Namespace; 10] {
    [KWYK, NIDM, NIIRI, PROV, CRYPTO, UBERON, ILX, RDF, RDFS, XSD]
}

/// Parse an annotation value that must be an IRI
pub fn parse_iri(value: &str) -> CdeResult<NamedNode> {
    NamedNode::new(value).map_err(|e| CdeError::InvalidIri {
        value: value.to_string(),
        reason: e.to_string(),
    })
}
