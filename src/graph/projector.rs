//! CDE registry → RDF graph projection
//!
//! Every registry record becomes a `kwyk:DataElement` node named
//! `kwyk:kwyk_{id}`. Projection is sparse: a field that is unset, or whose
//! value mentions `unknown`, produces no triple at all, so a missing triple
//! reads as "not mapped yet" rather than "mapped to nothing".

use super::namespaces::{parse_iri, KWYK, NIDM, RDF, RDFS, XSD};
use crate::errors::CdeResult;
use crate::key::CdeKey;
use crate::registry::CdeRegistry;
use crate::types::{CdeRecord, StructuralIndex};
use oxrdf::{Graph, Literal, NamedNode, Term, Triple};
use serde_json::Value;
use std::collections::HashSet;
use tracing::debug;

/// Substring marking a value as not yet resolved
const UNKNOWN_MARKER: &str = "unknown";

/// Fields whose values are IRIs in the NIDM vocabulary
const NIDM_REFERENCE_FIELDS: [&str; 3] = ["isAbout", "datumType", "measureOf"];

/// Subject node for a CDE id
pub fn cde_subject(id: &str) -> NamedNode {
    KWYK.term(&format!("kwyk_{}", id))
}

/// A record field as seen by the projector
enum FieldValue<'a> {
    Text(&'a str),
    Index(&'a StructuralIndex),
    Json(&'a Value),
}

impl FieldValue<'_> {
    /// Textual form used for the unknown check, `None` when unset
    fn text(&self) -> Option<String> {
        match self {
            FieldValue::Text(s) => Some((*s).to_string()),
            FieldValue::Index(idx) => Some(idx.to_string()),
            FieldValue::Json(Value::Null) => None,
            FieldValue::Json(Value::String(s)) => Some(s.clone()),
            FieldValue::Json(v) => match reference_of(v) {
                Some(iri) => Some(iri.to_string()),
                None => Some(v.to_string()),
            },
        }
    }

    /// Object term for the generic (non-vocabulary) rule
    fn generic_object(&self) -> CdeResult<Term> {
        let term: Term = match self {
            FieldValue::Text(s) => Literal::new_simple_literal(*s).into(),
            FieldValue::Index(StructuralIndex::Int(n)) => integer_literal(*n).into(),
            FieldValue::Index(StructuralIndex::Text(s)) => {
                Literal::new_simple_literal(s.as_str()).into()
            }
            FieldValue::Json(v) => match reference_of(v) {
                Some(iri) => parse_iri(iri)?.into(),
                None => json_literal(v).into(),
            },
        };
        Ok(term)
    }
}

/// A JSON-LD style `{"@id": "..."}` value is already a reference
fn reference_of(value: &Value) -> Option<&str> {
    value.as_object()?.get("@id")?.as_str()
}

fn integer_literal(n: i64) -> Literal {
    Literal::new_typed_literal(n.to_string(), XSD.term("integer"))
}

fn json_literal(value: &Value) -> Literal {
    match value {
        Value::String(s) => Literal::new_simple_literal(s.as_str()),
        Value::Bool(b) => Literal::new_typed_literal(b.to_string(), XSD.term("boolean")),
        Value::Number(n) if n.is_i64() || n.is_u64() => {
            Literal::new_typed_literal(n.to_string(), XSD.term("integer"))
        }
        Value::Number(n) => Literal::new_typed_literal(n.to_string(), XSD.term("double")),
        other => Literal::new_simple_literal(other.to_string()),
    }
}

/// Fields of a record in storage order, `id` excluded
fn record_fields(record: &CdeRecord) -> Vec<(&str, FieldValue<'_>)> {
    let mut fields = vec![
        ("structure_id", FieldValue::Index(&record.structure_id)),
        ("label", FieldValue::Text(&record.label)),
    ];
    let optional = [
        ("isAbout", &record.is_about),
        ("measureOf", &record.measure_of),
        ("datumType", &record.datum_type),
        ("hasUnit", &record.has_unit),
    ];
    for (name, value) in optional {
        if let Some(v) = value {
            fields.push((name, FieldValue::Text(v)));
        }
    }
    for (name, value) in &record.extra {
        fields.push((name.as_str(), FieldValue::Json(value)));
    }
    fields
}

/// Projects a CDE registry into an RDF graph
#[derive(Debug, Default, Clone, Copy)]
pub struct GraphProjector;

impl GraphProjector {
    pub fn new() -> Self {
        Self
    }

    /// Declaration that KWYK data elements are NIDM data elements
    pub fn class_declaration() -> Triple {
        Triple::new(
            KWYK.term("DataElement"),
            RDFS.term("subClassOf"),
            NIDM.term("DataElement"),
        )
    }

    /// Project the registry, optionally restricted to a set of ids
    pub fn project(
        &self,
        registry: &CdeRegistry,
        restrict_to: Option<&HashSet<String>>,
    ) -> CdeResult<Graph> {
        let mut graph = Graph::new();
        graph.insert(&Self::class_declaration());

        let mut projected = 0usize;
        for (key, record) in registry.iter() {
            if let Some(ids) = restrict_to {
                if !ids.contains(&record.id) {
                    continue;
                }
            }
            self.project_record(&mut graph, key, record)?;
            projected += 1;
        }

        debug!(
            "Projected {} of {} CDEs into {} triples",
            projected,
            registry.len(),
            graph.len()
        );
        Ok(graph)
    }

    fn project_record(&self, graph: &mut Graph, key: &CdeKey, record: &CdeRecord) -> CdeResult<()> {
        let subject = cde_subject(&record.id);
        graph.insert(&Triple::new(
            subject.clone(),
            RDF.term("type"),
            KWYK.term("DataElement"),
        ));

        for (field, value) in record_fields(record) {
            let text = match value.text() {
                Some(text) if !text.contains(UNKNOWN_MARKER) => text,
                _ => continue,
            };

            let triple = if NIDM_REFERENCE_FIELDS.contains(&field) {
                Triple::new(subject.clone(), NIDM.term(field), parse_iri(&text)?)
            } else if field == "hasUnit" {
                Triple::new(
                    subject.clone(),
                    NIDM.term(field),
                    Literal::new_simple_literal(text),
                )
            } else if field == "label" {
                Triple::new(
                    subject.clone(),
                    RDFS.term("label"),
                    Literal::new_simple_literal(text),
                )
            } else {
                Triple::new(subject.clone(), KWYK.try_term(field)?, value.generic_object()?)
            };
            graph.insert(&triple);
        }

        let components = [
            ("structure", key.structure.as_str()),
            ("measure", key.measure.as_str()),
            ("unit", key.unit.as_str()),
        ];
        for (name, value) in components {
            graph.insert(&Triple::new(
                subject.clone(),
                KWYK.term(name),
                Literal::new_simple_literal(value),
            ));
        }

        Ok(())
    }
}

/// Project the whole registry, or only the given ids
pub fn project(registry: &CdeRegistry, restrict_to: Option<&HashSet<String>>) -> CdeResult<Graph> {
    GraphProjector::new().project(registry, restrict_to)
}
