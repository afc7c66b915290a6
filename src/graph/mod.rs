//! RDF output
//!
//! Projection of the CDE registry into an ontology-linked graph, the shared
//! namespaces, and Turtle serialization.

pub mod namespaces;
mod projector;
mod turtle;

pub use projector::{cde_subject, project, GraphProjector};
pub use turtle::TurtleWriter;
