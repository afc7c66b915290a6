//! CDE registry errors
//!
//! Error types for the registry, mapping and conversion core.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the CDE registry and mapping engine
#[derive(Error, Debug)]
pub enum CdeError {
    /// Strict mode met a (structure, measure, unit) triple with no registry entry.
    /// The placeholder record has already been allocated in memory.
    #[error("Key {key} not found in KWYK data elements file (allocated placeholder {id})")]
    UnknownKey { key: String, id: String },

    #[error("Malformed CDE key {key:?}: {reason}")]
    MalformedKey { key: String, reason: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid registry count: {0}")]
    InvalidCount(String),

    #[error("Duplicate CDE id {id} for keys {first} and {second}")]
    DuplicateId {
        id: String,
        first: String,
        second: String,
    },

    #[error("Missing required column in stats table: {column}")]
    MissingColumn { column: String },

    #[error("Invalid stats row at line {line}: {reason}")]
    InvalidRow { line: usize, reason: String },

    #[error("Invalid IRI {value:?}: {reason}")]
    InvalidIri { value: String, reason: String },

    #[error("Turtle serialization failed: {0}")]
    Turtle(#[source] std::io::Error),
}

impl CdeError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CdeError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        CdeError::Json {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn malformed(key: &str, reason: impl Into<String>) -> Self {
        CdeError::MalformedKey {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result alias for the core
pub type CdeResult<T> = Result<T, CdeError>;
