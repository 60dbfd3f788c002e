//! Error types for the data-loader crate.
//!
//! Every variant here is a startup failure: the snapshot is either loaded
//! whole and consistent, or the process refuses to serve.

use thiserror::Error;

/// Errors that can occur while loading and validating a similarity snapshot
#[derive(Error, Debug)]
pub enum DataLoadError {
    /// Artifact file could not be found
    #[error("Failed to open file: {path}")]
    FileNotFound { path: String },

    /// I/O error occurred while reading the artifact
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The artifact could not be deserialized
    #[error("Parse error in {file}: {reason}")]
    ParseError { file: String, reason: String },

    /// A field had an unusable value (e.g. a NaN similarity score)
    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    /// Matrix row count and catalog length disagree
    #[error("Similarity matrix has {rows} rows but the catalog has {records} movies")]
    ShapeMismatch { rows: usize, records: usize },

    /// A matrix row does not have one score per movie
    #[error("Similarity row {row} has {len} scores, expected {expected}")]
    NotSquare {
        row: usize,
        len: usize,
        expected: usize,
    },

    /// The id map points at something that doesn't exist
    #[error("Missing reference: {entity} with id {id}")]
    MissingReference { entity: String, id: u64 },

    /// Snapshot validation failed
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, DataLoadError>;
