//! Error types for the data-loader crate.
//!
//! Loading happens once at startup from local files, so none of these are
//! retried. The caller decides whether a failure is fatal.

use thiserror::Error;

/// Errors that can occur while loading the catalog or the similarity matrix
#[derive(Error, Debug)]
pub enum DataLoadError {
    /// File could not be found or opened
    #[error("Failed to open file: {path}")]
    FileNotFound { path: String },

    /// I/O error occurred while reading file
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// A record in a data file couldn't be parsed
    ///
    /// `line` is 1-based and points at the first line of the record.
    #[error("Parse error at line {line} in {file}: {reason}")]
    ParseError {
        file: String,
        line: usize,
        reason: String,
    },

    /// A data field had an invalid value
    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    /// A matrix row has the wrong number of columns
    #[error("Expected {expected} fields but found {found} in line {line}")]
    FieldCountMismatch {
        expected: usize,
        found: usize,
        line: usize,
    },

    /// The header row is missing a required column
    #[error("Missing column '{column}' in {file}")]
    MissingColumn { file: String, column: String },

    /// The JSON matrix could not be decoded
    #[error("Malformed JSON in {file}: {source}")]
    Json {
        file: String,
        #[source]
        source: serde_json::Error,
    },

    /// Catalog and matrix disagree on the number of movies
    #[error("Catalog has {catalog} movies but similarity matrix is {matrix}x{matrix}")]
    DimensionMismatch { catalog: usize, matrix: usize },

    /// Data validation failed
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, DataLoadError>;
