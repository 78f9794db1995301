//! Error types for the catalog crate.
//!
//! Every failure while reading, writing or validating a dataset ends up
//! as one of these variants, so callers can match on what went wrong
//! instead of parsing strings.

use thiserror::Error;

/// Errors that can occur while loading, writing or querying catalog data
#[derive(Error, Debug)]
pub enum CatalogError {
    /// File could not be found or opened
    #[error("Failed to open file: {path}")]
    FileNotFound { path: String },

    /// I/O error occurred while reading or writing a file
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Line in a data file couldn't be parsed
    #[error("Parse error at line {line} in {file}: {reason}")]
    ParseError {
        file: String,
        line: usize,
        reason: String,
    },

    /// A data field had an invalid value
    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    /// Referenced entity doesn't exist (e.g., a transaction for an unknown item)
    #[error("Missing reference: {entity} with id {id}")]
    MissingReference { entity: String, id: u32 },

    /// The same serial id appears more than once in the catalog
    #[error("Duplicate {entity} id {id}")]
    DuplicateId { entity: String, id: u32 },

    /// Feature vectors in the catalog do not all share one length
    #[error("Feature length mismatch for item {serial_id}: expected {expected}, found {found}")]
    FeatureLengthMismatch {
        serial_id: u32,
        expected: usize,
        found: usize,
    },
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, CatalogError>;
