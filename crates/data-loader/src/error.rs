//! Error types for the data-loader crate.
//!
//! Three families live here:
//! - [`DataLoadError`]: the catalog snapshot could not be read or is
//!   structurally broken. Fatal to loading.
//! - [`StoreError`]: the content store could not answer a read. Fatal to
//!   whatever run issued the read.
//! - [`DataIntegrityError`]: one record is bad (rating out of range, foreign
//!   key pointing nowhere). Readers report these and carry on.

use crate::types::{ContentRef, RatingValue};
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur while loading and parsing a catalog snapshot
#[derive(Error, Debug)]
pub enum DataLoadError {
    /// File could not be found or opened
    #[error("Failed to open file: {path}")]
    FileNotFound { path: String },

    /// I/O error occurred while reading file
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Line in data file couldn't be parsed
    #[error("Parse error at line {line} in {file}: {reason}")]
    ParseError {
        file: String,
        line: usize,
        reason: String,
    },

    /// A data field had an invalid value
    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    /// Two records claim the same slot, e.g. two episode 3s in one season
    #[error("Duplicate {what}: {key}")]
    DuplicateKey { what: String, key: String },
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, DataLoadError>;

/// Failure of the content store itself.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("content store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// A single bad record found while reading.
///
/// Never fatal: whoever hits one records it and skips the affected unit.
#[derive(Error, Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataIntegrityError {
    #[error("rating {value} on {content} is outside 1..=5")]
    RatingOutOfRange {
        content: ContentRef,
        value: RatingValue,
    },

    #[error("{referenced_by} references missing {entity} {id}")]
    DanglingReference {
        entity: &'static str,
        id: u32,
        referenced_by: String,
    },
}

impl DataIntegrityError {
    pub fn dangling(entity: &'static str, id: u32, referenced_by: impl ToString) -> Self {
        DataIntegrityError::DanglingReference {
            entity,
            id,
            referenced_by: referenced_by.to_string(),
        }
    }
}
