//! # Storage Error Types
//!
//! Error types for flat-file operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  std::io::Error / csv::Error / serde_json::Error                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  StoreError (this module) ← Adds the file path and categorization      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  AppError (in console) ← Error code + exit status                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Terminal shows a one-line message                                     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::path::{Path, PathBuf};

use tally_core::{CoreError, ValidationError};
use thiserror::Error;

/// Storage operation errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Entity not found in its table.
    ///
    /// ## When This Occurs
    /// - Product or customer id doesn't exist
    /// - `set_stock`, `update` or `remove` on a missing product
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Id uniqueness violation on write.
    #[error("Duplicate {field}: '{value}' already exists")]
    Duplicate { field: String, value: String },

    /// A data row's field count disagrees with the header.
    ///
    /// Only raised by strict reads; lenient reads skip the row with a warning.
    #[error("Malformed record in {} at line {line}: expected {expected} fields, found {found}", path.display())]
    MalformedRecord {
        path: PathBuf,
        line: u64,
        expected: usize,
        found: usize,
    },

    /// File read or write failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// CSV encoding or decoding failed.
    #[error("CSV error in {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// A saved checkout progress file could not be encoded or decoded.
    #[error("JSON error in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Another writer holds the table lock.
    ///
    /// ## When This Occurs
    /// - A second `tally` process is writing the same table
    /// - A crashed process left `<table>.lock` behind (delete it by hand)
    #[error("{} is locked by another writer", path.display())]
    Locked { path: PathBuf },

    /// Login failed. Deliberately does not say which part was wrong.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Business rule violation.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Field validation failure.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl StoreError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        StoreError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates a Duplicate error.
    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        StoreError::Duplicate {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Adapter for `map_err` that attaches `path` to an I/O error.
    pub fn io(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
        move |source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Adapter for `map_err` that attaches `path` to a JSON error.
    pub fn json(path: &Path) -> impl FnOnce(serde_json::Error) -> StoreError + '_ {
        move |source| StoreError::Json {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Adapter for `map_err` that attaches `path` to a CSV error.
    pub fn csv(path: &Path) -> impl FnOnce(csv::Error) -> StoreError + '_ {
        move |source| StoreError::Csv {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Result type for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = StoreError::not_found("Product", "P404");
        assert_eq!(err.to_string(), "Product not found: P404");
    }

    #[test]
    fn test_core_errors_pass_through() {
        let err: StoreError = CoreError::EmptyCart.into();
        assert_eq!(err.to_string(), "Cart is empty");
    }

    #[test]
    fn test_malformed_record_message() {
        let err = StoreError::MalformedRecord {
            path: PathBuf::from("data/products.csv"),
            line: 3,
            expected: 4,
            found: 2,
        };
        assert_eq!(
            err.to_string(),
            "Malformed record in data/products.csv at line 3: expected 4 fields, found 2"
        );
    }
}
