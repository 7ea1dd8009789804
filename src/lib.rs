//! # Footfall
//!
//! Moves shop footfall samples between a SQLite database owned by another
//! application and flat CSV files.
//!
//! Four record kinds are exchanged (heat-map, stay-map, flow and people
//! samples). Export selects the rows of one day, or one hour of a day, and
//! writes one CSV file per kind. Import reads the same files back, normalizes
//! the typed cells and appends the rows in batches inside one transaction per
//! file.
//!
//! ## Example
//!
//! ```rust,ignore
//! use footfall::io::{ExportService, TimeWindow};
//! use footfall::storage::SqliteStore;
//!
//! let store = SqliteStore::open("db.sqlite3")?;
//! let window = TimeWindow::parse("2024-03-01", Some(9))?;
//! let results = ExportService::new(&store).export_all("out".as_ref(), &window)?;
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

// Module declarations
pub mod config;
pub mod io;
pub mod models;
pub mod observability;
pub mod storage;

// Re-exports for convenience
pub use config::FootfallConfig;
pub use io::{ExportService, ImportService, TimeWindow};
pub use models::{FieldValue, Record, ReportKind};
pub use storage::{ReportStore, SqliteStore};

/// Error type for footfall operations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `InvalidInput` | Malformed date text, zero bulk size, unknown CSV header column |
/// | `InvalidInteger` | An integer column cell cannot be parsed during import |
/// | `OperationFailed` | I/O errors, CSV errors, SQLite errors, config parse errors |
#[derive(Debug, ThisError)]
pub enum Error {
    /// Invalid input was provided.
    ///
    /// Raised when:
    /// - The export date is not `YYYY-MM-DD`
    /// - The import bulk size is zero
    /// - A CSV header names a column the record kind does not have
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An integer column held text that is not an integer.
    ///
    /// Fatal for the whole file being imported.
    #[error("invalid integer in column '{column}' at line {line}: {value:?}")]
    InvalidInteger {
        /// Column name as it appears in the CSV header.
        column: String,
        /// The raw cell text.
        value: String,
        /// 1-based CSV line number (the header is line 1).
        line: u64,
    },

    /// An operation failed.
    ///
    /// Raised when:
    /// - `SQLite` statements fail (constraint violations, missing tables)
    /// - Filesystem I/O errors occur
    /// - CSV records cannot be read or written
    /// - The configuration file cannot be read or parsed
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },
}

impl Error {
    /// Builds an [`Error::OperationFailed`] from any displayable cause.
    pub fn operation(operation: impl Into<String>, cause: impl std::fmt::Display) -> Self {
        Self::OperationFailed {
            operation: operation.into(),
            cause: cause.to_string(),
        }
    }
}

/// Result type alias for footfall operations.
pub type Result<T> = std::result::Result<T, Error>;
