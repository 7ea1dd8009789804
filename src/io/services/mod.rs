//! Import and export service implementations.
//!
//! Orchestrates CSV parsing, normalization and storage operations.

pub mod export;
pub mod import;

pub use export::{ExportResult, ExportService};
pub use import::{ImportOptions, ImportResult, ImportService};
