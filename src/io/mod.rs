//! CSV import and export of report rows.
//!
//! # Architecture
//!
//! - **Format adapter** ([`formats::csv`]) reads and writes header and rows
//! - **Normalizer** ([`normalize`]) coerces CSV cells into typed values
//! - **Services** orchestrate the adapter, the normalizer and the store
//!
//! # Examples
//!
//! ## Export one hour of every kind
//!
//! ```rust,ignore
//! use footfall::io::{ExportService, TimeWindow};
//!
//! let window = TimeWindow::parse("2024-03-01", Some(9))?;
//! for result in ExportService::new(&store).export_all("out".as_ref(), &window)? {
//!     println!("{}: {} rows", result.kind, result.exported);
//! }
//! ```
//!
//! ## Import with a custom bulk size
//!
//! ```rust,ignore
//! use footfall::io::{ImportOptions, ImportService};
//!
//! let service = ImportService::new(&store)
//!     .with_options(ImportOptions::default().with_bulk_size(500));
//! let results = service.import_all("out".as_ref())?;
//! ```

pub mod formats;
pub mod normalize;
pub mod services;

// Re-exports for convenience
pub use crate::models::TimeWindow;
pub use formats::csv::{CsvExportSink, CsvImportSource, CsvRow};
pub use normalize::{Normalized, RowNormalizer, parse_csv_timestamp};
pub use services::export::{ExportResult, ExportService};
pub use services::import::{DEFAULT_BULK_SIZE, ImportOptions, ImportResult, ImportService, ParsedRows};
