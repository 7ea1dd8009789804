//! Report import service.
//!
//! Reads one CSV file per record kind, normalizes every row, then appends the
//! rows to the store in batches inside a single transaction per file.

use super::export::PROGRESS_INTERVAL;
use crate::io::formats::csv::CsvImportSource;
use crate::io::normalize::RowNormalizer;
use crate::models::{Record, ReportKind};
use crate::storage::ReportStore;
use crate::{Error, Result};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Rows per bulk insert statement unless configured otherwise.
pub const DEFAULT_BULK_SIZE: usize = 100;

/// Options for report import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportOptions {
    /// Rows per bulk insert statement. Must be at least 1.
    pub bulk_size: usize,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            bulk_size: DEFAULT_BULK_SIZE,
        }
    }
}

impl ImportOptions {
    /// Sets the bulk size.
    #[must_use]
    pub const fn with_bulk_size(mut self, bulk_size: usize) -> Self {
        self.bulk_size = bulk_size;
        self
    }
}

/// Rows parsed from one CSV file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedRows {
    /// Normalized records, in file order.
    pub records: Vec<Record>,
    /// Timestamp cells that could not be parsed and were read as NULL.
    pub lenient_timestamps: usize,
}

/// Result of importing one record kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportResult {
    /// Record kind imported.
    pub kind: ReportKind,
    /// Rows inserted.
    pub rows: usize,
    /// Bulk insert statements executed.
    pub batches: usize,
    /// Timestamp cells that could not be parsed and were stored as NULL.
    pub lenient_timestamps: usize,
}

/// Service for importing report rows from CSV.
pub struct ImportService<'a> {
    store: &'a dyn ReportStore,
    options: ImportOptions,
}

impl<'a> ImportService<'a> {
    /// Creates a new import service with default options.
    #[must_use]
    pub fn new(store: &'a dyn ReportStore) -> Self {
        Self {
            store,
            options: ImportOptions::default(),
        }
    }

    /// Replaces the import options.
    #[must_use]
    pub const fn with_options(mut self, options: ImportOptions) -> Self {
        self.options = options;
        self
    }

    /// Imports every record kind from the fixed-name files in `dir`.
    ///
    /// Files are imported in [`ReportKind::ALL`] order, each in its own
    /// transaction. The first failure stops the batch; files already imported
    /// stay committed.
    ///
    /// # Errors
    ///
    /// Returns an error if any file is missing or fails to import.
    pub fn import_all(&self, dir: &Path) -> Result<Vec<ImportResult>> {
        ReportKind::ALL
            .iter()
            .map(|&kind| self.import_from_file(kind, &dir.join(kind.file_name())))
            .collect()
    }

    /// Imports one record kind from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, a row cannot be
    /// normalized, or the insert fails.
    pub fn import_from_file(&self, kind: ReportKind, path: &Path) -> Result<ImportResult> {
        tracing::info!(kind = %kind, path = %path.display(), "reading {}", path.display());

        let file = File::open(path).map_err(|e| Error::OperationFailed {
            operation: "open_import_file".to_string(),
            cause: format!("{}: {e}", path.display()),
        })?;
        self.import_from_reader(kind, BufReader::new(file))
    }

    /// Imports one record kind from a reader.
    ///
    /// Nothing is written unless every row normalizes; if any batch fails the
    /// whole file is rolled back.
    ///
    /// # Errors
    ///
    /// Returns an error if the bulk size is zero, a row cannot be normalized,
    /// or the insert fails.
    pub fn import_from_reader<R: Read>(&self, kind: ReportKind, reader: R) -> Result<ImportResult> {
        let bulk_size = self.options.bulk_size;
        if bulk_size == 0 {
            return Err(Error::InvalidInput(
                "bulk size must be at least 1".to_string(),
            ));
        }

        let parsed = Self::read_records(kind, reader)?;
        if parsed.lenient_timestamps > 0 {
            tracing::warn!(
                kind = %kind,
                cells = parsed.lenient_timestamps,
                "{} timestamp cells could not be parsed and will be stored as NULL",
                parsed.lenient_timestamps
            );
        }

        let summary = self
            .store
            .insert_batches(kind, &parsed.records, bulk_size)?;

        metrics::counter!("rows_imported_total", "kind" => kind.as_str())
            .increment(summary.rows as u64);
        tracing::info!(
            kind = %kind,
            rows = summary.rows,
            batches = summary.batches,
            "{} done",
            summary.rows
        );

        Ok(ImportResult {
            kind,
            rows: summary.rows,
            batches: summary.batches,
            lenient_timestamps: parsed.lenient_timestamps,
        })
    }

    /// Reads and normalizes every row of a CSV file without touching the
    /// store.
    ///
    /// # Errors
    ///
    /// Returns an error if the CSV is malformed or a row cannot be normalized.
    pub fn read_records<R: Read>(kind: ReportKind, reader: R) -> Result<ParsedRows> {
        let mut source = CsvImportSource::new(reader, kind)?;
        let normalizer = RowNormalizer::new(kind, source.columns());
        let mut parsed = ParsedRows::default();

        while let Some(row) = source.next_row()? {
            let normalized = normalizer.normalize(&row)?;
            let count = parsed.records.len() as u64 + 1;
            if count % PROGRESS_INTERVAL == 1 {
                tracing::debug!(
                    kind = %kind,
                    row = count,
                    id = normalized.record.id().unwrap_or_default(),
                    time = ?normalized.record.time(),
                    "parsed row"
                );
            }
            parsed.lenient_timestamps += normalized.lenient_timestamps;
            parsed.records.push(normalized.record);
        }

        Ok(parsed)
    }
}
