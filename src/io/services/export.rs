//! Report export service.
//!
//! Streams the rows of a time window from the store into one CSV file per
//! record kind.

use crate::io::formats::csv::CsvExportSink;
use crate::models::{Record, ReportKind, TimeWindow};
use crate::storage::ReportStore;
use crate::{Error, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::Level;

/// A progress line is logged for rows 1, 1001, 2001, ...
pub(crate) const PROGRESS_INTERVAL: u64 = 1000;

/// Characters of the JSON preview kept in progress lines.
const PREVIEW_CHARS: usize = 120;

/// Result of exporting one record kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportResult {
    /// Record kind exported.
    pub kind: ReportKind,
    /// Rows written to the file.
    pub exported: u64,
    /// Rows in the whole table at the end of the export.
    pub total_in_table: u64,
    /// Destination file, if the export went to a file.
    pub path: Option<PathBuf>,
}

/// Service for exporting report rows to CSV.
pub struct ExportService<'a> {
    store: &'a dyn ReportStore,
}

impl<'a> ExportService<'a> {
    /// Creates a new export service.
    #[must_use]
    pub const fn new(store: &'a dyn ReportStore) -> Self {
        Self { store }
    }

    /// Exports every record kind into `dir`, one fixed-name file per kind.
    ///
    /// The directory and its parents are created if needed. Kinds are written
    /// in [`ReportKind::ALL`] order; the first failure stops the batch and
    /// leaves earlier files in place.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or any export
    /// fails.
    pub fn export_all(&self, dir: &Path, window: &TimeWindow) -> Result<Vec<ExportResult>> {
        std::fs::create_dir_all(dir).map_err(|e| Error::OperationFailed {
            operation: "create_output_dir".to_string(),
            cause: format!("{}: {e}", dir.display()),
        })?;

        ReportKind::ALL
            .iter()
            .map(|&kind| self.export_to_file(kind, window, &dir.join(kind.file_name())))
            .collect()
    }

    /// Exports one record kind to a file, replacing any existing content.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or the export fails.
    pub fn export_to_file(
        &self,
        kind: ReportKind,
        window: &TimeWindow,
        path: &Path,
    ) -> Result<ExportResult> {
        tracing::info!(kind = %kind, window = %window, path = %path.display(), "exporting");

        let file = File::create(path).map_err(|e| Error::OperationFailed {
            operation: "create_export_file".to_string(),
            cause: format!("{}: {e}", path.display()),
        })?;

        let (mut result, writer) = self.export_rows(kind, window, BufWriter::new(file))?;
        writer
            .into_inner()
            .map_err(|e| Error::operation("flush_export_file", e.error()))?;

        result.path = Some(path.to_path_buf());
        Ok(result)
    }

    /// Exports one record kind to a writer.
    ///
    /// # Errors
    ///
    /// Returns an error if reading from the store or writing fails.
    pub fn export_to_writer<W: Write>(
        &self,
        kind: ReportKind,
        window: &TimeWindow,
        writer: W,
    ) -> Result<ExportResult> {
        self.export_rows(kind, window, writer)
            .map(|(result, _)| result)
    }

    fn export_rows<W: Write>(
        &self,
        kind: ReportKind,
        window: &TimeWindow,
        writer: W,
    ) -> Result<(ExportResult, W)> {
        let mut sink = CsvExportSink::new(writer, kind)?;
        let mut count = 0_u64;

        self.store.scan_window(kind, window, &mut |record| {
            count += 1;
            if count % PROGRESS_INTERVAL == 1 && tracing::enabled!(Level::DEBUG) {
                tracing::debug!(kind = %kind, row = count, "{}", preview(&record));
            }
            sink.write(&record)
        })?;

        let writer = sink.finalize()?;
        let total_in_table = self.store.count(kind)?;

        metrics::counter!("rows_exported_total", "kind" => kind.as_str()).increment(count);
        tracing::info!(
            kind = %kind,
            exported = count,
            total = total_in_table,
            "{count} exported. Total {total_in_table} records in the table"
        );

        Ok((
            ExportResult {
                kind,
                exported: count,
                total_in_table,
                path: None,
            },
            writer,
        ))
    }
}

/// JSON rendering of a record, cut to [`PREVIEW_CHARS`] characters.
fn preview(record: &Record) -> String {
    serde_json::to_string(record).map_or_else(
        |e| format!("<unrenderable record: {e}>"),
        |json| json.chars().take(PREVIEW_CHARS).collect(),
    )
}
