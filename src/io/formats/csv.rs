//! CSV adapter for report files.
//!
//! Files are comma-delimited with a header row and minimal quoting. The
//! column order on export is fixed per record kind; on import the header
//! decides which columns are present.

use crate::models::{Column, Record, ReportKind};
use crate::{Error, Result};
use std::borrow::Cow;
use std::io::{Read, Write};

/// One data row as read from a CSV file, cells aligned with the header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvRow {
    /// 1-based line number in the file (the header is line 1).
    pub line: u64,
    /// Cell text. Shorter than the header when trailing cells are missing.
    pub cells: Vec<String>,
}

/// CSV import source.
///
/// Reads the header once, checks every name against the record kind's
/// columns, then yields rows one at a time.
pub struct CsvImportSource<R: Read> {
    /// CSV reader.
    reader: csv::Reader<R>,
    /// Header columns, in file order.
    columns: Vec<&'static Column>,
    /// Record kind the file holds.
    kind: ReportKind,
}

impl<R: Read> CsvImportSource<R> {
    /// Creates a new CSV import source.
    ///
    /// An empty input has no header and yields no rows.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the header names a column the kind
    /// does not have, or names one twice.
    pub fn new(reader: R, kind: ReportKind) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // Short rows are allowed
            .from_reader(reader);

        let headers = csv_reader
            .headers()
            .map_err(|e| Error::operation("read_csv_headers", e))?;

        let mut columns: Vec<&'static Column> = Vec::with_capacity(headers.len());
        for name in headers {
            let column = kind.column(name).ok_or_else(|| {
                Error::InvalidInput(format!("unknown column '{name}' in {kind} CSV header"))
            })?;
            if columns.iter().any(|c| c.name == column.name) {
                return Err(Error::InvalidInput(format!(
                    "column '{name}' appears twice in {kind} CSV header"
                )));
            }
            columns.push(column);
        }

        Ok(Self {
            reader: csv_reader,
            columns,
            kind,
        })
    }

    /// Header columns, in file order.
    #[must_use]
    pub fn columns(&self) -> &[&'static Column] {
        &self.columns
    }

    /// Reads the next row.
    ///
    /// Returns `Ok(None)` when the file is exhausted.
    ///
    /// # Errors
    ///
    /// Returns an error if the CSV is malformed or a row has more cells than
    /// the header.
    pub fn next_row(&mut self) -> Result<Option<CsvRow>> {
        let mut record = csv::StringRecord::new();

        let has_record = self
            .reader
            .read_record(&mut record)
            .map_err(|e| Error::operation("read_csv", e))?;
        if !has_record {
            return Ok(None);
        }

        let line = record.position().map_or(0, csv::Position::line);
        if record.len() > self.columns.len() {
            return Err(Error::InvalidInput(format!(
                "{} CSV line {line} has {} cells but the header has {}",
                self.kind,
                record.len(),
                self.columns.len()
            )));
        }

        Ok(Some(CsvRow {
            line,
            cells: record.iter().map(String::from).collect(),
        }))
    }
}

/// CSV export sink.
///
/// Writes the kind's header on creation, so an empty export still produces a
/// file with a header row.
pub struct CsvExportSink<W: Write> {
    writer: csv::Writer<W>,
    kind: ReportKind,
}

impl<W: Write> CsvExportSink<W> {
    /// Creates a new CSV export sink and writes the header.
    ///
    /// # Errors
    ///
    /// Returns an error if the header cannot be written.
    pub fn new(writer: W, kind: ReportKind) -> Result<Self> {
        let mut csv_writer = csv::WriterBuilder::new()
            .has_headers(false) // We write headers manually
            .quote_style(csv::QuoteStyle::Necessary)
            .from_writer(writer);

        csv_writer
            .write_record(kind.header())
            .map_err(|e| Error::operation("write_csv_headers", e))?;

        Ok(Self {
            writer: csv_writer,
            kind,
        })
    }

    /// Writes one record in the kind's column order.
    ///
    /// # Errors
    ///
    /// Returns an error if the record is of another kind or cannot be written.
    pub fn write(&mut self, record: &Record) -> Result<()> {
        if record.kind() != self.kind {
            return Err(Error::InvalidInput(format!(
                "cannot write a {} record to a {} file",
                record.kind(),
                self.kind
            )));
        }

        self.writer
            .write_record(record.csv_cells().map(Cow::into_owned))
            .map_err(|e| Error::operation("write_csv", e))
    }

    /// Flushes the writer and hands back the underlying output.
    ///
    /// # Errors
    ///
    /// Returns an error if flushing fails.
    pub fn finalize(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| Error::operation("flush_csv", e.error()))
    }
}
