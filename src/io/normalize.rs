//! Coercion of CSV cells into typed field values.
//!
//! Timestamp cells are parsed leniently: a cell that does not match
//! [`CSV_TIMESTAMP_FORMAT`](crate::models::CSV_TIMESTAMP_FORMAT) becomes NULL
//! and is counted rather than rejected. Integer cells are strict.

use super::formats::csv::CsvRow;
use crate::models::{Column, ColumnType, FieldValue, Record, ReportKind};
use crate::{Error, Result};
use chrono::NaiveDateTime;

/// Maximum fraction digits accepted after the seconds.
const MAX_FRACTION_DIGITS: usize = 6;

/// Parses `YYYY-MM-DD HH:MM:SS.ffffff`.
///
/// The fraction is mandatory and may have one to six digits.
///
/// # Examples
///
/// ```
/// use footfall::io::parse_csv_timestamp;
///
/// assert!(parse_csv_timestamp("2024-03-01 09:30:00.000000").is_some());
/// assert!(parse_csv_timestamp("2024-03-01 09:30:00.5").is_some());
/// assert!(parse_csv_timestamp("2024-03-01 09:30:00").is_none());
/// ```
#[must_use]
pub fn parse_csv_timestamp(text: &str) -> Option<NaiveDateTime> {
    let (_, fraction) = text.rsplit_once('.')?;
    if fraction.is_empty()
        || fraction.len() > MAX_FRACTION_DIGITS
        || !fraction.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f").ok()
}

/// Parses an `is_deleted` cell: only the literal `True` is true.
#[must_use]
pub fn parse_flag(text: &str) -> bool {
    text == "True"
}

/// Parses an integer cell, ignoring surrounding whitespace.
///
/// # Errors
///
/// Returns [`Error::InvalidInteger`] if the cell is empty or not an `i64`.
pub fn parse_integer(column: &str, text: &str, line: u64) -> Result<i64> {
    text.trim()
        .parse::<i64>()
        .map_err(|_| Error::InvalidInteger {
            column: column.to_string(),
            value: text.to_string(),
            line,
        })
}

/// A normalized row.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    /// The typed record.
    pub record: Record,
    /// Timestamp cells that held text but could not be parsed.
    pub lenient_timestamps: usize,
}

/// Converts rows of one CSV file into records.
///
/// Every row of a file produces the same columns in catalog order: the
/// header's columns, plus NULL timestamps for any timestamp column the header
/// lacks. A row shorter than the header leaves its missing cells absent.
#[derive(Debug, Clone)]
pub struct RowNormalizer {
    kind: ReportKind,
    /// Catalog columns paired with their index in the header, if present.
    layout: Vec<(&'static Column, Option<usize>)>,
}

impl RowNormalizer {
    /// Creates a normalizer for a file with the given header columns.
    #[must_use]
    pub fn new(kind: ReportKind, header: &[&'static Column]) -> Self {
        let layout = kind
            .columns()
            .iter()
            .map(|column| {
                let idx = header.iter().position(|h| h.name == column.name);
                (column, idx)
            })
            .filter(|(column, idx)| idx.is_some() || column.is_timestamp())
            .collect();
        Self { kind, layout }
    }

    /// Normalizes one row.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInteger`] if an integer cell cannot be parsed.
    pub fn normalize(&self, row: &CsvRow) -> Result<Normalized> {
        let mut record = Record::new(self.kind);
        let mut lenient_timestamps = 0;

        for &(column, idx) in &self.layout {
            let cell = idx.and_then(|i| row.cells.get(i));
            let value = match (column.ty, cell) {
                (ColumnType::Timestamp, None) => FieldValue::Null,
                (ColumnType::Timestamp, Some(text)) => match parse_csv_timestamp(text) {
                    Some(time) => FieldValue::Timestamp(time),
                    None => {
                        if !text.is_empty() {
                            lenient_timestamps += 1;
                        }
                        FieldValue::Null
                    },
                },
                (_, None) => continue,
                (ColumnType::Boolean, Some(text)) => FieldValue::Boolean(parse_flag(text)),
                (ColumnType::Integer, Some(text)) => {
                    FieldValue::Integer(parse_integer(column.name, text, row.line)?)
                },
                (ColumnType::Text | ColumnType::ForeignKey, Some(text)) => {
                    FieldValue::Text(text.clone())
                },
            };
            record.push(column, value);
        }

        Ok(Normalized {
            record,
            lenient_timestamps,
        })
    }
}
