//! Conversion between `SQLite` values and [`FieldValue`]s.

use crate::models::{Column, ColumnType, FieldValue, Record, ReportKind};
use crate::{Error, Result};
use chrono::{NaiveDate, NaiveDateTime, Timelike};
use rusqlite::Row;
use rusqlite::types::{ToSql, ToSqlOutput, Value, ValueRef};

/// Text layouts the owning application may have stored timestamps in.
const STORE_TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Parses stored timestamp text, tolerating the layouts the owning
/// application and `SQLite` itself produce. A bare date means midnight.
#[must_use]
pub fn parse_store_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    STORE_TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Formats a timestamp the way the owning application stores it: microseconds
/// only when non-zero.
#[must_use]
pub fn format_store_timestamp(time: &NaiveDateTime) -> String {
    if time.nanosecond() == 0 {
        time.format("%Y-%m-%d %H:%M:%S").to_string()
    } else {
        time.format("%Y-%m-%d %H:%M:%S%.6f").to_string()
    }
}

/// Decodes one stored value according to the column's declared type.
///
/// Values that do not fit the declared type are passed through as they are
/// (text stays text) rather than rejected, so an export never loses a row.
#[allow(clippy::cast_precision_loss)]
pub fn decode_value(column: &Column, value: ValueRef<'_>) -> Result<FieldValue> {
    let decoded = match (column.ty, value) {
        (_, ValueRef::Null) => FieldValue::Null,
        (ColumnType::Timestamp, ValueRef::Text(bytes)) => {
            let text = utf8(column, bytes)?;
            parse_store_timestamp(text)
                .map_or_else(|| FieldValue::Text(text.to_string()), FieldValue::Timestamp)
        },
        (ColumnType::Boolean, ValueRef::Integer(i)) => FieldValue::Boolean(i != 0),
        (ColumnType::Boolean, ValueRef::Text(bytes)) => match utf8(column, bytes)? {
            "1" | "True" | "true" | "t" => FieldValue::Boolean(true),
            "0" | "False" | "false" | "f" => FieldValue::Boolean(false),
            other => FieldValue::Text(other.to_string()),
        },
        (ColumnType::Integer, ValueRef::Text(bytes)) => {
            let text = utf8(column, bytes)?;
            text.trim()
                .parse::<i64>()
                .map_or_else(|_| FieldValue::Text(text.to_string()), FieldValue::Integer)
        },
        (_, ValueRef::Integer(i)) => FieldValue::Integer(i),
        (_, ValueRef::Real(r)) => FieldValue::Real(r),
        (_, ValueRef::Text(bytes)) => FieldValue::Text(utf8(column, bytes)?.to_string()),
        (_, ValueRef::Blob(bytes)) => {
            FieldValue::Text(String::from_utf8_lossy(bytes).into_owned())
        },
    };
    Ok(decoded)
}

fn utf8<'a>(column: &Column, bytes: &'a [u8]) -> Result<&'a str> {
    std::str::from_utf8(bytes).map_err(|e| Error::OperationFailed {
        operation: "decode_column".to_string(),
        cause: format!("{}: {e}", column.db_name),
    })
}

/// Builds a record from a row selected with every catalog column, in catalog
/// order.
pub fn build_record_from_row(kind: ReportKind, row: &Row<'_>) -> Result<Record> {
    let mut record = Record::new(kind);
    for (idx, column) in kind.columns().iter().enumerate() {
        let raw = row.get_ref(idx).map_err(|e| Error::OperationFailed {
            operation: "read_column".to_string(),
            cause: format!("{}: {e}", column.db_name),
        })?;
        record.push(column, decode_value(column, raw)?);
    }
    Ok(record)
}

impl ToSql for FieldValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Self::Null => ToSqlOutput::Owned(Value::Null),
            Self::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Self::Integer(i) => ToSqlOutput::Owned(Value::Integer(*i)),
            Self::Real(r) => ToSqlOutput::Owned(Value::Real(*r)),
            Self::Boolean(b) => ToSqlOutput::Owned(Value::Integer(i64::from(*b))),
            Self::Timestamp(t) => ToSqlOutput::Owned(Value::Text(format_store_timestamp(t))),
        })
    }
}
