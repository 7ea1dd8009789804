//! Field values and records exchanged between the store and CSV files.

use super::kind::{Column, ReportKind};
use chrono::NaiveDateTime;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::borrow::Cow;

/// Timestamp text written to CSV cells. Always carries six fraction digits so
/// the importer's fixed-format parse accepts it.
pub const CSV_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// A single scalar cell.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// No value (SQL NULL, empty CSV cell).
    Null,
    /// Text.
    Text(String),
    /// Integer.
    Integer(i64),
    /// Floating point, only ever read through from the store.
    Real(f64),
    /// Boolean flag.
    Boolean(bool),
    /// Naive timestamp.
    Timestamp(NaiveDateTime),
}

impl FieldValue {
    /// Returns true for [`FieldValue::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the text payload, if any.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the timestamp payload, if any.
    #[must_use]
    pub const fn as_timestamp(&self) -> Option<&NaiveDateTime> {
        match self {
            Self::Timestamp(t) => Some(t),
            _ => None,
        }
    }

    /// Renders the value as a CSV cell.
    ///
    /// Booleans become `True`/`False`, timestamps use
    /// [`CSV_TIMESTAMP_FORMAT`], and NULL becomes an empty cell.
    #[must_use]
    pub fn to_csv_cell(&self) -> Cow<'_, str> {
        match self {
            Self::Null => Cow::Borrowed(""),
            Self::Text(s) => Cow::Borrowed(s),
            Self::Integer(i) => Cow::Owned(i.to_string()),
            Self::Real(r) => Cow::Owned(r.to_string()),
            Self::Boolean(true) => Cow::Borrowed("True"),
            Self::Boolean(false) => Cow::Borrowed("False"),
            Self::Timestamp(t) => Cow::Owned(t.format(CSV_TIMESTAMP_FORMAT).to_string()),
        }
    }
}

// JSON form is only used for log previews; timestamps use ISO-8601 with a `T`.
impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_none(),
            Self::Text(s) => serializer.serialize_str(s),
            Self::Integer(i) => serializer.serialize_i64(*i),
            Self::Real(r) => serializer.serialize_f64(*r),
            Self::Boolean(b) => serializer.serialize_bool(*b),
            Self::Timestamp(t) => {
                serializer.collect_str(&t.format("%Y-%m-%dT%H:%M:%S%.f"))
            },
        }
    }
}

/// A column paired with its value.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Column metadata.
    pub column: &'static Column,
    /// Cell value.
    pub value: FieldValue,
}

/// One row of a report table.
///
/// Fields keep the order in which they were added; both the store and the CSV
/// reader add them in catalog order.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    kind: ReportKind,
    fields: Vec<Field>,
}

impl Record {
    /// Creates an empty record of the given kind.
    #[must_use]
    pub fn new(kind: ReportKind) -> Self {
        Self {
            kind,
            fields: Vec::with_capacity(kind.columns().len()),
        }
    }

    /// Appends a field.
    pub fn push(&mut self, column: &'static Column, value: FieldValue) {
        self.fields.push(Field { column, value });
    }

    /// Sets a field by CSV column name, replacing any existing value.
    ///
    /// Returns false if the kind has no such column.
    pub fn set(&mut self, name: &str, value: FieldValue) -> bool {
        let Some(column) = self.kind.column(name) else {
            return false;
        };
        if let Some(field) = self.fields.iter_mut().find(|f| f.column.name == name) {
            field.value = value;
        } else {
            self.push(column, value);
        }
        true
    }

    /// Builder form of [`Record::set`].
    #[must_use]
    pub fn with(mut self, name: &str, value: FieldValue) -> Self {
        self.set(name, value);
        self
    }

    /// Record kind.
    #[must_use]
    pub const fn kind(&self) -> ReportKind {
        self.kind
    }

    /// All fields in insertion order.
    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Value of a column by CSV name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|f| f.column.name == name)
            .map(|f| &f.value)
    }

    /// The `id` text, if present.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.get("id").and_then(FieldValue::as_text)
    }

    /// The `time` timestamp, if present and typed.
    #[must_use]
    pub fn time(&self) -> Option<&NaiveDateTime> {
        self.get("time").and_then(FieldValue::as_timestamp)
    }

    /// Returns true if both records carry the same columns in the same order.
    #[must_use]
    pub fn same_shape(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.fields.len() == other.fields.len()
            && self
                .fields
                .iter()
                .zip(&other.fields)
                .all(|(a, b)| a.column.name == b.column.name)
    }

    /// Cells in the kind's CSV header order; missing columns render empty.
    pub fn csv_cells(&self) -> impl Iterator<Item = Cow<'_, str>> {
        self.kind.columns().iter().map(|column| {
            self.get(column.name)
                .map_or(Cow::Borrowed(""), FieldValue::to_csv_cell)
        })
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for field in &self.fields {
            map.serialize_entry(field.column.name, &field.value)?;
        }
        map.end()
    }
}
