//! Record kinds and their column catalog.
//!
//! The tables belong to the shop application that owns the database; this
//! module only documents the columns the CSV files carry and how each one is
//! typed.

use std::fmt;

/// Storage type of a column, as declared by the owning application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    /// Free text (the `id` primary key).
    Text,
    /// Text reference to another table's primary key.
    ForeignKey,
    /// Integer measurement.
    Integer,
    /// Boolean flag, stored as `0`/`1`.
    Boolean,
    /// Naive timestamp, stored as `YYYY-MM-DD HH:MM:SS[.ffffff]` text.
    Timestamp,
}

/// A single column of a report table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Column {
    /// Name used in CSV headers.
    pub name: &'static str,
    /// Name of the database column.
    pub db_name: &'static str,
    /// Declared type.
    pub ty: ColumnType,
    /// Whether the owning schema allows NULL.
    pub nullable: bool,
}

impl Column {
    const fn new(name: &'static str, ty: ColumnType) -> Self {
        Self {
            name,
            db_name: name,
            ty,
            nullable: false,
        }
    }

    const fn foreign_key(name: &'static str, db_name: &'static str) -> Self {
        Self {
            name,
            db_name,
            ty: ColumnType::ForeignKey,
            nullable: false,
        }
    }

    const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Returns true for timestamp columns.
    #[must_use]
    pub const fn is_timestamp(&self) -> bool {
        matches!(self.ty, ColumnType::Timestamp)
    }
}

const ID: Column = Column::new("id", ColumnType::Text);
const TIME: Column = Column::new("time", ColumnType::Timestamp);
const CREATED: Column = Column::new("created", ColumnType::Timestamp);
const UPDATED: Column = Column::new("updated", ColumnType::Timestamp);
const IS_DELETED: Column = Column::new("is_deleted", ColumnType::Boolean);
const DELETED_TIME: Column = Column::new("deleted_time", ColumnType::Timestamp).nullable();
const RECT: Column = Column::foreign_key("rect", "rect_id");
const AREA: Column = Column::foreign_key("area", "area_id");
const X: Column = Column::new("x", ColumnType::Integer);
const Y: Column = Column::new("y", ColumnType::Integer);

const HEATMAP_COLUMNS: &[Column] = &[
    ID,
    RECT,
    X,
    Y,
    TIME,
    Column::new("hot", ColumnType::Integer),
    CREATED,
    UPDATED,
    IS_DELETED,
    DELETED_TIME,
];

const STAYMAP_COLUMNS: &[Column] = &[
    ID,
    RECT,
    X,
    Y,
    TIME,
    Column::new("stay", ColumnType::Integer),
    CREATED,
    UPDATED,
    IS_DELETED,
    DELETED_TIME,
];

const FLOW_COLUMNS: &[Column] = &[
    ID,
    AREA,
    TIME,
    Column::new("flow_in", ColumnType::Integer),
    Column::new("flow_out", ColumnType::Integer),
    CREATED,
    UPDATED,
    IS_DELETED,
    DELETED_TIME,
];

const PEOPLE_COLUMNS: &[Column] = &[
    ID,
    AREA,
    TIME,
    Column::new("age", ColumnType::Integer),
    Column::new("gender", ColumnType::Integer),
    CREATED,
    UPDATED,
    IS_DELETED,
    DELETED_TIME,
];

/// The four exchanged record kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportKind {
    /// Heat-map sample (`heatmap_heatvalue`).
    Heatmap,
    /// Stay-map sample (`heatmap_stayvalue`).
    Staymap,
    /// Flow sample (`flow_flow`).
    Flow,
    /// People sample (`people_person`).
    People,
}

impl ReportKind {
    /// All kinds, in the order batch export and import process them.
    pub const ALL: [Self; 4] = [Self::Heatmap, Self::Staymap, Self::Flow, Self::People];

    /// Returns the kind as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Heatmap => "heatmap",
            Self::Staymap => "staymap",
            Self::Flow => "flow",
            Self::People => "people",
        }
    }

    /// Database table holding this kind.
    #[must_use]
    pub const fn table(&self) -> &'static str {
        match self {
            Self::Heatmap => "heatmap_heatvalue",
            Self::Staymap => "heatmap_stayvalue",
            Self::Flow => "flow_flow",
            Self::People => "people_person",
        }
    }

    /// Fixed CSV file name for this kind.
    #[must_use]
    pub const fn file_name(&self) -> &'static str {
        match self {
            Self::Heatmap => "heatmap.csv",
            Self::Staymap => "staymap.csv",
            Self::Flow => "flow.csv",
            Self::People => "people.csv",
        }
    }

    /// Columns in CSV header order.
    #[must_use]
    pub const fn columns(&self) -> &'static [Column] {
        match self {
            Self::Heatmap => HEATMAP_COLUMNS,
            Self::Staymap => STAYMAP_COLUMNS,
            Self::Flow => FLOW_COLUMNS,
            Self::People => PEOPLE_COLUMNS,
        }
    }

    /// Looks up a column by its CSV name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&'static Column> {
        self.columns().iter().find(|c| c.name == name)
    }

    /// CSV header names in order.
    pub fn header(&self) -> impl Iterator<Item = &'static str> {
        self.columns().iter().map(|c| c.name)
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
