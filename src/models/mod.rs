//! Data models for footfall.
//!
//! Record kinds and their column catalog, the scalar values rows carry, and
//! the date/hour window used to select rows.

mod kind;
mod record;
mod window;

pub use kind::{Column, ColumnType, ReportKind};
pub use record::{CSV_TIMESTAMP_FORMAT, Field, FieldValue, Record};
pub use window::TimeWindow;
