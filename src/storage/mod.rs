//! Storage layer.
//!
//! The database belongs to another application. This layer reads windows of
//! the report tables and appends rows to them. It never touches the schema
//! or existing rows of a database it did not create itself.

// Dropping the connection guard slightly early provides no meaningful benefit.
#![allow(clippy::significant_drop_tightening)]

pub mod persistence;
pub mod sqlite;
pub mod traits;

pub use persistence::SqliteStore;
pub use traits::{InsertSummary, ReportStore};
