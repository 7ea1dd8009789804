//! Storage traits.

mod report;

pub use report::{InsertSummary, ReportStore};
