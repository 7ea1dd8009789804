//! File format adapters for import/export.

pub mod csv;
