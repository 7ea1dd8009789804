//! Report store trait.

use crate::Result;
use crate::models::{Record, ReportKind, TimeWindow};

/// Outcome of a batched insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InsertSummary {
    /// Rows written.
    pub rows: usize,
    /// Bulk-insert statements executed.
    pub batches: usize,
}

/// Access to the externally owned database holding the report tables.
///
/// The store is only ever read (export) or appended to (import). It never
/// updates or deletes rows, and leaves uniqueness and referential checks to
/// the database itself.
pub trait ReportStore: Send + Sync {
    /// Total number of rows in the kind's table.
    fn count(&self, kind: ReportKind) -> Result<u64>;

    /// Streams the rows whose `time` falls inside `window`, ordered by `id`.
    ///
    /// `visit` is called once per row; an error from it stops the scan and is
    /// returned. Returns the number of rows visited.
    fn scan_window(
        &self,
        kind: ReportKind,
        window: &TimeWindow,
        visit: &mut dyn FnMut(Record) -> Result<()>,
    ) -> Result<u64>;

    /// Inserts `records` in chunks of `bulk_size`, one statement per chunk,
    /// all inside a single transaction.
    ///
    /// If any chunk fails the transaction is rolled back and none of the
    /// records remain.
    fn insert_batches(
        &self,
        kind: ReportKind,
        records: &[Record],
        bulk_size: usize,
    ) -> Result<InsertSummary>;

    /// Collects the rows of a window into memory.
    fn fetch_window(&self, kind: ReportKind, window: &TimeWindow) -> Result<Vec<Record>> {
        let mut records = Vec::new();
        self.scan_window(kind, window, &mut |record| {
            records.push(record);
            Ok(())
        })?;
        Ok(records)
    }
}
