//! `SQLite`-backed report store.
//!
//! Reads and appends rows of the four report tables in a database owned by
//! another application. The schema is never altered.

use crate::models::{Column, Record, ReportKind, TimeWindow};
use crate::storage::sqlite::{
    acquire_lock, build_record_from_row, configure_connection, count_sql, insert_sql,
    open_existing, record_operation_metrics, report_tables_sql, select_window_sql, status_label,
};
use crate::storage::traits::{InsertSummary, ReportStore};
use crate::{Error, Result};
use rusqlite::limits::Limit;
use rusqlite::{Connection, params_from_iter};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Instant;
use tracing::instrument;

/// `SQLite` report store.
///
/// # Concurrency Model
///
/// The tool assumes it is the only writer during an import and the only
/// reader during an export. The connection sits behind a `Mutex` so the store
/// is `Sync`; `busy_timeout` covers the owning application briefly holding a
/// lock.
///
/// The connection is closed when the store is dropped.
pub struct SqliteStore {
    /// Connection to the database.
    conn: Mutex<Connection>,
    /// Path to the database file (None for in-memory).
    db_path: Option<PathBuf>,
}

impl SqliteStore {
    /// Opens an existing database file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist or cannot be opened.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// use footfall::storage::SqliteStore;
    ///
    /// let store = SqliteStore::open("db.sqlite3")?;
    /// # Ok::<(), footfall::Error>(())
    /// ```
    pub fn open(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        let conn = open_existing(&db_path)?;
        configure_connection(&conn)?;
        tracing::debug!(path = %db_path.display(), "Opened SQLite store");

        Ok(Self {
            conn: Mutex::new(conn),
            db_path: Some(db_path),
        })
    }

    /// Creates (or opens) a database file and provisions the report tables
    /// from the reference DDL. Meant for scratch databases.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or the DDL fails.
    pub fn create(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        let conn = Connection::open(&db_path).map_err(|e| Error::OperationFailed {
            operation: "create_sqlite".to_string(),
            cause: format!("{}: {e}", db_path.display()),
        })?;
        configure_connection(&conn)?;

        let store = Self {
            conn: Mutex::new(conn),
            db_path: Some(db_path),
        };
        store.provision()?;
        Ok(store)
    }

    /// Creates an in-memory store with the report tables (useful for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| Error::OperationFailed {
            operation: "open_sqlite_in_memory".to_string(),
            cause: e.to_string(),
        })?;

        let store = Self {
            conn: Mutex::new(conn),
            db_path: None,
        };
        store.provision()?;
        Ok(store)
    }

    /// Returns the database path (None for in-memory).
    #[must_use]
    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    /// Runs an arbitrary statement batch. Used to seed fixtures.
    ///
    /// # Errors
    ///
    /// Returns an error if any statement fails.
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        let conn = acquire_lock(&self.conn);
        conn.execute_batch(sql).map_err(|e| Error::OperationFailed {
            operation: "execute_batch".to_string(),
            cause: e.to_string(),
        })
    }

    fn provision(&self) -> Result<()> {
        self.execute_batch(&report_tables_sql())
    }

    /// Rows one `INSERT` may carry without exceeding the connection's
    /// bound-parameter limit.
    fn max_rows_per_statement(conn: &Connection, columns: usize) -> Result<usize> {
        let limit = conn
            .limit(Limit::SQLITE_LIMIT_VARIABLE_NUMBER)
            .map_err(|e| Error::OperationFailed {
                operation: "read_variable_limit".to_string(),
                cause: e.to_string(),
            })?;
        let limit = usize::try_from(limit).unwrap_or(0);
        if limit < columns {
            return Err(Error::OperationFailed {
                operation: "read_variable_limit".to_string(),
                cause: format!("limit of {limit} variables cannot hold one row of {columns}"),
            });
        }
        Ok(limit / columns)
    }

    /// Executes the chunked inserts on an open transaction.
    ///
    /// A chunk never binds more parameters than `SQLite` allows; a larger
    /// `bulk_size` is lowered to that bound.
    fn insert_chunks(
        tx: &rusqlite::Transaction<'_>,
        kind: ReportKind,
        records: &[Record],
        bulk_size: usize,
    ) -> Result<InsertSummary> {
        let mut summary = InsertSummary::default();
        let Some(first) = records.first() else {
            return Ok(summary);
        };
        let columns: Vec<&Column> = first.fields().iter().map(|f| f.column).collect();
        if columns.is_empty() {
            return Err(Error::InvalidInput(format!(
                "{kind} records carry no columns to insert"
            )));
        }

        let max_rows = Self::max_rows_per_statement(tx, columns.len())?;
        let rows_per_statement = bulk_size.min(max_rows);
        if rows_per_statement < bulk_size {
            tracing::debug!(
                kind = %kind,
                bulk_size,
                rows_per_statement,
                "Bulk size exceeds the SQLite variable limit; using smaller statements"
            );
        }

        // Sized from the rows actually present, never from `bulk_size` alone.
        let full_rows = rows_per_statement.min(records.len());
        let full_chunk_sql = insert_sql(kind, &columns, full_rows);

        for chunk in records.chunks(rows_per_statement) {
            if let Some(odd) = chunk.iter().find(|r| !r.same_shape(first)) {
                return Err(Error::InvalidInput(format!(
                    "record {} does not have the same columns as the rest of the batch",
                    odd.id().unwrap_or("<no id>")
                )));
            }

            let sql = if chunk.len() == full_rows {
                full_chunk_sql.clone()
            } else {
                insert_sql(kind, &columns, chunk.len())
            };
            let values = chunk
                .iter()
                .flat_map(|record| record.fields().iter().map(|f| &f.value));

            let mut stmt = tx.prepare_cached(&sql).map_err(|e| Error::OperationFailed {
                operation: "prepare_insert".to_string(),
                cause: e.to_string(),
            })?;
            let inserted = stmt
                .execute(params_from_iter(values))
                .map_err(|e| Error::OperationFailed {
                    operation: format!("insert_{}_batch_{}", kind, summary.batches + 1),
                    cause: e.to_string(),
                })?;

            summary.rows += inserted;
            summary.batches += 1;
            tracing::trace!(
                kind = %kind,
                batch = summary.batches,
                rows = inserted,
                "Inserted batch"
            );
        }

        Ok(summary)
    }
}

impl ReportStore for SqliteStore {
    #[instrument(skip(self), fields(operation = "count", table = kind.table()))]
    fn count(&self, kind: ReportKind) -> Result<u64> {
        let start = Instant::now();
        let result: Result<u64> = (|| {
            let conn = acquire_lock(&self.conn);
            let count: i64 = conn
                .query_row(&count_sql(kind), [], |row| row.get(0))
                .map_err(|e| Error::OperationFailed {
                    operation: format!("count_{kind}"),
                    cause: e.to_string(),
                })?;
            Ok(u64::try_from(count).unwrap_or(0))
        })();

        record_operation_metrics(kind.table(), "count", start, status_label(&result));
        result
    }

    #[instrument(skip(self, visit), fields(operation = "scan_window", table = kind.table(), window = %window))]
    fn scan_window(
        &self,
        kind: ReportKind,
        window: &TimeWindow,
        visit: &mut dyn FnMut(Record) -> Result<()>,
    ) -> Result<u64> {
        let start = Instant::now();
        let result: Result<u64> = (|| {
            let conn = acquire_lock(&self.conn);
            let (sql, params) = select_window_sql(kind, window);

            let mut stmt = conn.prepare(&sql).map_err(|e| Error::OperationFailed {
                operation: format!("prepare_select_{kind}"),
                cause: e.to_string(),
            })?;
            let mut rows = stmt
                .query(params_from_iter(params.iter()))
                .map_err(|e| Error::OperationFailed {
                    operation: format!("select_{kind}"),
                    cause: e.to_string(),
                })?;

            let mut visited = 0_u64;
            while let Some(row) = rows.next().map_err(|e| Error::OperationFailed {
                operation: format!("select_{kind}_row"),
                cause: e.to_string(),
            })? {
                visit(build_record_from_row(kind, row)?)?;
                visited += 1;
            }
            Ok(visited)
        })();

        record_operation_metrics(kind.table(), "scan_window", start, status_label(&result));
        result
    }

    #[instrument(skip(self, records), fields(operation = "insert_batches", table = kind.table(), count = records.len()))]
    fn insert_batches(
        &self,
        kind: ReportKind,
        records: &[Record],
        bulk_size: usize,
    ) -> Result<InsertSummary> {
        if bulk_size == 0 {
            return Err(Error::InvalidInput(
                "bulk size must be at least 1".to_string(),
            ));
        }

        let start = Instant::now();
        let result: Result<InsertSummary> = (|| {
            let mut conn = acquire_lock(&self.conn);
            let tx = conn.transaction().map_err(|e| Error::OperationFailed {
                operation: "begin_transaction".to_string(),
                cause: e.to_string(),
            })?;

            // Dropping `tx` on the error path rolls the whole file back.
            let summary = Self::insert_chunks(&tx, kind, records, bulk_size)?;

            tx.commit().map_err(|e| Error::OperationFailed {
                operation: "commit_transaction".to_string(),
                cause: e.to_string(),
            })?;
            Ok(summary)
        })();

        record_operation_metrics(kind.table(), "insert_batches", start, status_label(&result));
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldValue;
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(hour, 15, 0)
            .unwrap()
    }

    fn person(id: &str, time: NaiveDateTime) -> Record {
        Record::new(ReportKind::People)
            .with("id", FieldValue::Text(id.to_string()))
            .with("area", FieldValue::Text("area-1".to_string()))
            .with("time", FieldValue::Timestamp(time))
            .with("age", FieldValue::Integer(30))
            .with("gender", FieldValue::Integer(1))
            .with("created", FieldValue::Timestamp(time))
            .with("updated", FieldValue::Timestamp(time))
            .with("is_deleted", FieldValue::Boolean(false))
            .with("deleted_time", FieldValue::Null)
    }

    #[test]
    fn test_insert_and_count() {
        let store = SqliteStore::in_memory().unwrap();
        let records = vec![person("p1", at(1, 9)), person("p2", at(1, 10)), person("p3", at(2, 9))];

        let summary = store
            .insert_batches(ReportKind::People, &records, 2)
            .unwrap();
        assert_eq!(summary, InsertSummary { rows: 3, batches: 2 });
        assert_eq!(store.count(ReportKind::People).unwrap(), 3);
        assert_eq!(store.count(ReportKind::Flow).unwrap(), 0);
    }

    #[test]
    fn test_scan_window_orders_by_id_and_decodes() {
        let store = SqliteStore::in_memory().unwrap();
        let records = vec![person("p2", at(1, 9)), person("p1", at(1, 9)), person("p3", at(1, 10))];
        store
            .insert_batches(ReportKind::People, &records, 100)
            .unwrap();

        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let found = store
            .fetch_window(ReportKind::People, &TimeWindow::hour(date, 9))
            .unwrap();
        let ids: Vec<_> = found.iter().filter_map(Record::id).collect();
        assert_eq!(ids, vec!["p1", "p2"]);
        assert_eq!(found[0], person("p1", at(1, 9)));
    }

    #[test]
    fn test_failed_batch_rolls_back_everything() {
        let store = SqliteStore::in_memory().unwrap();
        // Duplicate id lands in the second batch.
        let records = vec![person("a", at(1, 9)), person("b", at(1, 9)), person("a", at(1, 9))];

        let result = store.insert_batches(ReportKind::People, &records, 2);
        assert!(matches!(
            result,
            Err(Error::OperationFailed { ref operation, .. }) if operation == "insert_people_batch_2"
        ));
        assert_eq!(store.count(ReportKind::People).unwrap(), 0);
    }

    #[test]
    fn test_zero_bulk_size_rejected() {
        let store = SqliteStore::in_memory().unwrap();
        let result = store.insert_batches(ReportKind::People, &[person("a", at(1, 9))], 0);
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_mixed_shapes_rejected() {
        let store = SqliteStore::in_memory().unwrap();
        let short = Record::new(ReportKind::People).with("id", FieldValue::Text("b".into()));
        let result =
            store.insert_batches(ReportKind::People, &[person("a", at(1, 9)), short], 10);
        assert!(matches!(result, Err(Error::InvalidInput(_))));
        assert_eq!(store.count(ReportKind::People).unwrap(), 0);
    }

    fn people(n: usize) -> Vec<Record> {
        (0..n).map(|i| person(&format!("p{i:05}"), at(1, 9))).collect()
    }

    #[test]
    fn test_bulk_size_above_variable_limit_is_split() {
        let store = SqliteStore::in_memory().unwrap();
        // Nine columns per person: room for two rows per statement.
        acquire_lock(&store.conn)
            .set_limit(Limit::SQLITE_LIMIT_VARIABLE_NUMBER, 20)
            .unwrap();

        let summary = store
            .insert_batches(ReportKind::People, &people(5), 100)
            .unwrap();
        assert_eq!(summary, InsertSummary { rows: 5, batches: 3 });
        assert_eq!(store.count(ReportKind::People).unwrap(), 5);
    }

    #[test]
    fn test_large_bulk_size_inserts_everything() {
        let store = SqliteStore::in_memory().unwrap();
        let limit = acquire_lock(&store.conn)
            .limit(Limit::SQLITE_LIMIT_VARIABLE_NUMBER)
            .unwrap();
        let rows_per_statement = usize::try_from(limit).unwrap() / 9;

        let summary = store
            .insert_batches(ReportKind::People, &people(5000), 5000)
            .unwrap();
        assert_eq!(summary.rows, 5000);
        assert_eq!(summary.batches, 5000_usize.div_ceil(rows_per_statement.min(5000)));
        assert_eq!(store.count(ReportKind::People).unwrap(), 5000);
    }

    #[test]
    fn test_unbounded_bulk_size_with_few_rows() {
        let store = SqliteStore::in_memory().unwrap();
        let summary = store
            .insert_batches(ReportKind::People, &people(3), usize::MAX)
            .unwrap();
        assert_eq!(summary, InsertSummary { rows: 3, batches: 1 });
    }

    #[test]
    fn test_open_and_create_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.sqlite3");
        assert!(SqliteStore::open(&path).is_err());

        let created = SqliteStore::create(&path).unwrap();
        assert_eq!(created.db_path(), Some(path.as_path()));
        drop(created);

        let reopened = SqliteStore::open(&path).unwrap();
        assert_eq!(reopened.count(ReportKind::Heatmap).unwrap(), 0);
    }
}
