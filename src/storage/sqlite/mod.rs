//! Shared `SQLite` helpers for the report store.
//!
//! ## Module Structure
//!
//! - [`connection`]: Opening, configuring and locking the [`rusqlite::Connection`]
//! - [`sql`]: Window predicates, `SELECT`, `COUNT` and multi-row `INSERT` text
//! - [`record_row`]: Conversion between rows and [`Record`](crate::models::Record)s
//! - [`schema`]: Reference DDL for scratch databases
//! - [`metrics`]: Shared metrics recording helpers

mod connection;
mod metrics;
mod record_row;
mod schema;
mod sql;

pub use connection::{BUSY_TIMEOUT_MS, acquire_lock, configure_connection, open_existing};
pub use metrics::{record_operation_metrics, status_label};
pub use record_row::{
    build_record_from_row, decode_value, format_store_timestamp, parse_store_timestamp,
};
pub use schema::{create_table_sql, report_tables_sql};
pub use sql::{count_sql, insert_sql, select_window_sql, window_clause};
