//! SQL construction for the report tables.
//!
//! Table and column names come from the static catalog in
//! [`crate::models::ReportKind`]; values are always bound as parameters.

use crate::models::{Column, ReportKind, TimeWindow};
use chrono::NaiveDate;
use rusqlite::types::Value;

/// Substring offsets (1-based start, length) of year, month, day and hour in
/// `YYYY-MM-DD HH:MM:SS` text.
const TIME_PARTS: [(u8, u8); 4] = [(1, 4), (6, 2), (9, 2), (12, 2)];

/// Builds the `WHERE` predicate selecting rows of `column` inside `window`.
///
/// Stored timestamps are compared component-wise on their text, so no
/// timezone conversion takes place. An unsatisfiable window still yields a
/// valid predicate; it just matches no row.
///
/// The component checks are preceded by a text range on the window's day
/// (`>= 'YYYY-MM-DD'` and `< ` the next day), which lets `SQLite` use an index
/// on `column`. The range holds for both the space and `T` separators, so it
/// never drops a row the component checks accept.
///
/// Returns the clause and its positional parameters.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use footfall::models::TimeWindow;
/// use footfall::storage::sqlite::window_clause;
/// use rusqlite::types::Value;
///
/// let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
/// let (sql, params) = window_clause("time", &TimeWindow::hour(date, 9));
/// assert_eq!(params[0], Value::Text("2024-03-01".to_string()));
/// assert_eq!(params[1], Value::Text("2024-03-02".to_string()));
/// assert_eq!(params[5], Value::Integer(9));
/// assert!(sql.starts_with("\"time\" >= ?1 AND \"time\" < ?2 AND "));
/// ```
#[must_use]
pub fn window_clause(column: &str, window: &TimeWindow) -> (String, Vec<Value>) {
    let date = window.date();
    let mut parts = vec![format!("\"{column}\" >= ?1")];
    let mut params = vec![Value::Text(day_prefix(date))];
    if let Some(next) = date.succ_opt() {
        parts.push(format!("\"{column}\" < ?2"));
        params.push(Value::Text(day_prefix(next)));
    }

    for ((start, len), component) in TIME_PARTS.iter().zip(window.components()) {
        params.push(Value::Integer(component));
        parts.push(format!(
            "CAST(substr(\"{column}\", {start}, {len}) AS INTEGER) = ?{}",
            params.len()
        ));
    }
    (parts.join(" AND "), params)
}

fn day_prefix(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Comma-separated, quoted database column names.
fn column_list<'a>(columns: impl IntoIterator<Item = &'a Column>) -> String {
    columns
        .into_iter()
        .map(|c| format!("\"{}\"", c.db_name))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `SELECT` of every catalog column for rows inside `window`, ordered by `id`.
#[must_use]
pub fn select_window_sql(kind: ReportKind, window: &TimeWindow) -> (String, Vec<Value>) {
    let (clause, params) = window_clause("time", window);
    let sql = format!(
        "SELECT {} FROM \"{}\" WHERE {clause} ORDER BY \"id\"",
        column_list(kind.columns()),
        kind.table()
    );
    (sql, params)
}

/// `SELECT COUNT(*)` over the kind's table.
#[must_use]
pub fn count_sql(kind: ReportKind) -> String {
    format!("SELECT COUNT(*) FROM \"{}\"", kind.table())
}

/// Multi-row `INSERT` for `rows` rows of the given columns.
#[must_use]
pub fn insert_sql(kind: ReportKind, columns: &[&Column], rows: usize) -> String {
    let placeholders = format!("({})", vec!["?"; columns.len()].join(", "));
    let values = vec![placeholders.as_str(); rows].join(", ");
    format!(
        "INSERT INTO \"{}\" ({}) VALUES {values}",
        kind.table(),
        column_list(columns.iter().copied())
    )
}
