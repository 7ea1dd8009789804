//! Reference DDL for the report tables.
//!
//! The real tables are created and migrated by the owning application. This
//! DDL mirrors their columns and constraints so scratch databases can be
//! provisioned for tests and benchmarks; the CLI never runs it.

use crate::models::{Column, ColumnType, ReportKind};

fn column_ddl(column: &Column) -> String {
    let ty = match column.ty {
        ColumnType::Text | ColumnType::ForeignKey => "varchar(64)",
        ColumnType::Integer => "integer",
        ColumnType::Boolean => "bool",
        ColumnType::Timestamp => "datetime",
    };
    let mut ddl = format!("\"{}\" {ty}", column.db_name);
    if !column.nullable {
        ddl.push_str(" NOT NULL");
    }
    if column.name == "id" {
        ddl.push_str(" PRIMARY KEY");
    }
    ddl
}

/// `CREATE TABLE IF NOT EXISTS` statement for one kind.
#[must_use]
pub fn create_table_sql(kind: ReportKind) -> String {
    let columns = kind
        .columns()
        .iter()
        .map(column_ddl)
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "CREATE TABLE IF NOT EXISTS \"{}\" ({columns});\n\
         CREATE INDEX IF NOT EXISTS \"{}_time\" ON \"{}\" (\"time\");",
        kind.table(),
        kind.table(),
        kind.table()
    )
}

/// DDL for all four report tables.
#[must_use]
pub fn report_tables_sql() -> String {
    ReportKind::ALL
        .iter()
        .map(|kind| create_table_sql(*kind))
        .collect::<Vec<_>>()
        .join("\n")
}
