//! Import and export command handlers.

use std::path::Path;

use footfall::config::FootfallConfig;
use footfall::io::{ExportService, ImportOptions, ImportService, TimeWindow};
use footfall::storage::SqliteStore;
use footfall::Result;

/// Executes the export command.
pub fn cmd_export(
    config: &FootfallConfig,
    date: &str,
    hour: Option<i64>,
    output: &Path,
) -> Result<()> {
    let window = TimeWindow::parse(date, hour)?;
    if !window.is_satisfiable() {
        tracing::warn!(window = %window, "hour is outside 0-23; files will be empty");
    }

    let store = SqliteStore::open(&config.database)?;
    let results = ExportService::new(&store).export_all(output, &window)?;

    println!("Export completed ({window}):");
    for result in &results {
        let path = result
            .path
            .as_deref()
            .map_or_else(|| result.kind.file_name().to_string(), |p| p.display().to_string());
        println!(
            "  {path}: {} rows ({} in table)",
            result.exported, result.total_in_table
        );
    }

    Ok(())
}

/// Executes the import command.
pub fn cmd_import(config: &FootfallConfig, input: &Path) -> Result<()> {
    let store = SqliteStore::open(&config.database)?;
    let options = ImportOptions::default().with_bulk_size(config.bulk_size);
    let results = ImportService::new(&store)
        .with_options(options)
        .import_all(input)?;

    println!("Import completed:");
    for result in &results {
        print!(
            "  {}: {} rows in {} batches",
            result.kind.file_name(),
            result.rows,
            result.batches
        );
        if result.lenient_timestamps > 0 {
            print!(", {} unparseable timestamps stored as NULL", result.lenient_timestamps);
        }
        println!();
    }

    Ok(())
}
