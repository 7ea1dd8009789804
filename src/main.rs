//! Binary entry point for footfall.
//!
//! This binary provides the CLI for moving report rows between the shop
//! database and CSV files.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

mod commands;

use clap::{Parser, Subcommand};
use commands::{cmd_export, cmd_import};
use footfall::config::FootfallConfig;
use footfall::observability;
use std::path::PathBuf;
use std::process::ExitCode;

/// Footfall - moves shop report samples between the database and CSV files.
#[derive(Parser)]
#[command(name = "footfall")]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help = true)]
struct Cli {
    /// Log level: trace, debug, info, warning, error or critical.
    #[arg(short, long, global = true, value_name = "LEVEL")]
    log: Option<String>,

    /// Path to configuration file.
    #[arg(short, long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Export reports in the database to CSV.
    #[command(arg_required_else_help = true)]
    Export {
        /// Date to export (YYYY-MM-DD).
        #[arg(short, long)]
        date: String,

        /// Hour to export. Out-of-range hours export empty files.
        #[arg(short = 't', long, allow_negative_numbers = true)]
        hour: Option<i64>,

        /// Directory for the CSV files.
        #[arg(short, long, value_name = "PATH", default_value = ".")]
        output: PathBuf,

        /// Path to the SQLite database (default: db.sqlite3).
        #[arg(long, value_name = "DATABASE")]
        sqlite: Option<PathBuf>,
    },

    /// Import CSV files into the database.
    Import {
        /// Directory holding the CSV files.
        #[arg(short, long, value_name = "PATH", default_value = ".")]
        input: PathBuf,

        /// Rows per bulk insert statement (default: 100).
        #[arg(short, long, value_name = "NUMBER")]
        bulk: Option<usize>,

        /// Path to the SQLite database (default: db.sqlite3).
        #[arg(long, value_name = "DATABASE")]
        sqlite: Option<PathBuf>,
    },
}

/// Main entry point.
fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        },
    };

    if let Err(e) = observability::init_from_settings(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    match run_command(cli.command, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        },
    }
}

/// Runs the selected command.
fn run_command(command: Commands, config: &FootfallConfig) -> footfall::Result<()> {
    match command {
        Commands::Export {
            date,
            hour,
            output,
            sqlite: _,
        } => cmd_export(config, &date, hour, &output),

        Commands::Import { input, .. } => cmd_import(config, &input),
    }
}

/// Loads configuration and applies command-line overrides.
fn load_config(cli: &Cli) -> footfall::Result<FootfallConfig> {
    let mut config = FootfallConfig::load(cli.config.as_deref())?;

    if let Some(level) = &cli.log {
        config = config.with_log_level(level.clone());
    }

    match &cli.command {
        Commands::Export { sqlite, .. } => {
            if let Some(path) = sqlite {
                config = config.with_database(path.clone());
            }
        },
        Commands::Import { sqlite, bulk, .. } => {
            if let Some(path) = sqlite {
                config = config.with_database(path.clone());
            }
            if let Some(bulk) = bulk {
                config = config.with_bulk_size(*bulk)?;
            }
        },
    }

    Ok(config)
}
