//! Binary entry point for graphport.
//!
//! This binary provides the CLI for importing and exporting graph documents.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow needless_pass_by_value for command functions
#![allow(clippy::needless_pass_by_value)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

mod commands;

use clap::{Args, Parser, Subcommand};
use commands::{ExportArgs, ImportArgs, StoreArgs, cmd_export, cmd_import, cmd_stats};
use graphport::config::GraphportConfig;
use graphport::observability;
use std::path::PathBuf;
use std::process::ExitCode;

/// Graphport - import and export property graphs as GraphML or GraphSON.
#[derive(Parser)]
#[command(name = "graphport")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true, env = "GRAPHPORT_CONFIG_PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Store selection shared by all commands.
#[derive(Args)]
struct StoreFlags {
    /// Path to the `SQLite` graph database.
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// Use a throwaway in-memory database.
    #[arg(long, conflicts_with = "database")]
    in_memory: bool,
}

impl From<StoreFlags> for StoreArgs {
    fn from(flags: StoreFlags) -> Self {
        Self {
            database: flags.database,
            in_memory: flags.in_memory,
        }
    }
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Import a GraphML or GraphSON document into the database.
    Import {
        /// Input file.
        file: PathBuf,

        /// Document format (graphml, graphson). Detected from the extension if omitted.
        #[arg(short, long)]
        format: Option<String>,

        /// Elements per commit; 0 commits once at the end.
        #[arg(short, long)]
        batch_size: Option<usize>,

        /// Console-style options, e.g. "batchSize=10 vertexAttributeStrategy.__type__=ignore".
        #[arg(short, long)]
        options: Option<String>,

        /// Drop edges whose endpoints never appear instead of failing.
        #[arg(long)]
        lenient: bool,

        /// Attribute whose value becomes the label of unlabeled vertices.
        #[arg(long)]
        vertex_label_key: Option<String>,

        #[command(flatten)]
        store: StoreFlags,
    },

    /// Export the database as a GraphML or GraphSON document.
    Export {
        /// Output file. Writes to stdout if omitted.
        #[arg(short = 'O', long)]
        output: Option<PathBuf>,

        /// Document format (graphml, graphson). Detected from the extension if omitted.
        #[arg(short, long)]
        format: Option<String>,

        /// Write without indentation.
        #[arg(long)]
        compact: bool,

        /// Only export vertices of this class.
        #[arg(long)]
        vertex_class: Option<String>,

        /// Only export edges of this class.
        #[arg(long)]
        edge_class: Option<String>,

        #[command(flatten)]
        store: StoreFlags,
    },

    /// Show vertex and edge counts.
    Stats {
        #[command(flatten)]
        store: StoreFlags,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        },
    };

    if let Err(e) = observability::init_from_settings(Some(&config.logging), cli.verbose) {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    match run_command(cli.command, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        },
    }
}

/// Runs the selected command.
fn run_command(command: Commands, config: &GraphportConfig) -> graphport::Result<()> {
    match command {
        Commands::Import {
            file,
            format,
            batch_size,
            options,
            lenient,
            vertex_label_key,
            store,
        } => cmd_import(
            config,
            ImportArgs {
                file,
                format,
                batch_size,
                options,
                lenient,
                vertex_label_key,
                store: store.into(),
            },
        ),

        Commands::Export {
            output,
            format,
            compact,
            vertex_class,
            edge_class,
            store,
        } => cmd_export(
            config,
            ExportArgs {
                output,
                format,
                compact,
                vertex_class,
                edge_class,
                store: store.into(),
            },
        ),

        Commands::Stats { store } => cmd_stats(config, &store.into()),
    }
}

/// Loads configuration, then applies environment overrides.
fn load_config(path: Option<&std::path::Path>) -> graphport::Result<GraphportConfig> {
    let mut config = match path {
        Some(path) => GraphportConfig::load_from_file(path)?,
        None => GraphportConfig::load_default()?,
    };
    config.apply_process_env()?;
    Ok(config)
}
