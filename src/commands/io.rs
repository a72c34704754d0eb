//! Import, export, and stats command handlers.

use std::io::Write;
use std::path::PathBuf;

use graphport::config::GraphportConfig;
use graphport::io::{ExportOptions, ExportPipeline, Format, ImportPipeline, ImportProgress, WriteMode};
use graphport::{GraphStore, Result, SqliteGraphStore};

use super::StoreArgs;

/// Arguments of the import command.
#[derive(Debug)]
pub struct ImportArgs {
    /// Input document.
    pub file: PathBuf,
    /// Explicit format name.
    pub format: Option<String>,
    /// Batch size override.
    pub batch_size: Option<usize>,
    /// Console-style option string.
    pub options: Option<String>,
    /// Drop edges with unknown endpoints.
    pub lenient: bool,
    /// Vertex label key override.
    pub vertex_label_key: Option<String>,
    /// Store location.
    pub store: StoreArgs,
}

/// Arguments of the export command.
#[derive(Debug)]
pub struct ExportArgs {
    /// Output document; stdout when absent.
    pub output: Option<PathBuf>,
    /// Explicit format name.
    pub format: Option<String>,
    /// Write without indentation.
    pub compact: bool,
    /// Vertex class filter.
    pub vertex_class: Option<String>,
    /// Edge class filter.
    pub edge_class: Option<String>,
    /// Store location.
    pub store: StoreArgs,
}

/// Executes the import command.
pub fn cmd_import(config: &GraphportConfig, args: ImportArgs) -> Result<()> {
    let mut settings = config.import.clone();
    if let Some(options) = &args.options {
        settings.apply_options(options)?;
    }
    if let Some(batch_size) = args.batch_size {
        settings.batch_size = batch_size;
    }
    if args.lenient {
        settings.lenient = true;
    }
    if args.vertex_label_key.is_some() {
        settings.vertex_label_key = args.vertex_label_key;
    }

    let mut options = settings.to_import_options();
    if let Some(name) = &args.format {
        options = options.with_format(name.parse::<Format>()?);
    }

    let store = args.store.open(config)?;
    let progress = Box::new(|progress: &ImportProgress| {
        print!(
            "\rVertices: {} - Edges: {} - Deferred: {} - Commits: {}",
            progress.vertices, progress.edges, progress.deferred, progress.commits,
        );
        let _ = std::io::stdout().flush();
    });

    let result = ImportPipeline::new(&store, options)
        .with_progress(progress)
        .import_from_file(&args.file)?;

    println!();
    println!();
    println!("Import completed:");
    println!("  Vertices:      {}", result.vertices);
    println!("  Edges:         {}", result.edges);
    println!("  Commits:       {}", result.commits);
    println!("  Database:      {}", database_label(&store));
    if result.has_dropped() {
        println!("  Dropped edges: {}", result.dropped_edges);
    }
    Ok(())
}

/// Executes the export command.
pub fn cmd_export(config: &GraphportConfig, args: ExportArgs) -> Result<()> {
    let mut options = ExportOptions::default().with_mode(if args.compact {
        WriteMode::Compact
    } else {
        WriteMode::Pretty
    });
    if let Some(name) = &args.format {
        options = options.with_format(name.parse::<Format>()?);
    }
    if let Some(class) = args.vertex_class {
        options = options.with_vertex_class(class);
    }
    if let Some(class) = args.edge_class {
        options = options.with_edge_class(class);
    }

    let store = args.store.open(config)?;
    let pipeline = ExportPipeline::new(&store, options);

    match args.output {
        Some(path) => {
            let result = pipeline.export_to_file(&path)?;
            println!("Export completed:");
            println!("  Vertices: {}", result.vertices);
            println!("  Edges:    {}", result.edges);
            println!("  Format:   {}", result.format);
            if let Some(path) = result.output_path {
                println!("  Output:   {path}");
            }
        },
        None => {
            let stdout = std::io::stdout();
            pipeline.export_to_writer(stdout.lock())?;
            println!();
        },
    }
    Ok(())
}

/// Executes the stats command.
pub fn cmd_stats(config: &GraphportConfig, store: &StoreArgs) -> Result<()> {
    let store = store.open(config)?;
    let stats = store.stats()?;
    println!("Database: {}", database_label(&store));
    println!("Vertices: {}", stats.vertices);
    println!("Edges:    {}", stats.edges);
    Ok(())
}

fn database_label(store: &SqliteGraphStore) -> String {
    store
        .db_path()
        .map_or_else(|| "(in memory)".to_string(), |path| path.display().to_string())
}
