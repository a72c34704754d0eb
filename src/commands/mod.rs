//! Command handlers module.
//!
//! - `io.rs`: import, export, and stats

mod io;

use std::path::{Path, PathBuf};

use graphport::config::GraphportConfig;
use graphport::{Result, SqliteGraphStore};

pub use io::{ExportArgs, ImportArgs, cmd_export, cmd_import, cmd_stats};

/// Default database file when neither the CLI nor the config names one.
const DEFAULT_DATABASE: &str = "graphport.db";

/// Where the store for a command lives.
#[derive(Debug, Clone)]
pub struct StoreArgs {
    /// Explicit database path.
    pub database: Option<PathBuf>,
    /// Use a throwaway in-memory database.
    pub in_memory: bool,
}

impl StoreArgs {
    /// Opens the store, preferring CLI arguments over the config file.
    pub fn open(&self, config: &GraphportConfig) -> Result<SqliteGraphStore> {
        if self.in_memory {
            return SqliteGraphStore::in_memory();
        }
        let path = self
            .database
            .clone()
            .or_else(|| config.database.clone())
            .unwrap_or_else(|| Path::new(DEFAULT_DATABASE).to_path_buf());
        SqliteGraphStore::new(path)
    }
}
