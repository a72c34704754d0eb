//! # Graphport
//!
//! Streaming import and export of property graphs in GraphML and GraphSON.
//!
//! Graphport moves vertices and edges with typed attributes between an
//! interchange document and a backing graph store. Documents are parsed as a
//! lazy stream of events, each attribute passes through a per-key strategy
//! (keep, drop, rename), and store writes are committed in bounded batches.
//!
//! ## Features
//!
//! - GraphML (XML) and GraphSON (JSON, `NORMAL`/`COMPACT`/`EXTENDED` modes)
//! - Single-pass readers that never materialize the whole document
//! - Per-attribute import strategies scoped to one pipeline run
//! - Configurable batch commits with explicit failure accounting
//! - Forward edge references resolved through an identifier map
//! - In-memory and `SQLite` store adapters
//!
//! ## Example
//!
//! ```rust,ignore
//! use graphport::io::{Format, ImportOptions, ImportPipeline};
//! use graphport::storage::InMemoryGraphStore;
//!
//! let store = InMemoryGraphStore::new();
//! let options = ImportOptions::default()
//!     .with_format(Format::GraphMl)
//!     .with_batch_size(100);
//! let result = ImportPipeline::new(&store, options).import_from_file(path)?;
//! println!("{} vertices, {} edges", result.vertices, result.edges);
//! ```
//!
//! ## Failure semantics
//!
//! Imports are not all-or-nothing. Batches committed before a failure stay in
//! the store; only the uncommitted remainder is rolled back. Pick the batch
//! size with that in mind (`0` means a single commit at the end).

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

// Module declarations
pub mod config;
pub mod io;
pub mod models;
pub mod observability;
pub mod storage;

// Re-exports for convenience
pub use config::{GraphportConfig, ImportSettings};
pub use io::{
    AttributeStrategy, AttributeStrategyRegistry, ExportOptions, ExportPipeline, Format,
    ImportOptions, ImportPipeline, ImportResult, WriteMode,
};
pub use models::{
    AttributeType, AttributeTypeTable, AttributeValue, EdgeRecord, ElementKind,
    GraphDocumentModel, VertexRecord,
};
pub use storage::{GraphStore, InMemoryGraphStore, SqliteGraphStore, StoreId};

/// Error type for graphport operations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When | Store state afterwards |
/// |---------|-------------|------------------------|
/// | `Parse` | Malformed document, undeclared key, bad typed value | Last successful batch |
/// | `Structural` | Unknown edge endpoint, duplicate vertex id | Last successful batch |
/// | `Commit` | Store rejected a batch | Last successful batch |
/// | `Configuration` | Unknown strategy, non-numeric batch size | Untouched |
/// | `Read` | Input stream failed or was closed | Last successful batch |
/// | `Write` | Output sink failed or writer misuse | Untouched (export) |
/// | `OperationFailed` | Store operation other than commit failed | Last successful batch |
#[derive(Debug, ThisError)]
pub enum Error {
    /// The interchange document is malformed.
    ///
    /// Raised when:
    /// - XML or JSON syntax is invalid or the document is truncated
    /// - A `<data>` element references an undeclared key
    /// - A value does not parse under its declared type
    /// - A required identifier (`id`, `_id`, `_outV`, `_inV`) is missing
    #[error("parse error{}: {message}", .offset.map(|o| format!(" at byte {o}")).unwrap_or_default())]
    Parse {
        /// Byte offset into the input, when known.
        offset: Option<u64>,
        /// Description of the problem.
        message: String,
    },

    /// The document is well formed but describes an inconsistent graph.
    ///
    /// Raised when:
    /// - An edge endpoint is never declared by end of document (strict mode)
    /// - Two vertices share an external identifier
    #[error("structural error: {0}")]
    Structural(String),

    /// The backing store rejected a batch commit.
    ///
    /// Elements from earlier batches remain committed; `lost` elements created
    /// since the last successful commit were not persisted.
    #[error("commit failed after {committed} committed elements ({lost} lost): {cause}")]
    Commit {
        /// Elements created since the last successful commit.
        lost: usize,
        /// Elements committed before the failure.
        committed: usize,
        /// The store's failure message.
        cause: String,
    },

    /// Invalid configuration, detected before any store mutation.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The input byte stream failed.
    #[error("read error: {0}")]
    Read(String),

    /// The output sink failed or was used out of order.
    #[error("write error: {0}")]
    Write(String),

    /// A store operation failed.
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },
}

impl Error {
    /// Builds a parse error without position information.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            offset: None,
            message: message.into(),
        }
    }

    /// Builds a parse error at a byte offset.
    pub fn parse_at(offset: u64, message: impl Into<String>) -> Self {
        Self::Parse {
            offset: Some(offset),
            message: message.into(),
        }
    }

    /// Returns whether the error leaves the store untouched by this run.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

/// Result type alias for graphport operations.
pub type Result<T> = std::result::Result<T, Error>;
