//! Graph import/export I/O subsystem.
//!
//! # Architecture
//!
//! - **Format adapters** implement [`ImportSource`] and [`ExportSink`]
//! - **Strategies** decide per attribute whether to keep, drop, or rename it
//! - **Pipelines** move elements between adapters and a [`crate::storage::GraphStore`]
//!
//! # Supported Formats
//!
//! | Format | Import | Export | Notes |
//! |--------|--------|--------|-------|
//! | GraphML | ✓ | ✓ | Typed `<key>` declarations |
//! | GraphSON | ✓ | ✓ | Reads `NORMAL`/`COMPACT`/`EXTENDED`, writes `EXTENDED` |
//!
//! # Examples
//!
//! ## Import a GraphML file
//!
//! ```rust,ignore
//! use graphport::io::{AttributeStrategy, AttributeStrategyRegistry, ImportOptions, ImportPipeline};
//!
//! let strategies = AttributeStrategyRegistry::new()
//!     .with_vertex_strategy("__type__", AttributeStrategy::Ignore);
//! let options = ImportOptions::default()
//!     .with_batch_size(1000)
//!     .with_strategies(strategies);
//! let result = ImportPipeline::new(&store, options).import_from_file(path)?;
//! println!("Imported {} vertices", result.vertices);
//! ```
//!
//! ## Export to GraphSON
//!
//! ```rust,ignore
//! use graphport::io::{ExportOptions, ExportPipeline, Format};
//!
//! let options = ExportOptions::default().with_format(Format::GraphSon);
//! let result = ExportPipeline::new(&store, options).export_to_writer(std::io::stdout())?;
//! ```

pub mod formats;
pub mod services;
pub mod strategy;
pub mod traits;

// Re-exports for convenience
pub use formats::{Format, ReadOptions, WriteMode, create_export_sink, create_import_source};
pub use services::{
    BatchCommitManager, ExportOptions, ExportPipeline, ExportResult, IdentifierMap, ImportOptions,
    ImportPhase, ImportPipeline, ImportProgress, ImportResult, ProgressCallback,
};
pub use strategy::{AttributeStrategy, AttributeStrategyRegistry, StrategyOutcome};
pub use traits::{ExportSink, ImportEvent, ImportEvents, ImportSource, events};
