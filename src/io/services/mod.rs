//! Import and export pipelines.
//!
//! Orchestrates format readers and writers, attribute strategies, and the
//! backing store.

pub mod batch;
pub mod export;
pub mod identifiers;
pub mod import;

pub use batch::BatchCommitManager;
pub use export::{ExportOptions, ExportPipeline, ExportResult};
pub use identifiers::IdentifierMap;
pub use import::{
    ImportOptions, ImportPhase, ImportPipeline, ImportProgress, ImportResult, ProgressCallback,
};
