//! Graph import pipeline.
//!
//! Pulls events from a format reader, creates store elements, resolves edge
//! endpoints through an [`IdentifierMap`], and commits in batches.

use super::batch::BatchCommitManager;
use super::identifiers::IdentifierMap;
use crate::io::formats::{Format, ReadOptions, create_import_source};
use crate::io::strategy::AttributeStrategyRegistry;
use crate::io::traits::{ImportEvent, ImportSource};
use crate::models::{EdgeRecord, ElementKind, VertexRecord};
use crate::storage::{GraphStore, StoreId};
use crate::{Error, Result};
use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;
use std::time::Instant;
use tracing::instrument;

/// Options for graph import.
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Document format. `None` detects it from the file extension, falling
    /// back to GraphML.
    pub format: Option<Format>,
    /// Elements per commit; `0` commits once at the end.
    pub batch_size: usize,
    /// Attribute strategies for this import only.
    pub strategies: AttributeStrategyRegistry,
    /// Drop edges with unknown endpoints instead of failing.
    pub lenient: bool,
    /// Attribute whose raw value labels vertices without an explicit label.
    pub vertex_label_key: Option<String>,
}

impl ImportOptions {
    /// Sets the document format.
    #[must_use]
    pub const fn with_format(mut self, format: Format) -> Self {
        self.format = Some(format);
        self
    }

    /// Sets the batch size.
    #[must_use]
    pub const fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Sets the attribute strategies.
    #[must_use]
    pub fn with_strategies(mut self, strategies: AttributeStrategyRegistry) -> Self {
        self.strategies = strategies;
        self
    }

    /// Enables or disables lenient endpoint handling.
    #[must_use]
    pub const fn with_lenient(mut self, lenient: bool) -> Self {
        self.lenient = lenient;
        self
    }

    /// Sets the vertex label key.
    #[must_use]
    pub fn with_vertex_label_key(mut self, key: impl Into<String>) -> Self {
        self.vertex_label_key = Some(key.into());
        self
    }

    /// Returns the reader options derived from these import options.
    #[must_use]
    pub fn read_options(&self) -> ReadOptions {
        ReadOptions {
            strategies: self.strategies.clone(),
            vertex_label_key: self.vertex_label_key.clone(),
        }
    }
}

/// Pipeline state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImportPhase {
    /// Not started.
    #[default]
    Start,
    /// Waiting for attribute declarations.
    ReadingMetadata,
    /// Creating vertices and edges.
    ReadingElements,
    /// Resolving leftovers and committing the last batch.
    Finalizing,
    /// Finished successfully.
    Done,
    /// Aborted; the error was returned to the caller.
    Failed,
}

/// Progress callback for import operations.
pub type ProgressCallback = Box<dyn Fn(&ImportProgress) + Send>;

/// Progress information during import.
#[derive(Debug, Clone, Default)]
pub struct ImportProgress {
    /// Vertices created so far.
    pub vertices: usize,
    /// Edges created so far.
    pub edges: usize,
    /// Edges waiting for an endpoint.
    pub deferred: usize,
    /// Successful commits so far.
    pub commits: usize,
}

/// Result of an import operation.
#[derive(Debug, Clone, Default)]
pub struct ImportResult {
    /// Number of vertices created.
    pub vertices: usize,
    /// Number of edges created.
    pub edges: usize,
    /// Edges dropped in lenient mode because an endpoint never appeared.
    pub dropped_edges: usize,
    /// Number of commits issued.
    pub commits: usize,
    /// External to store identifiers for every created vertex.
    pub identifiers: IdentifierMap,
}

impl ImportResult {
    /// Returns whether anything was imported.
    #[must_use]
    pub const fn has_imports(&self) -> bool {
        self.vertices > 0 || self.edges > 0
    }

    /// Returns whether edges were dropped.
    #[must_use]
    pub const fn has_dropped(&self) -> bool {
        self.dropped_edges > 0
    }
}

/// Edges waiting for endpoints that have not been created yet.
#[derive(Debug, Default)]
struct DeferredEdges {
    parked: Vec<Option<EdgeRecord>>,
    waiting: HashMap<String, Vec<usize>>,
    count: usize,
}

impl DeferredEdges {
    fn park(&mut self, edge: EdgeRecord, missing: &[&str]) {
        let slot = self.parked.len();
        for id in missing {
            let slots = self.waiting.entry((*id).to_string()).or_default();
            if slots.last() != Some(&slot) {
                slots.push(slot);
            }
        }
        self.parked.push(Some(edge));
        self.count += 1;
    }

    /// Takes the edges that became resolvable once `id` was created.
    fn release(&mut self, id: &str, identifiers: &IdentifierMap) -> Vec<EdgeRecord> {
        let Some(slots) = self.waiting.remove(id) else {
            return Vec::new();
        };
        let mut ready = Vec::new();
        for slot in slots {
            let resolvable = self.parked[slot]
                .as_ref()
                .is_some_and(|e| identifiers.contains(&e.source) && identifiers.contains(&e.target));
            if resolvable {
                if let Some(edge) = self.parked[slot].take() {
                    self.count -= 1;
                    ready.push(edge);
                }
            }
        }
        ready
    }

    fn drain(&mut self) -> impl Iterator<Item = EdgeRecord> + '_ {
        self.waiting.clear();
        self.count = 0;
        self.parked.drain(..).flatten()
    }

    const fn len(&self) -> usize {
        self.count
    }

    const fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Per-run working state.
struct Run<'s, S: GraphStore + ?Sized> {
    batches: BatchCommitManager<'s, S>,
    identifiers: IdentifierMap,
    deferred: DeferredEdges,
    vertices: usize,
    edges: usize,
}

/// Imports interchange documents into a graph store.
///
/// # State machine
///
/// `Start → ReadingMetadata → ReadingElements → Finalizing → Done`, with
/// `Failed` reachable from every non-terminal phase. On failure the batch
/// in progress is rolled back; earlier batches stay committed.
pub struct ImportPipeline<'a, S: GraphStore + ?Sized> {
    store: &'a S,
    options: ImportOptions,
    phase: ImportPhase,
    progress: Option<ProgressCallback>,
}

impl<'a, S: GraphStore + ?Sized> ImportPipeline<'a, S> {
    /// Creates a pipeline for one import into `store`.
    #[must_use]
    pub const fn new(store: &'a S, options: ImportOptions) -> Self {
        Self {
            store,
            options,
            phase: ImportPhase::Start,
            progress: None,
        }
    }

    /// Sets a progress callback, invoked after every created element.
    #[must_use]
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Returns the current phase.
    #[must_use]
    pub const fn phase(&self) -> ImportPhase {
        self.phase
    }

    /// Imports a document file.
    ///
    /// Without an explicit format, the file extension selects one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if no format is set and the extension
    /// is not recognized, or an error if the file cannot be opened or the
    /// import fails.
    pub fn import_from_file(&mut self, path: &Path) -> Result<ImportResult> {
        let format = match self.options.format {
            Some(format) => format,
            None => Format::from_path(path)?,
        };

        let file = std::fs::File::open(path).map_err(|e| Error::OperationFailed {
            operation: "open_import_file".to_string(),
            cause: e.to_string(),
        })?;
        self.import_as(std::io::BufReader::new(file), format)
    }

    /// Imports a document from a reader.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing, endpoint resolution, or a commit fails.
    pub fn import_from_reader<R: BufRead>(&mut self, reader: R) -> Result<ImportResult> {
        self.import_as(reader, self.options.format.unwrap_or_default())
    }

    fn import_as<R: BufRead>(&mut self, reader: R, format: Format) -> Result<ImportResult> {
        let mut source = create_import_source(reader, format, self.options.read_options());
        self.import_from_source(source.as_mut())
    }

    /// Imports from an event source.
    ///
    /// The source must already apply this pipeline's attribute strategies.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing, endpoint resolution, or a commit fails.
    #[instrument(skip(self, source), fields(batch_size = self.options.batch_size, lenient = self.options.lenient))]
    pub fn import_from_source(&mut self, source: &mut dyn ImportSource) -> Result<ImportResult> {
        let start = Instant::now();
        let mut run = Run {
            batches: BatchCommitManager::new(self.store, self.options.batch_size),
            identifiers: IdentifierMap::new(),
            deferred: DeferredEdges::default(),
            vertices: 0,
            edges: 0,
        };

        self.phase = ImportPhase::ReadingMetadata;
        match self.drive(source, &mut run) {
            Ok(dropped_edges) => {
                self.phase = ImportPhase::Done;
                metrics::counter!("graphport_imports_total", "status" => "success").increment(1);
                metrics::histogram!("graphport_import_duration_ms")
                    .record(start.elapsed().as_secs_f64() * 1000.0);
                tracing::info!(
                    vertices = run.vertices,
                    edges = run.edges,
                    dropped_edges,
                    commits = run.batches.commits(),
                    "import finished"
                );
                Ok(ImportResult {
                    vertices: run.vertices,
                    edges: run.edges,
                    dropped_edges,
                    commits: run.batches.commits(),
                    identifiers: run.identifiers,
                })
            },
            Err(e) => {
                self.phase = ImportPhase::Failed;
                metrics::counter!("graphport_imports_total", "status" => "failed").increment(1);
                if let Err(rollback) = run.batches.rollback() {
                    tracing::warn!(error = %rollback, "rollback after failed import also failed");
                }
                tracing::warn!(
                    error = %e,
                    committed = run.batches.committed(),
                    "import failed"
                );
                Err(e)
            },
        }
    }

    /// Runs the event loop; returns the number of dropped edges.
    fn drive(&mut self, source: &mut dyn ImportSource, run: &mut Run<'a, S>) -> Result<usize> {
        while let Some(event) = source.next_event()? {
            match event {
                ImportEvent::MetadataParsed(types) => {
                    if self.phase != ImportPhase::ReadingMetadata {
                        return Err(Error::parse("metadata section appears twice"));
                    }
                    tracing::debug!(declarations = types.len(), "metadata read");
                    self.phase = ImportPhase::ReadingElements;
                },
                ImportEvent::VertexParsed(vertex) => {
                    self.require_elements_phase(ElementKind::Vertex)?;
                    self.create_vertex(run, vertex)?;
                },
                ImportEvent::EdgeParsed(edge) => {
                    self.require_elements_phase(ElementKind::Edge)?;
                    self.create_or_defer_edge(run, edge)?;
                },
            }
        }

        self.phase = ImportPhase::Finalizing;
        let dropped = self.finalize_deferred(run)?;
        run.batches.final_flush()?;
        self.report(run);
        Ok(dropped)
    }

    fn require_elements_phase(&self, kind: ElementKind) -> Result<()> {
        if self.phase == ImportPhase::ReadingElements {
            Ok(())
        } else {
            Err(Error::parse(format!("{kind} appears before the metadata section")))
        }
    }

    fn create_vertex(&self, run: &mut Run<'a, S>, vertex: VertexRecord) -> Result<()> {
        let store = self.store;
        run.identifiers.insert(&vertex.id, || {
            store.create_vertex(vertex.label.as_deref(), &vertex.attributes)
        })?;
        run.vertices += 1;
        run.batches.record_created(ElementKind::Vertex);
        run.batches.maybe_flush()?;
        self.report(run);

        for edge in run.deferred.release(&vertex.id, &run.identifiers) {
            self.create_or_defer_edge(run, edge)?;
        }
        Ok(())
    }

    fn create_or_defer_edge(&self, run: &mut Run<'a, S>, edge: EdgeRecord) -> Result<()> {
        let (source, target) = match (
            run.identifiers.get(&edge.source),
            run.identifiers.get(&edge.target),
        ) {
            (Some(s), Some(t)) => (s.clone(), t.clone()),
            (source, target) => {
                let mut missing = Vec::with_capacity(2);
                if source.is_none() {
                    missing.push(edge.source.clone());
                }
                if target.is_none() {
                    missing.push(edge.target.clone());
                }
                tracing::trace!(edge = %edge.id, ?missing, "deferring edge");
                let missing: Vec<&str> = missing.iter().map(String::as_str).collect();
                run.deferred.park(edge, &missing);
                return Ok(());
            },
        };

        self.create_edge(run, &edge, &source, &target)
    }

    fn create_edge(
        &self,
        run: &mut Run<'a, S>,
        edge: &EdgeRecord,
        source: &StoreId,
        target: &StoreId,
    ) -> Result<()> {
        self.store
            .create_edge(&edge.label, source, target, &edge.attributes)?;
        run.edges += 1;
        run.batches.record_created(ElementKind::Edge);
        run.batches.maybe_flush()?;
        self.report(run);
        Ok(())
    }

    fn finalize_deferred(&self, run: &mut Run<'a, S>) -> Result<usize> {
        if run.deferred.is_empty() {
            return Ok(0);
        }

        let identifiers = &run.identifiers;
        let unresolved: Vec<EdgeRecord> = run.deferred.drain().collect();
        if !self.options.lenient {
            let first = &unresolved[0];
            let missing = if identifiers.contains(&first.source) {
                &first.target
            } else {
                &first.source
            };
            return Err(Error::Structural(format!(
                "edge '{}' references unknown vertex '{missing}' ({} unresolved edges)",
                first.id,
                unresolved.len()
            )));
        }

        for edge in &unresolved {
            tracing::warn!(
                edge = %edge.id,
                source = %edge.source,
                target = %edge.target,
                "dropping edge with unknown endpoint"
            );
        }
        metrics::counter!("graphport_edges_dropped_total").increment(unresolved.len() as u64);
        Ok(unresolved.len())
    }

    fn report(&self, run: &Run<'a, S>) {
        if let Some(callback) = &self.progress {
            callback(&ImportProgress {
                vertices: run.vertices,
                edges: run.edges,
                deferred: run.deferred.len(),
                commits: run.batches.commits(),
            });
        }
    }
}
