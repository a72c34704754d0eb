//! Graph export pipeline.
//!
//! Reads elements from a store, optionally filtered by class, and streams
//! them through a format writer one at a time. Store identifiers become the
//! document's external identifiers.

use crate::io::formats::{Format, WriteMode, create_export_sink};
use crate::io::traits::ExportSink;
use crate::models::{
    AttributeTypeTable, EdgeRecord, ElementKind, GraphDocumentModel, VertexRecord,
};
use crate::storage::{DEFAULT_VERTEX_CLASS, GraphStore, StoreId, StoredEdge};
use crate::{Error, Result};
use std::collections::HashSet;
use std::io::Write;
use std::path::Path;
use tracing::instrument;

/// Options for graph export.
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    /// Document format. `None` detects it from the file extension, falling
    /// back to GraphML.
    pub format: Option<Format>,
    /// Output layout.
    pub mode: WriteMode,
    /// Only export vertices of this class (and edges between them).
    pub vertex_class: Option<String>,
    /// Only export edges of this class.
    pub edge_class: Option<String>,
}

impl ExportOptions {
    /// Sets the document format.
    #[must_use]
    pub const fn with_format(mut self, format: Format) -> Self {
        self.format = Some(format);
        self
    }

    /// Sets the output layout.
    #[must_use]
    pub const fn with_mode(mut self, mode: WriteMode) -> Self {
        self.mode = mode;
        self
    }

    /// Restricts the export to one vertex class.
    #[must_use]
    pub fn with_vertex_class(mut self, class: impl Into<String>) -> Self {
        self.vertex_class = Some(class.into());
        self
    }

    /// Restricts the export to one edge class.
    #[must_use]
    pub fn with_edge_class(mut self, class: impl Into<String>) -> Self {
        self.edge_class = Some(class.into());
        self
    }
}

/// Result of an export operation.
#[derive(Debug, Clone)]
pub struct ExportResult {
    /// Number of vertices written.
    pub vertices: usize,
    /// Number of edges written.
    pub edges: usize,
    /// Format used for export.
    pub format: Format,
    /// Output path (if file export).
    pub output_path: Option<String>,
}

impl ExportResult {
    /// Creates an empty export result.
    #[must_use]
    pub const fn new(format: Format) -> Self {
        Self {
            vertices: 0,
            edges: 0,
            format,
            output_path: None,
        }
    }

    /// Returns whether anything was exported.
    #[must_use]
    pub const fn has_exports(&self) -> bool {
        self.vertices > 0 || self.edges > 0
    }
}

/// Exports a graph store to an interchange document.
///
/// Elements are streamed from the store straight into the format writer.
/// The store is read twice: once to collect the attribute declarations the
/// document header needs, then again to write the elements.
pub struct ExportPipeline<'a, S: GraphStore + ?Sized> {
    store: &'a S,
    options: ExportOptions,
}

impl<'a, S: GraphStore + ?Sized> ExportPipeline<'a, S> {
    /// Creates a pipeline reading from `store`.
    #[must_use]
    pub const fn new(store: &'a S, options: ExportOptions) -> Self {
        Self { store, options }
    }

    fn format(&self) -> Format {
        self.options.format.unwrap_or_default()
    }

    /// Exports to a file.
    ///
    /// Without an explicit format, the file extension selects one and
    /// unknown extensions get GraphML.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or the export fails.
    pub fn export_to_file(&self, path: &Path) -> Result<ExportResult> {
        let format = self
            .options
            .format
            .unwrap_or_else(|| Format::from_path(path).unwrap_or_default());

        let file = std::fs::File::create(path).map_err(|e| Error::OperationFailed {
            operation: "create_export_file".to_string(),
            cause: e.to_string(),
        })?;
        let mut sink = create_export_sink(std::io::BufWriter::new(file), format, self.options.mode);
        let mut result = self.export_as(sink.as_mut(), format)?;
        sink.finalize()?;
        result.output_path = Some(path.display().to_string());
        Ok(result)
    }

    /// Exports to a writer and finalizes the document.
    ///
    /// # Errors
    ///
    /// Returns an error if reading the store or writing fails.
    pub fn export_to_writer<W: Write>(&self, writer: W) -> Result<ExportResult> {
        let mut sink = create_export_sink(writer, self.format(), self.options.mode);
        let result = self.export_to_sink(sink.as_mut())?;
        sink.finalize()?;
        Ok(result)
    }

    /// Writes the selected elements to a sink without finalizing it.
    ///
    /// # Errors
    ///
    /// Returns an error if reading the store or writing fails.
    pub fn export_to_sink(&self, sink: &mut dyn ExportSink) -> Result<ExportResult> {
        self.export_as(sink, self.format())
    }

    #[instrument(skip_all, fields(format = %format))]
    fn export_as(&self, sink: &mut dyn ExportSink, format: Format) -> Result<ExportResult> {
        let mut result = ExportResult::new(format);
        let (vertices, edges) = self.stream(sink)?;
        result.vertices = vertices;
        result.edges = edges;

        metrics::counter!("graphport_exported_elements_total", "kind" => "vertex")
            .increment(vertices as u64);
        metrics::counter!("graphport_exported_elements_total", "kind" => "edge")
            .increment(edges as u64);
        tracing::info!(vertices, edges, "export finished");
        Ok(result)
    }

    /// Reads the selected elements into a document model.
    ///
    /// Holds the whole selection in memory; exports never go through it.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn snapshot(&self) -> Result<GraphDocumentModel> {
        let mut collector = ModelCollector::default();
        self.stream(&mut collector)?;
        Ok(collector.model)
    }

    /// Collects declarations, then writes every selected element.
    ///
    /// Attribute types are inferred from the values, since stores keep no
    /// declarations. Vertices of the default class get no label. With a
    /// vertex class filter, edges touching other vertices are left out.
    fn stream(&self, sink: &mut dyn ExportSink) -> Result<(usize, usize)> {
        let vertex_class = self.options.vertex_class.as_deref();
        let edge_class = self.options.edge_class.as_deref();

        // Ids are only kept when the vertex filter can orphan edges.
        let mut exported: Option<HashSet<StoreId>> = vertex_class.map(|_| HashSet::new());
        let mut types = AttributeTypeTable::new();
        self.store.for_each_vertex(vertex_class, &mut |vertex| {
            for (key, value) in &vertex.attributes {
                types.observe(ElementKind::Vertex, key, value);
            }
            if let Some(ids) = exported.as_mut() {
                ids.insert(vertex.id);
            }
            Ok(())
        })?;
        let keeps = |edge: &StoredEdge| {
            exported
                .as_ref()
                .is_none_or(|ids| ids.contains(&edge.source) && ids.contains(&edge.target))
        };
        self.store.for_each_edge(edge_class, &mut |edge| {
            if keeps(&edge) {
                for (key, value) in &edge.attributes {
                    types.observe(ElementKind::Edge, key, value);
                }
            }
            Ok(())
        })?;
        tracing::debug!(declarations = types.len(), "export declarations collected");

        sink.begin(&types)?;
        let mut vertices = 0usize;
        self.store.for_each_vertex(vertex_class, &mut |vertex| {
            sink.write_vertex(&VertexRecord {
                id: vertex.id.to_string(),
                label: (vertex.class != DEFAULT_VERTEX_CLASS).then_some(vertex.class),
                attributes: vertex.attributes,
            })?;
            vertices += 1;
            Ok(())
        })?;
        let mut edges = 0usize;
        self.store.for_each_edge(edge_class, &mut |edge| {
            if !keeps(&edge) {
                return Ok(());
            }
            sink.write_edge(&EdgeRecord {
                id: edge.id.to_string(),
                source: edge.source.to_string(),
                target: edge.target.to_string(),
                label: edge.class,
                attributes: edge.attributes,
            })?;
            edges += 1;
            Ok(())
        })?;
        Ok((vertices, edges))
    }
}

/// Sink that keeps everything it is given.
#[derive(Default)]
struct ModelCollector {
    model: GraphDocumentModel,
}

impl ExportSink for ModelCollector {
    fn begin(&mut self, types: &AttributeTypeTable) -> Result<()> {
        self.model.types = types.clone();
        Ok(())
    }

    fn write_vertex(&mut self, vertex: &VertexRecord) -> Result<()> {
        self.model.vertices.push(vertex.clone());
        Ok(())
    }

    fn write_edge(&mut self, edge: &EdgeRecord) -> Result<()> {
        self.model.edges.push(edge.clone());
        Ok(())
    }

    fn finalize(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AttributeType, AttributeValue, Attributes};
    use crate::storage::InMemoryGraphStore;

    fn populated_store() -> InMemoryGraphStore {
        let store = InMemoryGraphStore::new();
        let mut name = Attributes::new();
        name.insert("name".to_string(), AttributeValue::from("marko"));
        let mut weight = Attributes::new();
        weight.insert("weight".to_string(), AttributeValue::Integer(5));

        let a = store.create_vertex(Some("Person"), &name).unwrap();
        let b = store.create_vertex(Some("Person"), &Attributes::new()).unwrap();
        let c = store.create_vertex(None, &Attributes::new()).unwrap();
        store.create_edge("knows", &a, &b, &weight).unwrap();
        store.create_edge("created", &a, &c, &Attributes::new()).unwrap();
        store.commit().unwrap();
        store
    }

    #[test]
    fn test_snapshot_maps_classes_and_types() {
        let store = populated_store();
        let model = ExportPipeline::new(&store, ExportOptions::default())
            .snapshot()
            .unwrap();

        assert_eq!(model.vertices.len(), 3);
        assert_eq!(model.edges.len(), 2);
        assert_eq!(model.vertices[0].label.as_deref(), Some("Person"));
        assert!(model.vertices[2].label.is_none());
        assert_eq!(
            model.types.type_of(ElementKind::Edge, "weight"),
            Some(AttributeType::Integer)
        );
    }

    #[test]
    fn test_vertex_class_filter_drops_dangling_edges() {
        let store = populated_store();
        let options = ExportOptions::default().with_vertex_class("Person");
        let model = ExportPipeline::new(&store, options).snapshot().unwrap();
        assert_eq!(model.vertices.len(), 2);
        assert_eq!(model.edges.len(), 1);
        assert_eq!(model.edges[0].label, "knows");
    }

    #[test]
    fn test_edge_class_filter() {
        let store = populated_store();
        let options = ExportOptions::default().with_edge_class("created");
        let model = ExportPipeline::new(&store, options).snapshot().unwrap();
        assert_eq!(model.vertices.len(), 3);
        assert_eq!(model.edges.len(), 1);
    }

    #[test]
    fn test_export_to_writer() {
        let store = populated_store();
        let mut out = Vec::new();
        let result = ExportPipeline::new(
            &store,
            ExportOptions::default()
                .with_format(Format::GraphSon)
                .with_mode(WriteMode::Compact),
        )
        .export_to_writer(&mut out)
        .unwrap();

        assert_eq!((result.vertices, result.edges), (3, 2));
        assert!(result.has_exports());
        let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(json["vertices"].as_array().unwrap().len(), 3);
        assert_eq!(json["edges"][0]["_label"], "knows");
    }

    /// Records sink calls; fails on the given call number.
    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
        fail_at: Option<usize>,
    }

    impl Recorder {
        fn record(&mut self, call: String) -> Result<()> {
            if self.fail_at == Some(self.calls.len()) {
                return Err(Error::Write("disk full".to_string()));
            }
            self.calls.push(call);
            Ok(())
        }
    }

    impl ExportSink for Recorder {
        fn begin(&mut self, types: &AttributeTypeTable) -> Result<()> {
            self.record(format!("begin {}", types.len()))
        }

        fn write_vertex(&mut self, vertex: &VertexRecord) -> Result<()> {
            self.record(format!("vertex {}", vertex.id))
        }

        fn write_edge(&mut self, edge: &EdgeRecord) -> Result<()> {
            self.record(format!("edge {}", edge.id))
        }

        fn finalize(self: Box<Self>) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_export_streams_declarations_then_elements() {
        let store = populated_store();
        let mut sink = Recorder::default();
        let result = ExportPipeline::new(&store, ExportOptions::default())
            .export_to_sink(&mut sink)
            .unwrap();

        assert_eq!((result.vertices, result.edges), (3, 2));
        assert_eq!(
            sink.calls,
            vec!["begin 2", "vertex v0", "vertex v1", "vertex v2", "edge e0", "edge e1"]
        );
    }

    #[test]
    fn test_sink_error_stops_export() {
        let store = populated_store();
        let mut sink = Recorder {
            fail_at: Some(2),
            ..Recorder::default()
        };
        let err = ExportPipeline::new(&store, ExportOptions::default())
            .export_to_sink(&mut sink)
            .unwrap_err();

        assert!(matches!(err, Error::Write(_)), "{err:?}");
        assert_eq!(sink.calls, vec!["begin 2", "vertex v0"]);
    }

    #[test]
    fn test_filtered_declarations_skip_orphaned_edges() {
        let store = populated_store();
        let mut attributes = Attributes::new();
        attributes.insert("since".to_string(), AttributeValue::Integer(2010));
        let vertices = store.iterate_vertices(None).unwrap();
        store
            .create_edge("knows", &vertices[0].id, &vertices[2].id, &attributes)
            .unwrap();
        store.commit().unwrap();

        let options = ExportOptions::default().with_vertex_class("Person");
        let model = ExportPipeline::new(&store, options).snapshot().unwrap();
        assert_eq!(model.edges.len(), 1);
        assert!(model.types.get(ElementKind::Edge, "since").is_none());
    }
}
