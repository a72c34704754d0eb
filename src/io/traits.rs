//! Core traits for import/export operations.
//!
//! Defines the [`ImportSource`] and [`ExportSink`] traits that format adapters
//! implement to support GraphML and GraphSON.

use crate::Result;
use crate::models::{AttributeTypeTable, EdgeRecord, GraphDocumentModel, VertexRecord};

/// One unit of parsed document content.
#[derive(Debug, Clone, PartialEq)]
pub enum ImportEvent {
    /// Attribute declarations. Emitted exactly once, before any element.
    MetadataParsed(AttributeTypeTable),
    /// A vertex with strategies already applied.
    VertexParsed(VertexRecord),
    /// An edge with strategies already applied. Endpoints are unresolved.
    EdgeParsed(EdgeRecord),
}

/// Source of import events.
///
/// Implementations read a document incrementally and yield one event per
/// metadata section or element. The sequence is finite, single-pass, and not
/// restartable: the underlying byte stream is consumed once.
///
/// # Streaming
///
/// Sources must not load the whole document into memory. A stream that is
/// closed or fails mid-document ends the sequence with an error rather than
/// blocking.
///
/// # Example Implementation
///
/// ```rust,ignore
/// impl<R: BufRead> ImportSource for MySource<R> {
///     fn next_event(&mut self) -> Result<Option<ImportEvent>> {
///         // Parse the next node/edge, coerce and apply strategies
///     }
/// }
/// ```
pub trait ImportSource {
    /// Reads the next event from the source.
    ///
    /// Returns `Ok(None)` when the document is exhausted.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Parse`] for malformed content and
    /// [`crate::Error::Read`] for stream failures.
    fn next_event(&mut self) -> Result<Option<ImportEvent>>;
}

impl<S: ImportSource + ?Sized> ImportSource for Box<S> {
    fn next_event(&mut self) -> Result<Option<ImportEvent>> {
        (**self).next_event()
    }
}

/// Iterator adapter over an [`ImportSource`].
///
/// Yields `Err` at most once; the iterator is fused after an error or the end
/// of the document.
pub struct ImportEvents<'a, S: ImportSource + ?Sized> {
    source: &'a mut S,
    done: bool,
}

impl<S: ImportSource + ?Sized> Iterator for ImportEvents<'_, S> {
    type Item = Result<ImportEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.source.next_event() {
            Ok(Some(event)) => Some(Ok(event)),
            Ok(None) => {
                self.done = true;
                None
            },
            Err(e) => {
                self.done = true;
                Some(Err(e))
            },
        }
    }
}

impl<S: ImportSource + ?Sized> std::iter::FusedIterator for ImportEvents<'_, S> {}

/// Adapts an import source into an iterator of events.
pub fn events<S: ImportSource + ?Sized>(source: &mut S) -> ImportEvents<'_, S> {
    ImportEvents {
        source,
        done: false,
    }
}

/// Sink for exported graph elements.
///
/// # Lifecycle
///
/// 1. Create sink with output destination
/// 2. Call `begin()` with the attribute declarations
/// 3. Call `write_vertex()` / `write_edge()` for each element
/// 4. Call `finalize()` to close the document
///
/// Vertices should be written before edges whenever the caller can order
/// them; readers tolerate forward references either way.
pub trait ExportSink {
    /// Writes the document header and attribute declarations.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or I/O fails, or if called twice.
    fn begin(&mut self, types: &AttributeTypeTable) -> Result<()>;

    /// Writes a single vertex.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or I/O fails, or if `begin` was not called.
    fn write_vertex(&mut self, vertex: &VertexRecord) -> Result<()>;

    /// Writes a single edge.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or I/O fails, or if `begin` was not called.
    fn write_edge(&mut self, edge: &EdgeRecord) -> Result<()>;

    /// Closes the document and flushes buffers.
    ///
    /// This method consumes the sink.
    ///
    /// # Errors
    ///
    /// Returns an error if I/O fails.
    fn finalize(self: Box<Self>) -> Result<()>;

    /// Writes a whole model: declarations, vertices, then edges.
    ///
    /// Does not finalize the sink.
    ///
    /// # Errors
    ///
    /// Returns the first write error.
    fn write_model(&mut self, model: &GraphDocumentModel) -> Result<()> {
        self.begin(&model.types)?;
        for vertex in &model.vertices {
            self.write_vertex(vertex)?;
        }
        for edge in &model.edges {
            self.write_edge(edge)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use std::collections::VecDeque;

    struct Scripted(VecDeque<Result<Option<ImportEvent>>>);

    impl ImportSource for Scripted {
        fn next_event(&mut self) -> Result<Option<ImportEvent>> {
            self.0.pop_front().unwrap_or(Ok(None))
        }
    }

    #[test]
    fn test_events_fuses_after_error() {
        let mut source = Scripted(VecDeque::from(vec![
            Ok(Some(ImportEvent::MetadataParsed(AttributeTypeTable::new()))),
            Err(Error::Read("connection reset".to_string())),
            Ok(Some(ImportEvent::VertexParsed(VertexRecord::new("1")))),
        ]));

        let collected: Vec<_> = events(&mut source).collect();
        assert_eq!(collected.len(), 2);
        assert!(collected[0].is_ok());
        assert!(matches!(collected[1], Err(Error::Read(_))));
    }

    #[test]
    fn test_events_ends_at_document_end() {
        let mut source = Scripted(VecDeque::from(vec![
            Ok(Some(ImportEvent::MetadataParsed(AttributeTypeTable::new()))),
            Ok(Some(ImportEvent::VertexParsed(VertexRecord::new("1")))),
        ]));
        let mut iter = events(&mut source);
        assert!(iter.next().is_some());
        assert!(iter.next().is_some());
        assert!(iter.next().is_none());
        assert!(iter.next().is_none());
    }
}
