//! Graph store trait consumed by the import and export pipelines.
//!
//! # Available Implementations
//!
//! | Store | Use Case | Transactions |
//! |-------|----------|--------------|
//! | `InMemoryGraphStore` | Tests, dry runs | Pending buffer swapped in on commit |
//! | `SqliteGraphStore` | Default; embedded | `BEGIN`/`COMMIT`/`ROLLBACK` |
//!
//! # Transaction Model
//!
//! Element creation opens an implicit transaction. [`GraphStore::commit`]
//! makes everything created since the previous commit durable in one atomic
//! step; [`GraphStore::rollback`] discards it. Nothing else about the store's
//! transaction semantics is assumed.

use crate::Result;
use crate::models::Attributes;
use std::fmt;

/// Class assigned to vertices created without a label.
pub const DEFAULT_VERTEX_CLASS: &str = "V";

/// Identifier assigned by the store, distinct from document identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StoreId(String);

impl StoreId {
    /// Wraps a store-specific identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A vertex as held by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredVertex {
    /// Store identifier.
    pub id: StoreId,
    /// Vertex class (label).
    pub class: String,
    /// Attribute values.
    pub attributes: Attributes,
}

/// An edge as held by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredEdge {
    /// Store identifier.
    pub id: StoreId,
    /// Edge class (label).
    pub class: String,
    /// Source vertex.
    pub source: StoreId,
    /// Target vertex.
    pub target: StoreId,
    /// Attribute values.
    pub attributes: Attributes,
}

/// Element counts reported by a store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// Number of vertices.
    pub vertices: usize,
    /// Number of edges.
    pub edges: usize,
}

/// Backing graph store.
///
/// # Implementor Notes
///
/// - Methods use `&self` to enable sharing via `Arc<dyn GraphStore>`
/// - Use interior mutability (e.g., `Mutex<Connection>`) for mutable state
/// - `create_edge` receives store identifiers; endpoints must already exist
///   in the current transaction or a committed one
pub trait GraphStore: Send + Sync {
    /// Creates a vertex. `None` uses [`DEFAULT_VERTEX_CLASS`].
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the vertex.
    fn create_vertex(&self, label: Option<&str>, attributes: &Attributes) -> Result<StoreId>;

    /// Creates an edge between two existing vertices.
    ///
    /// # Errors
    ///
    /// Returns an error if an endpoint does not exist or the store rejects the edge.
    fn create_edge(
        &self,
        label: &str,
        source: &StoreId,
        target: &StoreId,
        attributes: &Attributes,
    ) -> Result<StoreId>;

    /// Commits everything created since the previous commit.
    ///
    /// # Errors
    ///
    /// Returns an error if the commit fails; the uncommitted elements are lost.
    fn commit(&self) -> Result<()>;

    /// Discards everything created since the previous commit.
    ///
    /// # Errors
    ///
    /// Returns an error if the rollback fails.
    fn rollback(&self) -> Result<()>;

    /// Lists vertices, optionally restricted to one class.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn iterate_vertices(&self, class_filter: Option<&str>) -> Result<Vec<StoredVertex>>;

    /// Lists edges, optionally restricted to one class.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn iterate_edges(&self, class_filter: Option<&str>) -> Result<Vec<StoredEdge>>;

    /// Visits vertices one at a time, optionally restricted to one class.
    ///
    /// Stops at the first error returned by `visit`. The default collects
    /// [`Self::iterate_vertices`] first; stores that can hand out rows one by
    /// one override it. `visit` must not call back into the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read or `visit` fails.
    fn for_each_vertex(
        &self,
        class_filter: Option<&str>,
        visit: &mut dyn FnMut(StoredVertex) -> Result<()>,
    ) -> Result<()> {
        self.iterate_vertices(class_filter)?
            .into_iter()
            .try_for_each(visit)
    }

    /// Visits edges one at a time, optionally restricted to one class.
    ///
    /// Same contract as [`Self::for_each_vertex`].
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read or `visit` fails.
    fn for_each_edge(
        &self,
        class_filter: Option<&str>,
        visit: &mut dyn FnMut(StoredEdge) -> Result<()>,
    ) -> Result<()> {
        self.iterate_edges(class_filter)?
            .into_iter()
            .try_for_each(visit)
    }

    /// Returns element counts.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn stats(&self) -> Result<StoreStats> {
        Ok(StoreStats {
            vertices: self.iterate_vertices(None)?.len(),
            edges: self.iterate_edges(None)?.len(),
        })
    }
}
