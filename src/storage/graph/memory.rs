//! In-memory graph store for testing.
//!
//! Provides a fast, non-persistent implementation of [`GraphStore`] with the
//! same commit/rollback visibility rules as the `SQLite` store: iteration
//! only returns committed elements.

use crate::models::Attributes;
use crate::storage::traits::graph::{
    DEFAULT_VERTEX_CLASS, GraphStore, StoreId, StoreStats, StoredEdge, StoredVertex,
};
use crate::{Error, Result};
use std::collections::HashSet;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
struct State {
    vertices: Vec<StoredVertex>,
    edges: Vec<StoredEdge>,
    pending_vertices: Vec<StoredVertex>,
    pending_edges: Vec<StoredEdge>,
    known_vertices: HashSet<StoreId>,
    next_vertex: u64,
    next_edge: u64,
    commits: usize,
}

impl State {
    fn discard_pending(&mut self) {
        for vertex in self.pending_vertices.drain(..) {
            self.known_vertices.remove(&vertex.id);
        }
        self.pending_edges.clear();
    }
}

/// In-memory graph store for testing.
///
/// Uses `RwLock` for thread-safe access with reader-writer semantics.
/// Data is not persisted between runs.
///
/// A store built with [`Self::failing_on_commit`] rejects exactly one commit,
/// which is how batch failure boundaries are exercised in tests.
///
/// # Example
///
/// ```rust
/// use graphport::storage::{GraphStore, InMemoryGraphStore};
/// use graphport::models::Attributes;
///
/// let store = InMemoryGraphStore::new();
/// let a = store.create_vertex(Some("Person"), &Attributes::new()).unwrap();
/// let b = store.create_vertex(None, &Attributes::new()).unwrap();
/// store.create_edge("knows", &a, &b, &Attributes::new()).unwrap();
/// assert_eq!(store.stats().unwrap().vertices, 0);
/// store.commit().unwrap();
/// assert_eq!(store.stats().unwrap().edges, 1);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryGraphStore {
    state: RwLock<State>,
    fail_on_commit: Option<usize>,
}

impl InMemoryGraphStore {
    /// Creates a new empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store whose `n`th commit (1-based) fails.
    #[must_use]
    pub fn failing_on_commit(n: usize) -> Self {
        Self {
            state: RwLock::default(),
            fail_on_commit: Some(n),
        }
    }

    /// Returns the number of commit attempts so far, failed ones included.
    #[must_use]
    pub fn commit_count(&self) -> usize {
        self.state.read().map(|s| s.commits).unwrap_or(0)
    }

    /// Returns the number of created but uncommitted elements.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.state
            .read()
            .map(|s| s.pending_vertices.len() + s.pending_edges.len())
            .unwrap_or(0)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>> {
        self.state.read().map_err(|_| Error::OperationFailed {
            operation: "read_graph_store".to_string(),
            cause: "Lock poisoned".to_string(),
        })
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>> {
        self.state.write().map_err(|_| Error::OperationFailed {
            operation: "write_graph_store".to_string(),
            cause: "Lock poisoned".to_string(),
        })
    }
}

impl GraphStore for InMemoryGraphStore {
    fn create_vertex(&self, label: Option<&str>, attributes: &Attributes) -> Result<StoreId> {
        let mut state = self.write()?;
        let id = StoreId::new(format!("v{}", state.next_vertex));
        state.next_vertex += 1;
        state.known_vertices.insert(id.clone());
        state.pending_vertices.push(StoredVertex {
            id: id.clone(),
            class: label.unwrap_or(DEFAULT_VERTEX_CLASS).to_string(),
            attributes: attributes.clone(),
        });
        Ok(id)
    }

    fn create_edge(
        &self,
        label: &str,
        source: &StoreId,
        target: &StoreId,
        attributes: &Attributes,
    ) -> Result<StoreId> {
        let mut state = self.write()?;
        for endpoint in [source, target] {
            if !state.known_vertices.contains(endpoint) {
                return Err(Error::OperationFailed {
                    operation: "create_edge".to_string(),
                    cause: format!("vertex {endpoint} does not exist"),
                });
            }
        }
        let id = StoreId::new(format!("e{}", state.next_edge));
        state.next_edge += 1;
        state.pending_edges.push(StoredEdge {
            id: id.clone(),
            class: label.to_string(),
            source: source.clone(),
            target: target.clone(),
            attributes: attributes.clone(),
        });
        Ok(id)
    }

    fn commit(&self) -> Result<()> {
        let mut state = self.write()?;
        state.commits += 1;
        if self.fail_on_commit == Some(state.commits) {
            state.discard_pending();
            return Err(Error::OperationFailed {
                operation: "commit".to_string(),
                cause: format!("injected failure on commit {}", state.commits),
            });
        }
        let vertices = std::mem::take(&mut state.pending_vertices);
        let edges = std::mem::take(&mut state.pending_edges);
        state.vertices.extend(vertices);
        state.edges.extend(edges);
        Ok(())
    }

    fn rollback(&self) -> Result<()> {
        self.write()?.discard_pending();
        Ok(())
    }

    fn iterate_vertices(&self, class_filter: Option<&str>) -> Result<Vec<StoredVertex>> {
        let state = self.read()?;
        Ok(state
            .vertices
            .iter()
            .filter(|v| class_filter.is_none_or(|c| v.class == c))
            .cloned()
            .collect())
    }

    fn iterate_edges(&self, class_filter: Option<&str>) -> Result<Vec<StoredEdge>> {
        let state = self.read()?;
        Ok(state
            .edges
            .iter()
            .filter(|e| class_filter.is_none_or(|c| e.class == c))
            .cloned()
            .collect())
    }

    fn for_each_vertex(
        &self,
        class_filter: Option<&str>,
        visit: &mut dyn FnMut(StoredVertex) -> Result<()>,
    ) -> Result<()> {
        let state = self.read()?;
        state
            .vertices
            .iter()
            .filter(|v| class_filter.is_none_or(|c| v.class == c))
            .try_for_each(|v| visit(v.clone()))
    }

    fn for_each_edge(
        &self,
        class_filter: Option<&str>,
        visit: &mut dyn FnMut(StoredEdge) -> Result<()>,
    ) -> Result<()> {
        let state = self.read()?;
        state
            .edges
            .iter()
            .filter(|e| class_filter.is_none_or(|c| e.class == c))
            .try_for_each(|e| visit(e.clone()))
    }

    fn stats(&self) -> Result<StoreStats> {
        let state = self.read()?;
        Ok(StoreStats {
            vertices: state.vertices.len(),
            edges: state.edges.len(),
        })
    }
}
