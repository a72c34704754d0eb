//! Storage traits.

pub mod graph;

pub use graph::{DEFAULT_VERTEX_CLASS, GraphStore, StoreId, StoreStats, StoredEdge, StoredVertex};
