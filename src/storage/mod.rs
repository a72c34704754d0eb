//! Storage layer abstraction.
//!
//! The pipelines talk to a backing store only through the [`GraphStore`]
//! trait. Two implementations ship with the crate: an in-memory store for
//! tests and a `SQLite` store for the command-line tool.

// Dropping the store lock slightly earlier buys nothing here.
#![allow(clippy::significant_drop_tightening)]

pub mod graph;
pub mod traits;

pub use graph::{InMemoryGraphStore, SqliteGraphStore};
pub use traits::{DEFAULT_VERTEX_CLASS, GraphStore, StoreId, StoreStats, StoredEdge, StoredVertex};
