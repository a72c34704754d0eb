//! Graph store implementations.
//!
//! # Available Stores
//!
//! | Store | Use Case | Persistence |
//! |-------|----------|-------------|
//! | [`SqliteGraphStore`] | Default; embedded | File or in-memory database |
//! | [`InMemoryGraphStore`] | Testing | None |

mod memory;
mod sqlite;

pub use memory::InMemoryGraphStore;
pub use sqlite::SqliteGraphStore;
