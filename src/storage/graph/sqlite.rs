//! `SQLite` graph store.
//!
//! Vertices and edges live in two tables; attributes are stored as a JSON
//! object per element. Element creation runs inside an explicit transaction
//! that [`GraphStore::commit`] closes.

// SQLite rowids are positive and counts are small.
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

use crate::models::{AttributeValue, Attributes};
use crate::storage::traits::graph::{
    DEFAULT_VERTEX_CLASS, GraphStore, StoreId, StoreStats, StoredEdge, StoredVertex,
};
use crate::{Error, Result};
use rusqlite::{Connection, params};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::instrument;

/// Helper to acquire mutex lock with poison recovery.
fn acquire_lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::warn!("Graph SQLite mutex was poisoned, recovering");
            metrics::counter!("graph_sqlite_mutex_poison_recovery_total").increment(1);
            poisoned.into_inner()
        },
    }
}

fn failed(operation: &str) -> impl FnOnce(rusqlite::Error) -> Error + '_ {
    move |e| Error::OperationFailed {
        operation: operation.to_string(),
        cause: e.to_string(),
    }
}

struct Session {
    conn: Connection,
    in_transaction: bool,
}

impl Session {
    fn begin(&mut self) -> Result<()> {
        if !self.in_transaction {
            self.conn
                .execute_batch("BEGIN")
                .map_err(failed("begin_transaction"))?;
            self.in_transaction = true;
        }
        Ok(())
    }
}

/// `SQLite`-based graph store.
///
/// # Concurrency Model
///
/// Uses a `Mutex` around the connection for thread-safe access. WAL mode and
/// `busy_timeout` handle concurrent readers from other processes.
///
/// # Schema
///
/// - `graph_vertices`: `id`, `class`, `attributes` (JSON)
/// - `graph_edges`: `id`, `class`, `source`, `target`, `attributes` (JSON)
///
/// Store identifiers are `v<rowid>` and `e<rowid>`.
pub struct SqliteGraphStore {
    session: Mutex<Session>,
    db_path: Option<PathBuf>,
}

impl SqliteGraphStore {
    /// Opens (or creates) a store at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn new(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        let conn = Connection::open(&db_path).map_err(failed("open_graph_sqlite"))?;
        Self::with_connection(conn, Some(db_path))
    }

    /// Creates an in-memory store (useful for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(failed("open_graph_sqlite_memory"))?;
        Self::with_connection(conn, None)
    }

    fn with_connection(conn: Connection, db_path: Option<PathBuf>) -> Result<Self> {
        let store = Self {
            session: Mutex::new(Session {
                conn,
                in_transaction: false,
            }),
            db_path,
        };
        store.initialize()?;
        match store.db_path() {
            Some(path) => tracing::info!(path = %path.display(), "graph store opened"),
            None => tracing::info!("in-memory graph store opened"),
        }
        Ok(store)
    }

    /// Returns the database path.
    #[must_use]
    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    fn initialize(&self) -> Result<()> {
        let session = acquire_lock(&self.session);
        let conn = &session.conn;

        let _ = conn.pragma_update(None, "journal_mode", "WAL");
        let _ = conn.pragma_update(None, "synchronous", "NORMAL");
        let _ = conn.pragma_update(None, "busy_timeout", "5000");
        let _ = conn.pragma_update(None, "foreign_keys", "ON");

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS graph_vertices (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                class TEXT NOT NULL,
                attributes TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS graph_edges (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                class TEXT NOT NULL,
                source INTEGER NOT NULL REFERENCES graph_vertices(id),
                target INTEGER NOT NULL REFERENCES graph_vertices(id),
                attributes TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_graph_vertices_class ON graph_vertices(class);
            CREATE INDEX IF NOT EXISTS idx_graph_edges_class ON graph_edges(class);",
        )
        .map_err(failed("create_graph_tables"))
    }
}

fn encode_attributes(attributes: &Attributes) -> String {
    let object: Map<String, Value> = attributes
        .iter()
        .map(|(k, v)| (k.clone(), v.to_json()))
        .collect();
    Value::Object(object).to_string()
}

fn decode_attributes(text: &str) -> Result<Attributes> {
    let value: Value = serde_json::from_str(text).map_err(|e| Error::OperationFailed {
        operation: "decode_attributes".to_string(),
        cause: e.to_string(),
    })?;
    let mut attributes = Attributes::new();
    if let Value::Object(object) = value {
        for (key, value) in object {
            if let Some(v) = AttributeValue::from_json(&value)? {
                attributes.insert(key, v);
            }
        }
    }
    Ok(attributes)
}

fn row_id(id: &StoreId, prefix: char) -> Result<i64> {
    id.as_str()
        .strip_prefix(prefix)
        .and_then(|n| n.parse().ok())
        .ok_or_else(|| Error::OperationFailed {
            operation: "resolve_store_id".to_string(),
            cause: format!("'{id}' is not a {prefix}-identifier of this store"),
        })
}

fn vertex_id(rowid: i64) -> StoreId {
    StoreId::new(format!("v{rowid}"))
}

impl GraphStore for SqliteGraphStore {
    #[instrument(skip(self, attributes), fields(attributes = attributes.len()))]
    fn create_vertex(&self, label: Option<&str>, attributes: &Attributes) -> Result<StoreId> {
        let mut session = acquire_lock(&self.session);
        session.begin()?;
        session
            .conn
            .execute(
                "INSERT INTO graph_vertices (class, attributes) VALUES (?1, ?2)",
                params![
                    label.unwrap_or(DEFAULT_VERTEX_CLASS),
                    encode_attributes(attributes)
                ],
            )
            .map_err(failed("create_vertex"))?;
        Ok(vertex_id(session.conn.last_insert_rowid()))
    }

    #[instrument(skip(self, attributes), fields(source = %source, target = %target))]
    fn create_edge(
        &self,
        label: &str,
        source: &StoreId,
        target: &StoreId,
        attributes: &Attributes,
    ) -> Result<StoreId> {
        let source = row_id(source, 'v')?;
        let target = row_id(target, 'v')?;
        let mut session = acquire_lock(&self.session);
        session.begin()?;
        session
            .conn
            .execute(
                "INSERT INTO graph_edges (class, source, target, attributes) VALUES (?1, ?2, ?3, ?4)",
                params![label, source, target, encode_attributes(attributes)],
            )
            .map_err(failed("create_edge"))?;
        Ok(StoreId::new(format!("e{}", session.conn.last_insert_rowid())))
    }

    fn commit(&self) -> Result<()> {
        let mut session = acquire_lock(&self.session);
        if !session.in_transaction {
            return Ok(());
        }
        session.in_transaction = false;
        if let Err(e) = session.conn.execute_batch("COMMIT") {
            // A failed COMMIT can leave the transaction open.
            let _ = session.conn.execute_batch("ROLLBACK");
            return Err(failed("commit")(e));
        }
        Ok(())
    }

    fn rollback(&self) -> Result<()> {
        let mut session = acquire_lock(&self.session);
        if !session.in_transaction {
            return Ok(());
        }
        session.in_transaction = false;
        session
            .conn
            .execute_batch("ROLLBACK")
            .map_err(failed("rollback"))
    }

    fn iterate_vertices(&self, class_filter: Option<&str>) -> Result<Vec<StoredVertex>> {
        let mut vertices = Vec::new();
        self.for_each_vertex(class_filter, &mut |vertex| {
            vertices.push(vertex);
            Ok(())
        })?;
        Ok(vertices)
    }

    fn iterate_edges(&self, class_filter: Option<&str>) -> Result<Vec<StoredEdge>> {
        let mut edges = Vec::new();
        self.for_each_edge(class_filter, &mut |edge| {
            edges.push(edge);
            Ok(())
        })?;
        Ok(edges)
    }

    fn for_each_vertex(
        &self,
        class_filter: Option<&str>,
        visit: &mut dyn FnMut(StoredVertex) -> Result<()>,
    ) -> Result<()> {
        let session = acquire_lock(&self.session);
        let mut stmt = session
            .conn
            .prepare(
                "SELECT id, class, attributes FROM graph_vertices
                 WHERE ?1 IS NULL OR class = ?1 ORDER BY id",
            )
            .map_err(failed("iterate_vertices"))?;
        let mut rows = stmt
            .query(params![class_filter])
            .map_err(failed("iterate_vertices"))?;

        while let Some(row) = rows.next().map_err(failed("iterate_vertices"))? {
            let id: i64 = row.get(0).map_err(failed("iterate_vertices"))?;
            let class: String = row.get(1).map_err(failed("iterate_vertices"))?;
            let attributes: String = row.get(2).map_err(failed("iterate_vertices"))?;
            visit(StoredVertex {
                id: vertex_id(id),
                class,
                attributes: decode_attributes(&attributes)?,
            })?;
        }
        Ok(())
    }

    fn for_each_edge(
        &self,
        class_filter: Option<&str>,
        visit: &mut dyn FnMut(StoredEdge) -> Result<()>,
    ) -> Result<()> {
        let session = acquire_lock(&self.session);
        let mut stmt = session
            .conn
            .prepare(
                "SELECT id, class, source, target, attributes FROM graph_edges
                 WHERE ?1 IS NULL OR class = ?1 ORDER BY id",
            )
            .map_err(failed("iterate_edges"))?;
        let mut rows = stmt
            .query(params![class_filter])
            .map_err(failed("iterate_edges"))?;

        while let Some(row) = rows.next().map_err(failed("iterate_edges"))? {
            let id: i64 = row.get(0).map_err(failed("iterate_edges"))?;
            let class: String = row.get(1).map_err(failed("iterate_edges"))?;
            let source: i64 = row.get(2).map_err(failed("iterate_edges"))?;
            let target: i64 = row.get(3).map_err(failed("iterate_edges"))?;
            let attributes: String = row.get(4).map_err(failed("iterate_edges"))?;
            visit(StoredEdge {
                id: StoreId::new(format!("e{id}")),
                class,
                source: vertex_id(source),
                target: vertex_id(target),
                attributes: decode_attributes(&attributes)?,
            })?;
        }
        Ok(())
    }

    fn stats(&self) -> Result<StoreStats> {
        let session = acquire_lock(&self.session);
        let count = |table: &str| -> Result<usize> {
            session
                .conn
                .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                    row.get::<_, i64>(0)
                })
                .map(|n| n as usize)
                .map_err(failed("count_elements"))
        };
        Ok(StoreStats {
            vertices: count("graph_vertices")?,
            edges: count("graph_edges")?,
        })
    }
}
