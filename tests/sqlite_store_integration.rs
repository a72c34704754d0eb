//! Integration tests for the `SQLite` graph store.
//!
//! Uses on-disk databases in temporary directories to check that committed
//! batches persist and uncommitted work does not.

// Integration tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used)]

use graphport::io::{ExportOptions, ExportPipeline, Format, ImportOptions, ImportPipeline};
use graphport::models::Attributes;
use graphport::storage::{GraphStore, SqliteGraphStore};
use graphport::{AttributeValue, Error};
use tempfile::TempDir;

const PEOPLE: &str = r#"{
    "mode": "EXTENDED",
    "vertices": [
        {"_id": "1", "_type": "vertex", "name": {"type": "string", "value": "marko"}, "age": {"type": "integer", "value": 29}},
        {"_id": "2", "_type": "vertex", "name": {"type": "string", "value": "vadas"}},
        {"_id": "3", "_type": "vertex", "name": {"type": "string", "value": "lop"}}
    ],
    "edges": [
        {"_id": "7", "_type": "edge", "_outV": "1", "_inV": "2", "_label": "knows", "weight": {"type": "float", "value": 0.5}},
        {"_id": "9", "_type": "edge", "_outV": "1", "_inV": "3", "_label": "created"}
    ]
}"#;

fn open(dir: &TempDir) -> SqliteGraphStore {
    let path = dir.path().join("graph.db");
    let store = SqliteGraphStore::new(&path).unwrap();
    assert_eq!(store.db_path(), Some(path.as_path()));
    store
}

#[test]
fn test_import_persists_across_reopen() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("people.json");
    std::fs::write(&input, PEOPLE).unwrap();

    {
        let store = open(&dir);
        let result = ImportPipeline::new(&store, ImportOptions::default().with_batch_size(2))
            .import_from_file(&input)
            .unwrap();
        assert_eq!((result.vertices, result.edges, result.commits), (3, 2, 3));
    }

    let store = open(&dir);
    let stats = store.stats().unwrap();
    assert_eq!((stats.vertices, stats.edges), (3, 2));

    let knows = store.iterate_edges(Some("knows")).unwrap();
    assert_eq!(knows.len(), 1);
    assert_eq!(knows[0].attributes.get("weight"), Some(&AttributeValue::Float(0.5)));

    let vertices = store.iterate_vertices(None).unwrap();
    assert!(vertices.iter().all(|v| v.class == "V"));
    assert_eq!(vertices[0].attributes.get("age"), Some(&AttributeValue::Integer(29)));
}

#[test]
fn test_failed_import_leaves_committed_batches_on_disk() {
    let dir = TempDir::new().unwrap();
    let input = r#"{"vertices": [{"_id": "a"}, {"_id": "b"}, {"_id": "c"}],
                    "edges": [{"_outV": "a", "_inV": "missing"}]}"#;

    {
        let store = open(&dir);
        let err = ImportPipeline::new(
            &store,
            ImportOptions::default()
                .with_format(Format::GraphSon)
                .with_batch_size(2),
        )
        .import_from_reader(input.as_bytes())
        .unwrap_err();
        assert!(matches!(err, Error::Structural(_)), "{err:?}");
    }

    let store = open(&dir);
    assert_eq!(store.stats().unwrap().vertices, 2);
    assert_eq!(store.stats().unwrap().edges, 0);
}

#[test]
fn test_rollback_discards_uncommitted() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir);
    let a = store.create_vertex(Some("Person"), &Attributes::new()).unwrap();
    store.commit().unwrap();

    let b = store.create_vertex(None, &Attributes::new()).unwrap();
    store.create_edge("knows", &a, &b, &Attributes::new()).unwrap();
    store.rollback().unwrap();
    drop(store);

    let store = open(&dir);
    let stats = store.stats().unwrap();
    assert_eq!((stats.vertices, stats.edges), (1, 0));
    assert_eq!(store.iterate_vertices(Some("Person")).unwrap().len(), 1);
}

#[test]
fn test_export_to_file() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir);
    ImportPipeline::new(&store, ImportOptions::default().with_format(Format::GraphSon))
        .import_from_reader(PEOPLE.as_bytes())
        .unwrap();

    let output = dir.path().join("out.graphml");
    let result = ExportPipeline::new(&store, ExportOptions::default().with_edge_class("knows"))
        .export_to_file(&output)
        .unwrap();

    assert_eq!(result.format, Format::GraphMl);
    assert_eq!((result.vertices, result.edges), (3, 1));
    assert_eq!(result.output_path.as_deref(), Some(output.display().to_string().as_str()));

    let text = std::fs::read_to_string(&output).unwrap();
    assert!(text.contains("<graphml"));
    assert!(text.contains("label=\"knows\""));
    assert!(!text.contains("created"));
}

#[test]
fn test_export_to_missing_directory_fails() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir);
    let err = ExportPipeline::new(&store, ExportOptions::default())
        .export_to_file(&dir.path().join("no/such/dir/out.json"))
        .unwrap_err();
    assert!(matches!(err, Error::OperationFailed { ref operation, .. } if operation == "create_export_file"));
}
