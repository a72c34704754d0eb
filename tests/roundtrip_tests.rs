//! Round-trip tests: store → document → store.
//!
//! A generated graph is exported, re-imported into a fresh store, and the
//! two stores are compared element by element.

// Integration tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used, clippy::cast_precision_loss)]

use graphport::io::{
    ExportOptions, ExportPipeline, Format, ImportOptions, ImportPipeline, ReadOptions, WriteMode,
    create_export_sink, create_import_source,
};
use graphport::models::{AttributeDeclaration, Attributes, EdgeRecord, VertexRecord};
use graphport::storage::{GraphStore, InMemoryGraphStore, SqliteGraphStore};
use graphport::{AttributeType, AttributeValue, ElementKind, GraphDocumentModel};
use test_case::test_case;

const VERTICES: usize = 100;
const EDGES: usize = 150;

fn populate<S: GraphStore>(store: &S) {
    let mut ids = Vec::with_capacity(VERTICES);
    for i in 0..VERTICES {
        let mut attributes = Attributes::new();
        attributes.insert("name".to_string(), AttributeValue::from(format!("vertex <{i}> & co")));
        attributes.insert("rank".to_string(), AttributeValue::Integer(i as i64 * 7 - 300));
        attributes.insert("score".to_string(), AttributeValue::Float(i as f64 / 8.0));
        attributes.insert("active".to_string(), AttributeValue::Boolean(i % 3 == 0));
        if i % 5 == 0 {
            attributes.insert(
                "tags".to_string(),
                AttributeValue::List(vec!["x".into(), AttributeValue::Integer(i as i64)]),
            );
        }
        let label = match i % 3 {
            0 => Some("Person"),
            1 => Some("Software"),
            _ => None,
        };
        ids.push(store.create_vertex(label, &attributes).unwrap());
    }

    for i in 0..EDGES {
        let source = &ids[(i * 7) % VERTICES];
        let target = &ids[(i * 13 + 1) % VERTICES];
        let mut attributes = Attributes::new();
        if i % 2 == 0 {
            attributes.insert("weight".to_string(), AttributeValue::Float(i as f64 + 0.25));
        }
        let label = if i % 4 == 0 { "created" } else { "knows" };
        store.create_edge(label, source, target, &attributes).unwrap();
    }
    store.commit().unwrap();
}

fn snapshot<S: GraphStore>(store: &S) -> GraphDocumentModel {
    ExportPipeline::new(store, ExportOptions::default())
        .snapshot()
        .unwrap()
}

fn export<S: GraphStore>(store: &S, format: Format, mode: WriteMode) -> Vec<u8> {
    let mut out = Vec::new();
    let result = ExportPipeline::new(
        store,
        ExportOptions::default().with_format(format).with_mode(mode),
    )
    .export_to_writer(&mut out)
    .unwrap();
    assert_eq!((result.vertices, result.edges), (VERTICES, EDGES));
    out
}

/// Writes a model and reads it back.
fn rewrite(model: &GraphDocumentModel, format: Format, mode: WriteMode) -> GraphDocumentModel {
    let mut out = Vec::new();
    let mut sink = create_export_sink(&mut out, format, mode);
    sink.write_model(model).unwrap();
    sink.finalize().unwrap();

    let mut source = create_import_source(out.as_slice(), format, ReadOptions::default());
    GraphDocumentModel::from_source(source.as_mut()).unwrap()
}

#[test_case(Format::GraphMl ; "graphml")]
#[test_case(Format::GraphSon ; "graphson")]
fn test_empty_string_survives_declared_default(format: Format) {
    let mut model = GraphDocumentModel::new()
        .with_vertex(VertexRecord::new("1").with_attribute("nick", ""))
        .with_vertex(VertexRecord::new("2").with_attribute("nick", "bob"))
        .with_vertex(VertexRecord::new("3"))
        .with_edge(EdgeRecord::new("7", "1", "2", "knows").with_attribute("note", ""));
    model.types.declare(
        ElementKind::Vertex,
        AttributeDeclaration {
            default: Some(AttributeValue::from("anon")),
            ..AttributeDeclaration::new("nick", AttributeType::String)
        },
    );
    model.declare_observed_types();

    let back = rewrite(&model, format, WriteMode::Compact);
    assert!(model.same_graph(&back), "{back:#?}");
    let nicks: Vec<_> = back.vertices.iter().map(|v| v.attributes.get("nick")).collect();
    assert_eq!(
        nicks,
        vec![Some(&AttributeValue::from("")), Some(&AttributeValue::from("bob")), None]
    );
}

#[test_case(Format::GraphMl, WriteMode::Pretty ; "graphml pretty")]
#[test_case(Format::GraphMl, WriteMode::Compact ; "graphml compact")]
#[test_case(Format::GraphSon, WriteMode::Pretty ; "graphson pretty")]
#[test_case(Format::GraphSon, WriteMode::Compact ; "graphson compact")]
fn test_store_roundtrip(format: Format, mode: WriteMode) {
    let original = InMemoryGraphStore::new();
    populate(&original);
    let document = export(&original, format, mode);

    let copy = InMemoryGraphStore::new();
    let result = ImportPipeline::new(
        &copy,
        ImportOptions::default().with_format(format).with_batch_size(64),
    )
    .import_from_reader(document.as_slice())
    .unwrap();
    assert_eq!((result.vertices, result.edges), (VERTICES, EDGES));
    assert_eq!(result.dropped_edges, 0);

    let before = snapshot(&original);
    let after = snapshot(&copy);
    assert!(before.same_graph(&after));
    assert_eq!(before.types, after.types);
}

#[test]
fn test_export_is_stable_across_roundtrip() {
    let original = InMemoryGraphStore::new();
    populate(&original);
    let first = export(&original, Format::GraphSon, WriteMode::Compact);

    let copy = InMemoryGraphStore::new();
    ImportPipeline::new(&copy, ImportOptions::default().with_format(Format::GraphSon))
        .import_from_reader(first.as_slice())
        .unwrap();
    let second = export(&copy, Format::GraphSon, WriteMode::Compact);

    assert_eq!(first, second);
}

#[test]
fn test_cross_format_roundtrip_through_sqlite() {
    let original = SqliteGraphStore::in_memory().unwrap();
    populate(&original);
    let graphml = export(&original, Format::GraphMl, WriteMode::Pretty);

    let middle = InMemoryGraphStore::new();
    ImportPipeline::new(&middle, ImportOptions::default().with_format(Format::GraphMl))
        .import_from_reader(graphml.as_slice())
        .unwrap();
    let graphson = export(&middle, Format::GraphSon, WriteMode::Pretty);

    let last = InMemoryGraphStore::new();
    ImportPipeline::new(&last, ImportOptions::default().with_format(Format::GraphSon))
        .import_from_reader(graphson.as_slice())
        .unwrap();

    let before = snapshot(&middle);
    let after = snapshot(&last);
    assert!(before.same_graph(&after));
    assert_eq!(snapshot(&original).types, after.types);
}
