//! Benchmarks for document import.
//!
//! Measures GraphML and GraphSON import throughput into the in-memory store
//! for a few graph sizes and batch sizes.

// Criterion macros generate items without docs - this is expected for benchmarks
// Benchmarks use expect/unwrap for simplicity - panics are acceptable in benchmarks
#![allow(missing_docs)]
#![allow(clippy::expect_used, clippy::unwrap_used, clippy::cast_possible_wrap, clippy::cast_precision_loss)]

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use graphport::io::{
    ExportOptions, ExportPipeline, Format, ImportOptions, ImportPipeline, WriteMode,
};
use graphport::models::Attributes;
use graphport::storage::{GraphStore, InMemoryGraphStore};
use graphport::AttributeValue;
use std::hint::black_box;

// ============================================================================
// Helper Functions
// ============================================================================

/// Builds a document with `vertices` vertices and twice as many edges.
fn document(vertices: usize, format: Format) -> Vec<u8> {
    let store = InMemoryGraphStore::new();
    let mut ids = Vec::with_capacity(vertices);
    for i in 0..vertices {
        let mut attributes = Attributes::new();
        attributes.insert("name".to_string(), AttributeValue::from(format!("vertex-{i}")));
        attributes.insert("rank".to_string(), AttributeValue::Integer(i as i64));
        ids.push(store.create_vertex(Some("Node"), &attributes).unwrap());
    }
    for i in 0..vertices * 2 {
        let mut attributes = Attributes::new();
        attributes.insert("weight".to_string(), AttributeValue::Float(i as f64 / 3.0));
        store
            .create_edge("link", &ids[i % vertices], &ids[(i * 31 + 7) % vertices], &attributes)
            .unwrap();
    }
    store.commit().unwrap();

    let mut out = Vec::new();
    ExportPipeline::new(
        &store,
        ExportOptions::default()
            .with_format(format)
            .with_mode(WriteMode::Compact),
    )
    .export_to_writer(&mut out)
    .unwrap();
    out
}

// ============================================================================
// Benchmarks
// ============================================================================

fn bench_import(c: &mut Criterion) {
    let mut group = c.benchmark_group("import");

    for format in Format::all() {
        for size in [100, 1_000, 10_000] {
            let input = document(size, *format);
            group.throughput(Throughput::Elements((size * 3) as u64));
            group.bench_with_input(BenchmarkId::new(format.to_string(), size), &input, |b, input| {
                b.iter(|| {
                    let store = InMemoryGraphStore::new();
                    let result = ImportPipeline::new(
                        &store,
                        ImportOptions::default()
                            .with_format(*format)
                            .with_batch_size(1_000),
                    )
                    .import_from_reader(input.as_slice())
                    .unwrap();
                    black_box(result.edges)
                });
            });
        }
    }

    group.finish();
}

fn bench_batch_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch_size");
    let input = document(1_000, Format::GraphMl);

    for batch_size in [0, 1, 100, 10_000] {
        group.bench_with_input(
            BenchmarkId::from_parameter(batch_size),
            &batch_size,
            |b, &batch_size| {
                b.iter(|| {
                    let store = InMemoryGraphStore::new();
                    ImportPipeline::new(
                        &store,
                        ImportOptions::default()
                            .with_format(Format::GraphMl)
                            .with_batch_size(batch_size),
                    )
                    .import_from_reader(input.as_slice())
                    .unwrap()
                    .commits
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_import, bench_batch_size);
criterion_main!(benches);
