//! Benchmarks for rechunk.
//!
//! Run with:
//!     cargo bench

use std::io::Cursor;

use bytes::Bytes;
use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};

use rechunk::{Base64Encoder, ChunkConfig, Chunker};

fn bench_chunk_bytes(c: &mut Criterion) {
    let mut group = c.benchmark_group("chunk_bytes");

    for size in [64 * 1024, 1024 * 1024, 10 * 1024 * 1024] {
        // Deterministic pseudo-random data
        let data = Bytes::from((0..size).map(|i| (i * 7 + 13) as u8).collect::<Vec<u8>>());

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(format!("{}kb", size / 1024), &data, |b, data| {
            let chunker = Chunker::default();
            b.iter(|| {
                let chunks = chunker.chunk_bytes(black_box(data.clone()));
                black_box(chunks.len())
            });
        });
    }

    group.finish();
}

fn bench_targets(c: &mut Criterion) {
    let mut group = c.benchmark_group("targets");
    let size = 1024 * 1024; // 1 MB
    let data: Vec<u8> = (0..size).map(|i| (i * 7 + 13) as u8).collect();
    group.throughput(Throughput::Bytes(size as u64));

    for (name, target) in [("small", 3 * 256), ("default", 3 * 1024), ("large", 3 * 64 * 1024)] {
        let chunker = Chunker::new(ChunkConfig::new(target).unwrap()).unwrap();
        group.bench_function(name, |b| {
            b.iter(|| {
                let count = chunker
                    .chunk(Cursor::new(black_box(&data)))
                    .map(|chunk| chunk.unwrap().len())
                    .count();
                black_box(count)
            });
        });
    }

    group.finish();
}

fn bench_fragmentation(c: &mut Criterion) {
    let mut group = c.benchmark_group("fragmentation");
    let size = 1024 * 1024; // 1 MB
    let data = Bytes::from((0..size).map(|i| (i * 7 + 13) as u8).collect::<Vec<u8>>());
    group.throughput(Throughput::Bytes(size as u64));

    // Fragments smaller than, equal to and larger than the target
    for fragment_size in [1000, 3 * 1024, 64 * 1024] {
        let fragments: Vec<Bytes> = data
            .chunks(fragment_size)
            .map(|f| data.slice_ref(f))
            .collect();

        group.bench_with_input(
            format!("fragments_{fragment_size}"),
            &fragments,
            |b, fragments| {
                let chunker = Chunker::default();
                b.iter(|| {
                    let count = chunker
                        .chunk_fragments(black_box(fragments).iter().cloned().map(Ok))
                        .map(|chunk| chunk.unwrap().len())
                        .count();
                    black_box(count)
                });
            },
        );
    }

    group.finish();
}

fn bench_base64(c: &mut Criterion) {
    let mut group = c.benchmark_group("base64");
    let size = 1024 * 1024; // 1 MB
    let data: Vec<u8> = (0..size).map(|i| (i * 7 + 13) as u8).collect();
    group.throughput(Throughput::Bytes(size as u64));

    group.bench_function("encoded_pipeline", |b| {
        let chunker = Chunker::default();
        b.iter(|| {
            let encoded: usize = chunker
                .chunk(Cursor::new(black_box(&data)))
                .encode(Base64Encoder)
                .unwrap()
                .map(|part| part.unwrap().len())
                .sum();
            black_box(encoded)
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_chunk_bytes,
    bench_targets,
    bench_fragmentation,
    bench_base64
);
criterion_main!(benches);
