use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use streamsort::engine::chunkstore::{chunk_path, write_chunk};
use streamsort::engine::key::{KeyedRecord, Selector};
use streamsort::engine::merge::merge_chunks;
use streamsort::InMemoryOutput;

fn generate_records(n: usize) -> Vec<Vec<u8>> {
    (0..n)
        .map(|i| {
            let id = (n - i) as i64;
            format!("{id},name-{i},addr-{i},Asia").into_bytes()
        })
        .collect()
}

fn bench_chunk_sort(c: &mut Criterion) {
    let mut group = c.benchmark_group("chunk_sort");
    for size in [1_000, 50_000, 200_000] {
        let records = generate_records(size);
        group.bench_with_input(BenchmarkId::new("id", size), &records, |b, records| {
            b.iter(|| {
                let mut chunk: Vec<KeyedRecord> = records
                    .iter()
                    .map(|r| KeyedRecord::new(r.clone(), Selector::Id))
                    .collect();
                chunk.sort_unstable_by(|a, b| a.compare(b));
                black_box(chunk);
            });
        });
    }
    group.finish();
}

fn bench_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge_chunks");
    for (label, file_count, records_per_file) in [("4x5k", 4usize, 5_000usize), ("16x2k", 16, 2_000)] {
        group.bench_function(label, |b| {
            b.iter_batched(
                || {
                    let dir = tempfile::tempdir().unwrap();
                    let mut paths = Vec::with_capacity(file_count);
                    for file_index in 0..file_count {
                        let records = generate_records(records_per_file);
                        let mut keyed: Vec<KeyedRecord> = records
                            .into_iter()
                            .map(|r| KeyedRecord::new(r, Selector::Id))
                            .collect();
                        keyed.sort_unstable_by(|a, b| a.compare(b));
                        let path = chunk_path(dir.path(), file_index);
                        write_chunk(&path, &keyed, 4096).unwrap();
                        paths.push(path);
                    }
                    (dir, paths)
                },
                |(dir, paths)| {
                    let mut output = InMemoryOutput::new();
                    merge_chunks(&paths, Selector::Id, &mut output, 1_000, 4096).unwrap();
                    black_box(output.emitted.len());
                    drop(dir);
                },
                criterion::BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_chunk_sort, bench_merge);
criterion_main!(benches);
