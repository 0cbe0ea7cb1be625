//! Benchmark for InvertedIndex.
//!
//! Measures build, single-title updates and prefix queries across vocabulary
//! sizes. Updates are compared against rebuilding the index from scratch.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use taskdex::index::InvertedIndex;
use taskdex::tokenize::Tokenizer;

const WORDS: &[&str] = &[
    "buy", "milk", "bread", "review", "deploy", "standup", "email", "call", "invoice", "plan",
    "garden", "report", "budget", "sprint", "doctor", "ticket",
];

fn titles(count: usize) -> Vec<(u64, String)> {
    (0..count)
        .map(|index| {
            let first = WORDS[index % WORDS.len()];
            let second = WORDS[(index / WORDS.len()) % WORDS.len()];
            (index as u64, format!("{first} {second} item{index}"))
        })
        .collect()
}

// =============================================================================
// build Benchmark
// =============================================================================

fn benchmark_build(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("build");

    for size in [100, 1_000, 10_000] {
        let records = titles(size);
        group.bench_with_input(BenchmarkId::new("InvertedIndex", size), &records, |bencher, records| {
            bencher.iter(|| black_box(InvertedIndex::build(Tokenizer::default(), records)));
        });
    }

    group.finish();
}

// =============================================================================
// update Benchmark
// =============================================================================

fn benchmark_update(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("update");

    for size in [100, 1_000, 10_000] {
        let records = titles(size);
        let index = InvertedIndex::build(Tokenizer::default(), &records);
        let (id, old_title) = &records[size / 2];

        group.bench_with_input(BenchmarkId::new("differential", size), &size, |bencher, _| {
            bencher.iter(|| black_box(index.update(id, old_title, black_box("renamed task title"))));
        });

        group.bench_with_input(BenchmarkId::new("rebuild", size), &size, |bencher, _| {
            bencher.iter(|| {
                let renamed: Vec<(u64, String)> = records
                    .iter()
                    .map(|(other, title)| {
                        let title = if other == id { "renamed task title".to_string() } else { title.clone() };
                        (*other, title)
                    })
                    .collect();
                black_box(InvertedIndex::build(Tokenizer::default(), &renamed))
            });
        });
    }

    group.finish();
}

// =============================================================================
// query_prefix Benchmark
// =============================================================================

fn benchmark_query_prefix(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("query_prefix");

    for size in [100, 1_000, 10_000] {
        let index = InvertedIndex::build(Tokenizer::default(), &titles(size));
        group.bench_with_input(BenchmarkId::new("InvertedIndex", size), &index, |bencher, index| {
            bencher.iter(|| black_box(index.query_prefix(black_box("bu"))));
        });
    }

    group.finish();
}

// =============================================================================
// Criterion Group and Main
// =============================================================================

criterion_group!(benches, benchmark_build, benchmark_update, benchmark_query_prefix);

criterion_main!(benches);
