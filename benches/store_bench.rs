//! Benchmark for Store dispatch and search.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use taskdex::config::StoreConfig;
use taskdex::domain::{Task, TaskId, Timestamp};
use taskdex::query::search;
use taskdex::store::{Action, Snapshot, Store};

fn seeded_snapshot(size: u64) -> Snapshot {
    let now = Timestamp::now();
    let tasks: Vec<Task> = (1..=size)
        .map(|index| Task::new(TaskId::new(index), format!("Task number {index} review"), "", now))
        .collect();
    Store::with_tasks(&StoreConfig::default(), tasks).state().as_ref().clone()
}

// =============================================================================
// reduce Benchmark
// =============================================================================

fn benchmark_reduce(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("reduce");
    let now = Timestamp::now();

    for size in [100_u64, 1_000, 10_000] {
        let snapshot = seeded_snapshot(size);
        let add = Action::add("Team standup", "").unwrap();
        let update = Action::update(TaskId::new(size / 2), "Renamed review", "").unwrap();
        let toggle = Action::toggle(TaskId::new(size / 2));

        for (name, action) in [("add", &add), ("update", &update), ("toggle", &toggle)] {
            group.bench_with_input(BenchmarkId::new(name, size), &snapshot, |bencher, snapshot| {
                bencher.iter(|| black_box(snapshot.reduce(black_box(action), now)));
            });
        }
    }

    group.finish();
}

// =============================================================================
// search Benchmark
// =============================================================================

fn benchmark_search(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("search");

    for size in [100_u64, 1_000, 10_000] {
        let snapshot = seeded_snapshot(size);
        group.bench_with_input(BenchmarkId::new("prefix", size), &snapshot, |bencher, snapshot| {
            bencher.iter(|| black_box(search(snapshot, black_box("numb"))));
        });
        group.bench_with_input(BenchmarkId::new("blank", size), &snapshot, |bencher, snapshot| {
            bencher.iter(|| black_box(search(snapshot, black_box(""))));
        });
    }

    group.finish();
}

// =============================================================================
// dispatch Benchmark
// =============================================================================

fn benchmark_dispatch(criterion: &mut Criterion) {
    criterion.bench_function("dispatch/add_then_delete", |bencher| {
        let store = Store::from_snapshot(seeded_snapshot(1_000));
        bencher.iter(|| {
            store.dispatch(Action::Add {
                title: "Transient entry".to_string(),
                description: String::new(),
            });
            let id = store.state().records()[0].id;
            store.dispatch(Action::delete(id));
        });
    });
}

// =============================================================================
// Criterion Group and Main
// =============================================================================

criterion_group!(benches, benchmark_reduce, benchmark_search, benchmark_dispatch);

criterion_main!(benches);
