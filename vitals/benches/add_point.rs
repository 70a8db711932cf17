//! Microbenchmarks for the write and read hot paths.
//!
//! Measures `add_point` latency at steady state (series already at capacity,
//! so every write also evicts), how that latency scales with `max_points`,
//! and the cost of a renderer's frame reads.
//!
//! Run with: `cargo bench -p vitals -- add_point`

#![allow(missing_docs, clippy::cast_possible_truncation)]

use std::time::Duration;

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use vitals::{Store, StoreConfig};

const SEC: u64 = 1_000_000_000;
const BASE_TIME: u64 = 1_700_000_000 * SEC;

/// Creates a store whose series are already filled to `max_points`.
fn setup_store(series_count: u32, max_points: usize) -> (Store, Vec<String>) {
    let store = Store::new(StoreConfig {
        default_retention: Duration::from_secs(3600),
        max_points,
        ..StoreConfig::default()
    });

    let names: Vec<String> = (0..series_count).map(|i| format!("metric_{i}")).collect();
    let times: Vec<u64> = (0..max_points as u64).map(|i| BASE_TIME + i * SEC).collect();
    let values = vec![0.0; max_points];

    for (i, name) in names.iter().enumerate() {
        store.set_labels(name, [("id", i.to_string())]);
        store.add_points(name, &times, &values);
    }

    (store, names)
}

fn bench_add_point_single(c: &mut Criterion) {
    let (store, names) = setup_store(1, 600);
    let mut ts = BASE_TIME + 600 * SEC;

    c.bench_function("add_point/single_series", |b| {
        b.iter(|| {
            ts += SEC;
            store.add_point(black_box(&names[0]), black_box(ts), black_box(42.5));
        });
    });
}

fn bench_add_point_many_series(c: &mut Criterion) {
    let mut group = c.benchmark_group("add_point/series_count");

    for count in [1, 10, 30, 100] {
        let (store, names) = setup_store(count, 600);
        let mut ts = BASE_TIME + 600 * SEC;

        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| {
                ts += SEC;
                for (i, name) in names.iter().enumerate() {
                    store.add_point(black_box(name), black_box(ts), black_box(f64::from(i as u32)));
                }
            });
        });
    }

    group.finish();
}

fn bench_add_point_at_capacity(c: &mut Criterion) {
    let mut group = c.benchmark_group("add_point/max_points");

    for max_points in [1_000usize, 100_000, 1_000_000] {
        let (store, names) = setup_store(1, max_points);
        let mut ts = BASE_TIME + max_points as u64 * SEC;

        group.bench_with_input(BenchmarkId::from_parameter(max_points), &max_points, |b, _| {
            b.iter(|| {
                ts += SEC;
                store.add_point(black_box(&names[0]), black_box(ts), black_box(1.0));
            });
        });
    }

    group.finish();
}

fn bench_add_points_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("add_points/batch_len");

    for len in [1usize, 10, 100] {
        let (store, names) = setup_store(1, 600);
        let mut ts = BASE_TIME + 600 * SEC;
        let values = vec![99.9; len];

        group.bench_with_input(BenchmarkId::from_parameter(len), &len, |b, &len| {
            b.iter(|| {
                let times: Vec<u64> = (1..=len as u64).map(|i| ts + i * SEC).collect();
                ts += len as u64 * SEC;
                store.add_points(black_box(&names[0]), black_box(&times), black_box(&values));
            });
        });
    }

    group.finish();
}

fn bench_frame_read(c: &mut Criterion) {
    let (store, names) = setup_store(30, 600);
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();

    c.bench_function("render/30_series_frozen_frame", |b| {
        b.iter(|| {
            let token = store.freeze(black_box(&refs));
            let mut total = 0.0;
            for name in &names {
                if let Some(series) = store.get_latest_n(name, 60) {
                    total += series.avg();
                }
            }
            store.unfreeze(token);
            black_box(total)
        });
    });
}

criterion_group!(
    benches,
    bench_add_point_single,
    bench_add_point_many_series,
    bench_add_point_at_capacity,
    bench_add_points_batch,
    bench_frame_read,
);
criterion_main!(benches);
