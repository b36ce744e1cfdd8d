//! Benchmarks for store writes, transactions and listener dispatch.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use tabula_store::{create_store, row, SortedRowIdsQuery, Store};

fn populate_store(store: &mut Store, count: u64) {
    let species = ["dog", "cat", "fish", "bird", "horse"];
    store
        .transaction(|store| {
            for i in 0..count {
                store.set_row(
                    "pets",
                    &i.to_string(),
                    row! {
                        "species" => species[(i as usize) % species.len()],
                        "age" => (i % 17) as f64,
                        "sold" => i % 3 == 0
                    },
                );
            }
        })
        .unwrap();
}

/// Benchmark: one transaction per write vs one transaction for all writes
fn store_write_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("store_write");

    for row_count in [100u64, 1000, 10000].iter() {
        group.bench_with_input(BenchmarkId::new("individual", row_count), row_count, |b, &row_count| {
            b.iter_batched(
                create_store,
                |mut store| {
                    for i in 0..row_count {
                        store.set_cell("pets", &i.to_string(), "age", i as f64);
                    }
                    black_box(store)
                },
                BatchSize::SmallInput,
            );
        });

        group.bench_with_input(BenchmarkId::new("transaction", row_count), row_count, |b, &row_count| {
            b.iter_batched(
                create_store,
                |mut store| {
                    populate_store(&mut store, row_count);
                    black_box(store)
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

/// Benchmark: cost of dispatching to scoped and wildcard listeners
fn store_listener_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("store_listeners");

    for listener_count in [10usize, 100, 1000].iter() {
        group.bench_with_input(
            BenchmarkId::new("scoped_cell", listener_count),
            listener_count,
            |b, &listener_count| {
                b.iter_batched(
                    || {
                        let mut store = create_store();
                        populate_store(&mut store, 1000);
                        for i in 0..listener_count {
                            store.add_cell_listener(
                                Some("pets"),
                                Some(&i.to_string()),
                                Some("age"),
                                |_, _, _, _, new, _, _| {
                                    black_box(new);
                                },
                                false,
                            );
                        }
                        store
                    },
                    |mut store| {
                        store.set_cell("pets", "0", "age", 99.0);
                        black_box(store)
                    },
                    BatchSize::SmallInput,
                );
            },
        );

        group.bench_with_input(
            BenchmarkId::new("wildcard_row", listener_count),
            listener_count,
            |b, &listener_count| {
                b.iter_batched(
                    || {
                        let mut store = create_store();
                        populate_store(&mut store, 1000);
                        for _ in 0..listener_count {
                            store.add_row_listener(
                                None,
                                None,
                                |_, _, row_id, _| {
                                    black_box(row_id);
                                },
                                false,
                            );
                        }
                        store
                    },
                    |mut store| {
                        store.set_cell("pets", "0", "age", 99.0);
                        black_box(store)
                    },
                    BatchSize::SmallInput,
                );
            },
        );
    }

    group.finish();
}

/// Benchmark: sorted row ids, queried directly and kept by a listener
fn store_sorted_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("store_sorted");

    for row_count in [1000u64, 10000].iter() {
        let mut store = create_store();
        populate_store(&mut store, *row_count);
        let query = SortedRowIdsQuery::new("pets").by("age").limit(10);

        group.bench_with_input(BenchmarkId::new("query", row_count), &query, |b, query| {
            b.iter(|| black_box(store.get_sorted_row_ids(query)));
        });

        group.bench_with_input(BenchmarkId::new("listener", row_count), row_count, |b, &row_count| {
            b.iter_batched(
                || {
                    let mut store = create_store();
                    populate_store(&mut store, row_count);
                    store.add_sorted_row_ids_listener(
                        SortedRowIdsQuery::new("pets").by("age").limit(10),
                        |_, _, ids| {
                            black_box(ids);
                        },
                        false,
                    );
                    store
                },
                |mut store| {
                    store.set_cell("pets", "5", "age", -1.0);
                    black_box(store)
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    store_write_benchmark,
    store_listener_benchmark,
    store_sorted_benchmark,
);

criterion_main!(benches);
