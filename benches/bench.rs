//! Criterion benchmarks comparing `BstMap` against `std::collections::BTreeMap`.
//!
//! `BstMap` never rebalances on its own, so every setup inserts keys in shuffled order; a sorted
//! insertion order would build a linked list.

use bst_rewrite::BstMap;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use std::collections::BTreeMap;
use std::hint::black_box;

const SEED: u64 = 42;
const SIZES: [usize; 3] = [100, 10_000, 100_000];

fn bench_insert_rand(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert_rand");
    for n in SIZES {
        group.bench_with_input(BenchmarkId::new("bst", n), &n, |b, &n| {
            let mut rng = StdRng::seed_from_u64(SEED);
            let mut map = BstMap::new();
            for _ in 0..n {
                let i = rng.gen::<usize>() % n;
                map.insert(i, i);
            }
            b.iter(|| {
                let k = rng.gen::<usize>() % n;
                black_box(map.insert(k, k).1);
            });
        });
        group.bench_with_input(BenchmarkId::new("std", n), &n, |b, &n| {
            let mut rng = StdRng::seed_from_u64(SEED);
            let mut map = BTreeMap::new();
            for _ in 0..n {
                let i = rng.gen::<usize>() % n;
                map.insert(i, i);
            }
            b.iter(|| {
                let k = rng.gen::<usize>() % n;
                black_box(map.insert(k, k));
            });
        });
    }
    group.finish();
}

fn bench_find_rand(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_rand");
    for n in SIZES {
        let mut rng = StdRng::seed_from_u64(SEED);
        let mut keys: Vec<usize> = (0..n).map(|_| rng.gen::<usize>() % n).collect();
        let bst: BstMap<usize, usize> = keys.iter().map(|&k| (k, k)).collect();
        let btree: BTreeMap<usize, usize> = keys.iter().map(|&k| (k, k)).collect();
        keys.shuffle(&mut rng);

        group.bench_with_input(BenchmarkId::new("bst", n), &n, |b, &n| {
            let mut i = 0;
            b.iter(|| {
                black_box(bst.get(&keys[i]));
                i = (i + 1) % n;
            });
        });
        group.bench_with_input(BenchmarkId::new("std", n), &n, |b, &n| {
            let mut i = 0;
            b.iter(|| {
                black_box(btree.get(&keys[i]));
                i = (i + 1) % n;
            });
        });
    }
    group.finish();
}

fn bench_find_seq(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_seq");
    for n in SIZES {
        let mut order: Vec<usize> = (0..n).collect();
        order.shuffle(&mut StdRng::seed_from_u64(SEED));
        let mut bst: BstMap<usize, usize> = order.into_iter().map(|i| (i, i)).collect();
        bst.balance();
        let btree: BTreeMap<usize, usize> = (0..n).map(|i| (i, i)).collect();

        group.bench_with_input(BenchmarkId::new("bst", n), &n, |b, &n| {
            let mut i = 0;
            b.iter(|| {
                black_box(bst.get(&i));
                i = (i + 1) % n;
            });
        });
        group.bench_with_input(BenchmarkId::new("std", n), &n, |b, &n| {
            let mut i = 0;
            b.iter(|| {
                black_box(btree.get(&i));
                i = (i + 1) % n;
            });
        });
    }
    group.finish();
}

fn bench_iter(c: &mut Criterion) {
    let mut group = c.benchmark_group("iter");
    for n in [20, 1000, 100_000] {
        let mut rng = StdRng::seed_from_u64(SEED);
        let pairs: Vec<(i32, i32)> = (0..n).map(|_| (rng.gen(), rng.gen())).collect();
        let bst: BstMap<i32, i32> = pairs.iter().cloned().collect();
        let btree: BTreeMap<i32, i32> = pairs.iter().cloned().collect();

        group.bench_with_input(BenchmarkId::new("bst", n), &n, |b, _| {
            b.iter(|| {
                for entry in bst.iter() {
                    black_box(entry);
                }
            });
        });
        group.bench_with_input(BenchmarkId::new("std", n), &n, |b, _| {
            b.iter(|| {
                for entry in btree.iter() {
                    black_box(entry);
                }
            });
        });
    }
    group.finish();
}

fn bench_balance(c: &mut Criterion) {
    let mut group = c.benchmark_group("balance");
    for n in [100, 10_000] {
        let mut order: Vec<usize> = (0..n).collect();
        order.shuffle(&mut StdRng::seed_from_u64(SEED));
        group.bench_with_input(BenchmarkId::new("random", n), &n, |b, _| {
            b.iter_batched(
                || order.iter().map(|&i| (i, i)).collect::<BstMap<usize, usize>>(),
                |mut map| {
                    map.balance();
                    map
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_insert_rand, bench_find_rand, bench_find_seq, bench_iter, bench_balance);
criterion_main!(benches);
