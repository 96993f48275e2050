// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha12Rng;
use std::mem::size_of;

const NUM_THREADS: &[usize] = &[2, 4, 8];
const LENGTHS: &[usize] = &[10_000, 100_000, 1_000_000];

fn random_input(len: usize) -> Vec<u64> {
    let mut rng = ChaCha12Rng::seed_from_u64(42);
    (0..len).map(|_| rng.random()).collect()
}

fn available_threads() -> impl Iterator<Item = usize> {
    let available = std::thread::available_parallelism().map_or(1, |n| n.get());
    NUM_THREADS
        .iter()
        .copied()
        .filter(move |&num_threads| num_threads <= available)
}

fn sort(c: &mut Criterion) {
    let mut group = c.benchmark_group("sort");
    for len in LENGTHS {
        group.throughput(Throughput::Bytes((len * size_of::<u64>()) as u64));
        group.bench_with_input(BenchmarkId::new("serial", len), len, serial::sort);
        group.bench_with_input(BenchmarkId::new("naive", len), len, dncpool::naive_sort);
        for num_threads in available_threads() {
            group.bench_with_input(
                BenchmarkId::new(format!("rayon@{num_threads}"), len),
                len,
                |bencher, len| rayon::sort(bencher, num_threads, len),
            );
            group.bench_with_input(
                BenchmarkId::new(format!("pool@{num_threads}"), len),
                len,
                |bencher, len| dncpool::pool_sort(bencher, num_threads, len),
            );
            group.bench_with_input(
                BenchmarkId::new(format!("os-threads@{num_threads}"), len),
                len,
                |bencher, len| dncpool::os_threads_sort(bencher, num_threads, len),
            );
        }
    }
    group.finish();
}

fn sum(c: &mut Criterion) {
    let mut group = c.benchmark_group("sum");
    for len in LENGTHS {
        group.throughput(Throughput::Bytes((len * size_of::<u64>()) as u64));
        group.bench_with_input(BenchmarkId::new("serial", len), len, serial::sum);
        group.bench_with_input(
            BenchmarkId::new("os-threads", len),
            len,
            dncpool::os_threads_sum,
        );
        for num_threads in available_threads() {
            group.bench_with_input(
                BenchmarkId::new(format!("rayon@{num_threads}"), len),
                len,
                |bencher, len| rayon::sum(bencher, num_threads, len),
            );
            group.bench_with_input(
                BenchmarkId::new(format!("pool@{num_threads}"), len),
                len,
                |bencher, len| dncpool::pool_sum(bencher, num_threads, len),
            );
        }
    }
    group.finish();
}

/// Baseline benchmarks without any multi-threading involved.
mod serial {
    use criterion::{black_box, BatchSize, Bencher};

    pub fn sort(bencher: &mut Bencher, len: &usize) {
        let input = super::random_input(*len);
        bencher.iter_batched(
            || input.clone(),
            |mut data| {
                data.sort();
                black_box(data)
            },
            BatchSize::LargeInput,
        );
    }

    pub fn sum(bencher: &mut Bencher, len: &usize) {
        let input = (0..*len as u64).collect::<Vec<u64>>();
        let input_slice = input.as_slice();
        bencher.iter(|| black_box(input_slice).iter().sum::<u64>());
    }
}

/// Benchmarks using Rayon.
mod rayon {
    use criterion::{black_box, BatchSize, Bencher};
    use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
    use rayon::slice::ParallelSliceMut;

    fn thread_pool(num_threads: usize) -> rayon::ThreadPool {
        rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build()
            .unwrap()
    }

    pub fn sort(bencher: &mut Bencher, num_threads: usize, len: &usize) {
        let input = super::random_input(*len);
        let thread_pool = thread_pool(num_threads);
        thread_pool.install(|| {
            bencher.iter_batched(
                || input.clone(),
                |mut data| {
                    data.par_sort();
                    black_box(data)
                },
                BatchSize::LargeInput,
            )
        });
    }

    pub fn sum(bencher: &mut Bencher, num_threads: usize, len: &usize) {
        let input = (0..*len as u64).collect::<Vec<u64>>();
        let input_slice = input.as_slice();
        let thread_pool = thread_pool(num_threads);
        thread_pool.install(|| bencher.iter(|| black_box(input_slice).par_iter().sum::<u64>()));
    }
}

/// Benchmarks using the divide-and-conquer engine.
mod dncpool {
    use criterion::{black_box, BatchSize, Bencher};
    use dncpool::algorithms::{naive_parallel_sort, parallel_sort, parallel_sum};
    use dncpool::{CpuPinningPolicy, OsThreads, ThreadCount, ThreadPool, ThreadPoolBuilder};

    fn thread_pool(num_threads: usize) -> ThreadPool {
        ThreadPoolBuilder {
            num_threads: ThreadCount::try_from(num_threads).unwrap(),
            cpu_pinning: CpuPinningPolicy::IfSupported,
        }
        .build()
        .unwrap()
    }

    pub fn pool_sort(bencher: &mut Bencher, num_threads: usize, len: &usize) {
        let input = super::random_input(*len);
        let thread_pool = thread_pool(num_threads);
        bencher.iter_batched(
            || input.clone(),
            |data| black_box(parallel_sort(&thread_pool, data, num_threads).unwrap()),
            BatchSize::LargeInput,
        );
    }

    pub fn os_threads_sort(bencher: &mut Bencher, num_threads: usize, len: &usize) {
        let input = super::random_input(*len);
        bencher.iter_batched(
            || input.clone(),
            |data| black_box(parallel_sort(&OsThreads, data, num_threads).unwrap()),
            BatchSize::LargeInput,
        );
    }

    pub fn naive_sort(bencher: &mut Bencher, len: &usize) {
        let input = super::random_input(*len);
        bencher.iter_batched(
            || input.clone(),
            |mut data| {
                naive_parallel_sort(&mut data).unwrap();
                black_box(data)
            },
            BatchSize::LargeInput,
        );
    }

    pub fn pool_sum(bencher: &mut Bencher, num_threads: usize, len: &usize) {
        let input = (0..*len as u64).collect::<Vec<u64>>();
        let thread_pool = thread_pool(num_threads);
        bencher.iter_batched(
            || input.clone(),
            |data| parallel_sum(&thread_pool, data).unwrap(),
            BatchSize::LargeInput,
        );
    }

    pub fn os_threads_sum(bencher: &mut Bencher, len: &usize) {
        let input = (0..*len as u64).collect::<Vec<u64>>();
        bencher.iter_batched(
            || input.clone(),
            |data| parallel_sum(&OsThreads, data).unwrap(),
            BatchSize::LargeInput,
        );
    }
}

criterion_group!(benches, sort, sum);
criterion_main!(benches);
