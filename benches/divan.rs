// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha12Rng;

fn main() {
    divan::main();
}

const NUM_THREADS: &[usize] = &[2, 4, 8];
const LENGTHS: &[usize] = &[10_000, 100_000, 1_000_000];

fn random_input(len: usize) -> Vec<u64> {
    let mut rng = ChaCha12Rng::seed_from_u64(42);
    (0..len).map(|_| rng.random()).collect()
}

/// Baseline benchmarks without any multi-threading involved.
mod serial {
    use super::LENGTHS;
    use divan::counter::BytesCount;
    use divan::{black_box, Bencher};

    #[divan::bench(args = LENGTHS)]
    fn sort(bencher: Bencher, len: usize) {
        let input = super::random_input(len);
        bencher
            .counter(BytesCount::of_many::<u64>(len))
            .with_inputs(|| input.clone())
            .bench_local_values(|mut data| {
                data.sort();
                data
            });
    }

    #[divan::bench(args = LENGTHS)]
    fn sum(bencher: Bencher, len: usize) {
        let input = (0..len as u64).collect::<Vec<u64>>();
        let input_slice = input.as_slice();
        bencher
            .counter(BytesCount::of_many::<u64>(len))
            .bench_local(|| black_box(input_slice).iter().sum::<u64>())
    }
}

/// Benchmarks using Rayon.
mod rayon {
    use super::{LENGTHS, NUM_THREADS};
    use divan::counter::BytesCount;
    use divan::{black_box, Bencher};
    use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
    use rayon::slice::ParallelSliceMut;

    fn thread_pool(num_threads: usize) -> rayon::ThreadPool {
        rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build()
            .unwrap()
    }

    #[divan::bench(consts = NUM_THREADS, args = LENGTHS)]
    fn sort_rayon<const NUM_THREADS: usize>(bencher: Bencher, len: usize) {
        let input = super::random_input(len);
        let thread_pool = thread_pool(NUM_THREADS);
        // divan::Bencher isn't Send, so each iteration enters the pool instead.
        bencher
            .counter(BytesCount::of_many::<u64>(len))
            .with_inputs(|| input.clone())
            .bench_local_values(|mut data| {
                thread_pool.install(|| data.par_sort());
                data
            });
    }

    #[divan::bench(consts = NUM_THREADS, args = LENGTHS)]
    fn sum_rayon<const NUM_THREADS: usize>(bencher: Bencher, len: usize) {
        let input = (0..len as u64).collect::<Vec<u64>>();
        let input_slice = input.as_slice();
        let thread_pool = thread_pool(NUM_THREADS);
        bencher
            .counter(BytesCount::of_many::<u64>(len))
            .bench_local(|| thread_pool.install(|| black_box(input_slice).par_iter().sum::<u64>()));
    }
}

/// Benchmarks using the divide-and-conquer engine.
mod dncpool {
    use super::{LENGTHS, NUM_THREADS};
    use divan::counter::BytesCount;
    use divan::Bencher;
    use dncpool::algorithms::{naive_parallel_sort, parallel_sum, task_system_sort};
    use dncpool::{
        divide_and_conquer, CpuPinningPolicy, MergeStrategy, OsThreads, ThreadCount, ThreadPool,
        ThreadPoolBuilder,
    };

    fn thread_pool(num_threads: usize) -> ThreadPool {
        ThreadPoolBuilder {
            num_threads: ThreadCount::try_from(num_threads).unwrap(),
            cpu_pinning: CpuPinningPolicy::IfSupported,
        }
        .build()
        .unwrap()
    }

    #[divan::bench(consts = NUM_THREADS, args = LENGTHS)]
    fn sort_pool<const NUM_THREADS: usize>(bencher: Bencher, len: usize) {
        let input = super::random_input(len);
        let thread_pool = thread_pool(NUM_THREADS);
        bencher
            .counter(BytesCount::of_many::<u64>(len))
            .with_inputs(|| input.clone())
            .bench_local_values(|data| task_system_sort(&thread_pool, data).unwrap());
    }

    #[divan::bench(consts = NUM_THREADS, args = LENGTHS)]
    fn sort_os_threads<const NUM_THREADS: usize>(bencher: Bencher, len: usize) {
        let input = super::random_input(len);
        bencher
            .counter(BytesCount::of_many::<u64>(len))
            .with_inputs(|| input.clone())
            .bench_local_values(|data| {
                divide_and_conquer(
                    &OsThreads,
                    data,
                    NUM_THREADS,
                    dncpool::algorithms::split_even::<u64>,
                    dncpool::algorithms::merge_sorted::<u64>,
                    |mut chunk: Vec<u64>| {
                        chunk.sort();
                        chunk
                    },
                    MergeStrategy::Trivial,
                )
                .unwrap()
            });
    }

    #[divan::bench(args = LENGTHS)]
    fn sort_naive(bencher: Bencher, len: usize) {
        let input = super::random_input(len);
        bencher
            .counter(BytesCount::of_many::<u64>(len))
            .with_inputs(|| input.clone())
            .bench_local_values(|mut data| {
                naive_parallel_sort(&mut data).unwrap();
                data
            });
    }

    #[divan::bench(consts = NUM_THREADS, args = LENGTHS)]
    fn sum_pool<const NUM_THREADS: usize>(bencher: Bencher, len: usize) {
        let input = (0..len as u64).collect::<Vec<u64>>();
        let thread_pool = thread_pool(NUM_THREADS);
        bencher
            .counter(BytesCount::of_many::<u64>(len))
            .with_inputs(|| input.clone())
            .bench_local_values(|data| parallel_sum(&thread_pool, data).unwrap());
    }

    #[divan::bench(args = LENGTHS)]
    fn sum_os_threads(bencher: Bencher, len: usize) {
        let input = (0..len as u64).collect::<Vec<u64>>();
        bencher
            .counter(BytesCount::of_many::<u64>(len))
            .with_inputs(|| input.clone())
            .bench_local_values(|data| parallel_sum(&OsThreads, data).unwrap());
    }
}
