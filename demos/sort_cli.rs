// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! CLI tool to time parallel sorts of random numbers.

use clap::{Parser, ValueEnum};
use dncpool::algorithms::{naive_parallel_sort, parallel_sort, task_system_sort};
use dncpool::{CpuPinningPolicy, OsThreads, ThreadCount, ThreadPoolBuilder};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha12Rng;
use std::hint::black_box;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let mut rng = ChaCha12Rng::seed_from_u64(cli.seed);
    let input = (0..cli.input_size)
        .map(|_| rng.random_range(0..=1000))
        .collect::<Vec<u64>>();
    let expected = {
        let mut data = input.clone();
        data.sort();
        data
    };

    let stats = match cli.backend {
        Backend::Serial => collect_stats(&input, cli.repetitions, |mut data| {
            data.sort();
            data
        }),
        Backend::Pool => {
            let pool = ThreadPoolBuilder {
                num_threads: match cli.num_threads {
                    Some(num_threads) => ThreadCount::Count(num_threads),
                    None => ThreadCount::AvailableParallelism,
                },
                cpu_pinning: CpuPinningPolicy::IfSupported,
            }
            .build()
            .unwrap();
            println!("worker cpus = {:?}", pool.worker_cpus());
            collect_stats(&input, cli.repetitions, |data| {
                task_system_sort(&pool, data).unwrap()
            })
        }
        Backend::OsThreads => {
            let cores = cli.num_threads.map_or(2, NonZeroUsize::get);
            collect_stats(&input, cli.repetitions, |data| {
                parallel_sort(&OsThreads, data, cores).unwrap()
            })
        }
        Backend::Naive => collect_stats(&input, cli.repetitions, |mut data| {
            naive_parallel_sort(&mut data).unwrap();
            data
        }),
    };

    assert_eq!(stats.last_output, expected);
    println!("sorted {} numbers, {} runs", cli.input_size, cli.repetitions);
    println!("\tcold:    {:?}", stats.cold);
    println!("\tbest:    {:?}", stats.best);
    println!("\taverage: {:?}", stats.average);
    println!("\tworst:   {:?}", stats.worst);
}

#[derive(Parser, Debug, PartialEq, Eq)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Back-end that runs the sort.
    #[arg(long, value_enum)]
    backend: Backend,

    /// Number of worker threads for the pool, or number of chunks for the OS
    /// threads back-end. Default to the available parallelism for the pool,
    /// and to 2 chunks otherwise.
    #[arg(long)]
    num_threads: Option<NonZeroUsize>,

    /// Number of items in the input.
    #[arg(long, default_value_t = 1_000_000)]
    input_size: usize,

    /// Number of timed runs.
    #[arg(long, default_value_t = 20)]
    repetitions: usize,

    /// Seed of the random input.
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

/// Back-end to sort with.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Backend {
    /// Sort on the calling thread.
    Serial,
    /// Divide and conquer on a core-pinned thread pool.
    Pool,
    /// Divide and conquer with one OS thread per unit of work.
    OsThreads,
    /// Recursive fork-join on OS threads.
    Naive,
}

/// Timing statistics over repeated runs.
struct Stats {
    /// Duration of the first run.
    cold: Duration,
    best: Duration,
    average: Duration,
    worst: Duration,
    /// Output of the last run, kept to check it.
    last_output: Vec<u64>,
}

/// Times `repetitions` runs of `f`, each on a fresh copy of the input. Copying
/// the input isn't timed.
fn collect_stats(
    input: &[u64],
    repetitions: usize,
    mut f: impl FnMut(Vec<u64>) -> Vec<u64>,
) -> Stats {
    let repetitions = repetitions.max(1);
    let mut runtimes = Vec::with_capacity(repetitions);
    let mut last_output = Vec::new();
    for _ in 0..repetitions {
        let data = input.to_vec();
        let start = Instant::now();
        last_output = black_box(f(black_box(data)));
        runtimes.push(start.elapsed());
    }

    let total = runtimes.iter().sum::<Duration>();
    Stats {
        cold: runtimes[0],
        best: runtimes.iter().copied().min().unwrap_or_default(),
        average: total / repetitions as u32,
        worst: runtimes.iter().copied().max().unwrap_or_default(),
        last_output,
    }
}
