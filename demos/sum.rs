// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Example of a parallel sum on a core-pinned thread pool.

use dncpool::algorithms::parallel_sum;
use dncpool::ThreadPool;
use std::hint::black_box;

fn main() {
    env_logger::init();

    let pool = ThreadPool::initialize().unwrap();
    println!(
        "{} workers pinned to {:?}",
        pool.max_concurrency(),
        pool.worker_cpus()
    );

    let input = (0..=1_000_000).collect::<Vec<u64>>();
    let sum = parallel_sum(&pool, black_box(input)).unwrap();
    println!("sum = {sum}");
    assert_eq!(sum, 500_000 * 1_000_001);

    let completed = pool.completed_tasks();
    pool.shutdown();
    println!("completed {completed} tasks");
}
