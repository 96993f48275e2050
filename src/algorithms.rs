// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Parallel sorting and summing, built on the divide-and-conquer engine and on
//! the fork-join helper.

use crate::core::{hardware_concurrency, Executor, ThreadPool};
use crate::engine::{divide_and_conquer, MergeStrategy};
use crate::error::{Error, Result};
use crate::exec_parallel;

/// Below this length, [`naive_parallel_sort()`] sorts sequentially.
pub const SEQUENTIAL_THRESHOLD: usize = 1024;

/// Number of chunks used by [`parallel_sum()`].
pub const SUM_SUBTASKS: usize = 8;

/// Splits a vector into `num_chunks` contiguous chunks of `len / num_chunks`
/// items. The last chunk also receives the remainder.
pub fn split_even<T>(mut data: Vec<T>, num_chunks: usize) -> Vec<Vec<T>> {
    if num_chunks == 0 {
        return Vec::new();
    }
    let size = data.len() / num_chunks;
    let mut chunks = Vec::with_capacity(num_chunks);
    for _ in 1..num_chunks {
        let tail = data.split_off(size);
        chunks.push(data);
        data = tail;
    }
    chunks.push(data);
    chunks
}

/// Merges two sorted vectors into a sorted vector. Equal items of `left` come
/// before those of `right`.
pub fn merge_sorted<T: Ord>(left: Vec<T>, right: Vec<T>) -> Vec<T> {
    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    loop {
        let take_left = match (left.peek(), right.peek()) {
            (Some(l), Some(r)) => l <= r,
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (None, None) => break,
        };
        let next = if take_left { left.next() } else { right.next() };
        merged.extend(next);
    }
    merged
}

/// Sorts the data with a fixed degree of parallelism `cores`.
///
/// Fails with [`Error::ResourceUnavailable`] if `cores` exceeds the hardware
/// concurrency of this machine, and with an
/// [`InvalidArgument`](crate::ErrorKind::InvalidArgument) error if `cores`
/// isn't a power of two greater than one.
pub fn parallel_sort<T, E>(executor: &E, data: Vec<T>, cores: usize) -> Result<Vec<T>>
where
    T: Ord + Send + 'static,
    E: Executor + ?Sized,
{
    let available = hardware_concurrency()?.get();
    if cores > available {
        return Err(Error::ResourceUnavailable {
            requested: cores,
            available,
        });
    }
    sort_chunks(executor, data, cores)
}

/// Sorts the data on the pool, with one chunk per worker.
///
/// The number of chunks is the pool's concurrency rounded down to a power of
/// two, and at least two.
pub fn task_system_sort<T>(pool: &ThreadPool, data: Vec<T>) -> Result<Vec<T>>
where
    T: Ord + Send + 'static,
{
    let concurrency = pool.max_concurrency().max(2);
    let subtasks = 1usize << concurrency.ilog2();
    sort_chunks(pool, data, subtasks)
}

fn sort_chunks<T, E>(executor: &E, data: Vec<T>, subtasks: usize) -> Result<Vec<T>>
where
    T: Ord + Send + 'static,
    E: Executor + ?Sized,
{
    divide_and_conquer(
        executor,
        data,
        subtasks,
        split_even::<T>,
        merge_sorted::<T>,
        |mut chunk: Vec<T>| {
            chunk.sort();
            chunk
        },
        MergeStrategy::Trivial,
    )
}

/// Sorts the slice by recursively sorting both halves in parallel, down to
/// [`SEQUENTIAL_THRESHOLD`] items.
///
/// This spawns two OS threads per recursion level.
pub fn naive_parallel_sort<T: Ord + Send>(data: &mut [T]) -> Result<()> {
    if data.len() <= SEQUENTIAL_THRESHOLD {
        data.sort();
        return Ok(());
    }

    let mid = data.len() / 2;
    let (left, right) = data.split_at_mut(mid);
    let mut left_result = Ok(());
    let mut right_result = Ok(());
    exec_parallel!(
        || left_result = naive_parallel_sort(left),
        || right_result = naive_parallel_sort(right),
    )?;
    left_result?;
    right_result?;

    // The slice now consists of two sorted runs, which the standard sort
    // detects and merges in linear time.
    data.sort();
    Ok(())
}

/// Sums the numbers in [`SUM_SUBTASKS`] chunks, merging partial sums
/// concurrently.
pub fn parallel_sum<E: Executor + ?Sized>(executor: &E, numbers: Vec<u64>) -> Result<u64> {
    divide_and_conquer(
        executor,
        numbers,
        SUM_SUBTASKS,
        split_even::<u64>,
        |left: u64, right: u64| left + right,
        |chunk: Vec<u64>| chunk.iter().sum::<u64>(),
        MergeStrategy::Concurrent,
    )
}
