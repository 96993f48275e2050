// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Parallel divide-and-conquer: split the input into chunks, solve every chunk
//! concurrently, then merge the results pairwise until one remains.

use crate::core::{wait_all, Executor};
use crate::error::{Error, Result};
use crate::macros::{log_debug, log_trace};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// How the pairs of a fold pass are merged.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MergeStrategy {
    /// Merging is cheap: all the pairs of a pass are merged one after the
    /// other, in index order, on the calling thread.
    Trivial,
    /// Every pair of a pass is merged as an independent unit of work on the
    /// executor. A pass completes before the next one starts.
    Concurrent,
}

impl From<bool> for MergeStrategy {
    /// Maps a "merge is trivial" flag to a strategy.
    fn from(merge_is_trivial: bool) -> Self {
        if merge_is_trivial {
            MergeStrategy::Trivial
        } else {
            MergeStrategy::Concurrent
        }
    }
}

/// A problem that can be solved by divide-and-conquer.
pub trait Problem: Send + Sync + 'static {
    /// Root input of the problem.
    type Input;
    /// Disjoint part of the input, solved independently of the others.
    type Chunk: Send + 'static;
    /// Solution of a chunk, or of several adjacent chunks once merged.
    type Output: Send + 'static;

    /// Partitions the input into exactly `num_chunks` chunks.
    fn split(&self, input: Self::Input, num_chunks: usize) -> Vec<Self::Chunk>;

    /// Solves a single chunk.
    fn solve(&self, chunk: Self::Chunk) -> Self::Output;

    /// Combines the solutions of two adjacent parts, `left` coming first.
    fn merge(&self, left: Self::Output, right: Self::Output) -> Self::Output;
}

/// Runs [`Problem`]s on an [`Executor`].
///
/// ```
/// # use dncpool::{Engine, MergeStrategy, OsThreads, Problem};
/// # use std::sync::Arc;
/// struct Count;
///
/// impl Problem for Count {
///     type Input = Vec<u8>;
///     type Chunk = Vec<u8>;
///     type Output = usize;
///
///     fn split(&self, mut input: Vec<u8>, num_chunks: usize) -> Vec<Vec<u8>> {
///         let size = input.len() / num_chunks;
///         let mut chunks = (1..num_chunks)
///             .map(|_| input.drain(..size).collect())
///             .collect::<Vec<_>>();
///         chunks.push(input);
///         chunks
///     }
///
///     fn solve(&self, chunk: Vec<u8>) -> usize {
///         chunk.len()
///     }
///
///     fn merge(&self, left: usize, right: usize) -> usize {
///         left + right
///     }
/// }
///
/// let engine = Engine {
///     executor: OsThreads,
///     merge_strategy: MergeStrategy::Trivial,
/// };
/// assert_eq!(engine.run(Arc::new(Count), vec![0; 1000], 4), Ok(1000));
/// ```
#[derive(Clone, Copy, Debug)]
pub struct Engine<E> {
    /// Back-end running the units of work.
    pub executor: E,
    /// How fold passes are executed.
    pub merge_strategy: MergeStrategy,
}

impl<E: Executor> Engine<E> {
    /// Splits the input into `subtasks` chunks, solves them concurrently and
    /// folds the solutions pairwise.
    ///
    /// `subtasks` must be a power of two greater than one, otherwise an
    /// [`InvalidArgument`](crate::ErrorKind::InvalidArgument) error is returned
    /// before anything runs.
    pub fn run<P: Problem>(
        &self,
        problem: Arc<P>,
        input: P::Input,
        subtasks: usize,
    ) -> Result<P::Output> {
        check_subtask_count(subtasks)?;
        let chunks = problem.split(input, subtasks);
        let solve = {
            let problem = problem.clone();
            move |chunk: P::Chunk| problem.solve(chunk)
        };
        let merge = move |left: P::Output, right: P::Output| problem.merge(left, right);
        map_reduce(
            &self.executor,
            chunks,
            subtasks,
            Arc::new(solve),
            Arc::new(merge),
            self.merge_strategy,
        )
    }
}

/// Runs a divide-and-conquer algorithm given as three functions.
///
/// 1. `split(data, subtasks)` partitions the data into `subtasks` chunks.
/// 2. `root_task` runs concurrently on every chunk. All the chunks are
///    submitted before any result is awaited, and the results keep the order
///    of their chunks.
/// 3. Results are merged pairwise, `(r[0], r[1])`, `(r[2], r[3])`, ..., halving
///    their number on every pass until one remains, which is returned.
///
/// `subtasks` must be a power of two greater than one, so that every fold pass
/// merges an even number of results. Otherwise, an
/// [`InvalidArgument`](crate::ErrorKind::InvalidArgument) error is returned
/// before `split` is called.
///
/// ```
/// # use dncpool::{divide_and_conquer, MergeStrategy, ThreadPool};
/// let pool = ThreadPool::initialize().unwrap();
/// let words = vec!["divide", "and", "conquer", "!"];
/// let sentence = divide_and_conquer(
///     &pool,
///     words,
///     4,
///     |words, _| words.into_iter().map(str::to_owned).collect::<Vec<String>>(),
///     |left: String, right: String| left + &right,
///     |word| word.to_uppercase(),
///     MergeStrategy::Concurrent,
/// );
/// assert_eq!(sentence.unwrap(), "DIVIDEANDCONQUER!");
/// ```
pub fn divide_and_conquer<E, D, C, R>(
    executor: &E,
    data: D,
    subtasks: usize,
    split: impl FnOnce(D, usize) -> Vec<C>,
    merge: impl Fn(R, R) -> R + Send + Sync + 'static,
    root_task: impl Fn(C) -> R + Send + Sync + 'static,
    merge_strategy: impl Into<MergeStrategy>,
) -> Result<R>
where
    E: Executor + ?Sized,
    C: Send + 'static,
    R: Send + 'static,
{
    check_subtask_count(subtasks)?;
    let chunks = split(data, subtasks);
    map_reduce(
        executor,
        chunks,
        subtasks,
        Arc::new(root_task),
        Arc::new(merge),
        merge_strategy.into(),
    )
}

/// Checks that the number of subtasks can be folded down to one by strict
/// halving.
fn check_subtask_count(subtasks: usize) -> Result<()> {
    if subtasks == 0 {
        return Err(Error::ZeroSubtasks);
    }
    if subtasks % 2 != 0 {
        return Err(Error::OddSubtaskCount(subtasks));
    }
    let mut len = subtasks;
    while len > 1 {
        if len % 2 != 0 {
            return Err(Error::OddFoldCount(len));
        }
        len /= 2;
    }
    Ok(())
}

fn map_reduce<E, C, R, S, M>(
    executor: &E,
    chunks: Vec<C>,
    subtasks: usize,
    solve: Arc<S>,
    merge: Arc<M>,
    merge_strategy: MergeStrategy,
) -> Result<R>
where
    E: Executor + ?Sized,
    C: Send + 'static,
    R: Send + 'static,
    S: Fn(C) -> R + Send + Sync + 'static,
    M: Fn(R, R) -> R + Send + Sync + 'static,
{
    if chunks.len() != subtasks {
        return Err(Error::ChunkCountMismatch {
            expected: subtasks,
            actual: chunks.len(),
        });
    }

    log_debug!("[engine] Solving {subtasks} chunks");
    let handles = chunks
        .into_iter()
        .map(|chunk| {
            let solve = solve.clone();
            executor.execute(move || solve(chunk))
        })
        .collect::<Vec<_>>();
    let mut results = wait_all(handles)?;

    let mut _pass = 0;
    while results.len() > 1 {
        _pass += 1;
        log_trace!(
            "[engine] Fold pass {_pass}: merging {} results ({merge_strategy:?})",
            results.len()
        );
        let pairs = into_pairs(results)?;
        results = match merge_strategy {
            MergeStrategy::Trivial => {
                // Every pair of the pass is merged before reporting a failure.
                let outcomes = pairs
                    .map(|(left, right)| {
                        catch_unwind(AssertUnwindSafe(|| merge(left, right)))
                            .map_err(Error::from_panic)
                    })
                    .collect::<Vec<_>>();
                outcomes.into_iter().collect::<Result<Vec<_>>>()?
            }
            MergeStrategy::Concurrent => {
                let handles = pairs
                    .map(|(left, right)| {
                        let merge = merge.clone();
                        executor.execute(move || merge(left, right))
                    })
                    .collect::<Vec<_>>();
                wait_all(handles)?
            }
        };
    }
    log_debug!("[engine] Folded all results in {_pass} passes");

    results.pop().ok_or(Error::ZeroSubtasks)
}

/// Groups results into adjacent pairs `(r[2k], r[2k + 1])`.
fn into_pairs<R>(results: Vec<R>) -> Result<impl Iterator<Item = (R, R)>> {
    if results.len() % 2 != 0 {
        return Err(Error::OddFoldCount(results.len()));
    }
    let mut iter = results.into_iter();
    Ok(std::iter::from_fn(move || Some((iter.next()?, iter.next()?))))
}
