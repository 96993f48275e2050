// Copyright 2024 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Units of work executed by worker threads, and the handles through which
//! their results are observed.

use super::sync::Status;
use crate::error::{Error, Result};
use crate::macros::log_error;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// A unit of work owned by the queue until a worker dequeues it.
pub trait Task: Send {
    /// Runs the task body, consuming the task.
    ///
    /// `completed` is incremented once the body has returned, before its
    /// outcome becomes observable by anyone waiting on it.
    fn run(self: Box<Self>, completed: &AtomicUsize);
}

/// A type-erased task, as stored in the pool's queue.
pub type BoxedTask = Box<dyn Task>;

/// A task whose outcome isn't observed by anyone.
pub struct FireAndForget<F> {
    func: F,
}

impl<F: FnOnce() + Send> FireAndForget<F> {
    /// Wraps the given closure.
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F: FnOnce() + Send> Task for FireAndForget<F> {
    fn run(self: Box<Self>, completed: &AtomicUsize) {
        let outcome = catch_unwind(AssertUnwindSafe(self.func));
        completed.fetch_add(1, Ordering::SeqCst);
        if let Err(payload) = outcome {
            let _error = Error::from_panic(payload);
            log_error!("Fire-and-forget task failed, dropping it: {_error}");
        }
    }
}

/// A task that writes its outcome into a single-assignment result cell.
pub struct Awaitable<F, R> {
    func: F,
    promise: Promise<R>,
}

impl<F, R> Awaitable<F, R>
where
    F: FnOnce() -> R + Send,
    R: Send,
{
    /// Wraps the given closure, returning the task together with the handle
    /// that will observe its result.
    pub fn new(func: F) -> (Self, TaskHandle<R>) {
        let (promise, handle) = result_cell();
        (Self { func, promise }, handle)
    }

    /// Runs the task on the current thread.
    pub fn run_inline(self) {
        self.run_then_publish(|| ());
    }

    /// Resolves the handle to the given error without running the task.
    pub fn fail(self, error: Error) {
        self.promise.fulfill(Err(error));
    }

    /// Runs the task body, calls `before_publish`, then writes the outcome.
    fn run_then_publish(self, before_publish: impl FnOnce()) {
        let outcome = catch_unwind(AssertUnwindSafe(self.func)).map_err(Error::from_panic);
        before_publish();
        self.promise.fulfill(outcome);
    }
}

impl<F, R> Task for Awaitable<F, R>
where
    F: FnOnce() -> R + Send,
    R: Send,
{
    fn run(self: Box<Self>, completed: &AtomicUsize) {
        (*self).run_then_publish(|| {
            completed.fetch_add(1, Ordering::SeqCst);
        })
    }
}

/// Shared state of a result cell.
type Cell<R> = Status<Option<Result<R>>>;

/// Creates a connected pair of write side and read side of a result cell.
fn result_cell<R>() -> (Promise<R>, TaskHandle<R>) {
    let cell = Arc::new(Status::new(None));
    (
        Promise {
            cell: Some(cell.clone()),
        },
        TaskHandle { cell },
    )
}

/// Write side of a result cell. It can be fulfilled at most once; dropping it
/// unfulfilled resolves the cell to [`Error::TaskAbandoned`].
pub struct Promise<R> {
    cell: Option<Arc<Cell<R>>>,
}

impl<R> Promise<R> {
    /// Writes the outcome and wakes up the waiting handle.
    pub fn fulfill(mut self, outcome: Result<R>) {
        if let Some(cell) = self.cell.take() {
            cell.notify_all_with(|slot| *slot = Some(outcome));
        }
    }
}

impl<R> Drop for Promise<R> {
    fn drop(&mut self) {
        if let Some(cell) = self.cell.take() {
            cell.notify_all_with(|slot| *slot = Some(Err(Error::TaskAbandoned)));
        }
    }
}

/// Handle to the result of an awaitable task.
///
/// The result is written exactly once, by the thread that ran the task.
#[must_use = "dropping a task handle discards the task's result"]
pub struct TaskHandle<R> {
    cell: Arc<Cell<R>>,
}

impl<R> TaskHandle<R> {
    /// Blocks the calling thread until the task has completed, and returns its
    /// result.
    ///
    /// A task that panicked resolves to [`Error::TaskPanicked`].
    pub fn wait(self) -> Result<R> {
        let mut guard = self.cell.wait_while(|slot| slot.is_none());
        match guard.take() {
            Some(outcome) => outcome,
            // Unreachable: the predicate above only returns on a filled slot.
            None => Err(Error::TaskAbandoned),
        }
    }

    /// Returns whether the result is available, i.e. whether
    /// [`wait()`](Self::wait) would return without blocking.
    pub fn is_finished(&self) -> bool {
        self.cell.lock().is_some()
    }
}

/// Waits for all the given handles, preserving their order.
///
/// Every handle is waited for, even after a failure, so that no unit of work
/// is still running when this returns. The first failure in index order is
/// returned.
pub fn wait_all<R>(handles: impl IntoIterator<Item = TaskHandle<R>>) -> Result<Vec<R>> {
    let outcomes = handles
        .into_iter()
        .map(TaskHandle::wait)
        .collect::<Vec<_>>();
    outcomes.into_iter().collect()
}
