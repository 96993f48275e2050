// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Back-ends that run awaitable units of work concurrently.

use super::task::{Awaitable, TaskHandle};
use super::thread_pool::ThreadPool;
use crate::error::Error;
use crate::macros::log_error;
use std::sync::{Arc, Mutex, PoisonError};

/// Something that can run a closure concurrently with the caller and hand back
/// a handle to its result.
pub trait Executor {
    /// Starts running `f` and returns a handle to its result without waiting
    /// for it.
    fn execute<R, F>(&self, f: F) -> TaskHandle<R>
    where
        R: Send + 'static,
        F: FnOnce() -> R + Send + 'static;
}

/// Routes each unit of work through the pool's shared queue.
impl Executor for ThreadPool {
    fn execute<R, F>(&self, f: F) -> TaskHandle<R>
    where
        R: Send + 'static,
        F: FnOnce() -> R + Send + 'static,
    {
        self.add_awaitable_task(f)
    }
}

impl<E: Executor + ?Sized> Executor for &E {
    fn execute<R, F>(&self, f: F) -> TaskHandle<R>
    where
        R: Send + 'static,
        F: FnOnce() -> R + Send + 'static,
    {
        (**self).execute(f)
    }
}

impl<E: Executor + ?Sized> Executor for Arc<E> {
    fn execute<R, F>(&self, f: F) -> TaskHandle<R>
    where
        R: Send + 'static,
        F: FnOnce() -> R + Send + 'static,
    {
        (**self).execute(f)
    }
}

/// Unmanaged back-end: spawns a new detached OS thread for every unit of work.
///
/// If the operating system refuses to spawn the thread, the returned handle
/// resolves to [`Error::ThreadSpawn`].
#[derive(Clone, Copy, Debug, Default)]
pub struct OsThreads;

impl Executor for OsThreads {
    fn execute<R, F>(&self, f: F) -> TaskHandle<R>
    where
        R: Send + 'static,
        F: FnOnce() -> R + Send + 'static,
    {
        spawn_awaitable(std::thread::Builder::new(), f)
    }
}

/// Runs `f` on a new thread configured by `builder`.
fn spawn_awaitable<R, F>(builder: std::thread::Builder, f: F) -> TaskHandle<R>
where
    R: Send + 'static,
    F: FnOnce() -> R + Send + 'static,
{
    let (task, handle) = Awaitable::new(f);
    // The task stays reachable from here if the thread never starts.
    let slot = Arc::new(Mutex::new(Some(task)));
    let spawned = builder.spawn({
        let slot = slot.clone();
        move || {
            if let Some(task) = take(&slot) {
                task.run_inline();
            }
        }
    });
    if let Err(e) = spawned {
        log_error!("Failed to spawn a thread for an awaitable task: {e}");
        if let Some(task) = take(&slot) {
            task.fail(Error::ThreadSpawn(e.to_string()));
        }
    }
    handle
}

fn take<T>(slot: &Mutex<Option<T>>) -> Option<T> {
    slot.lock().unwrap_or_else(PoisonError::into_inner).take()
}
