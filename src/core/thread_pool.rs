// Copyright 2024-2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A fixed-size pool of worker threads fed by a shared task queue.

use super::queue::ConcurrentQueue;
use super::sync::Status;
use super::task::{Awaitable, BoxedTask, FireAndForget, TaskHandle};
use crate::error::{Error, Result};
use crate::macros::{log_debug, log_error, log_warn};
use crossbeam_utils::CachePadded;
// Platforms that support `libc::sched_setaffinity()`.
#[cfg(all(
    not(miri),
    any(
        target_os = "android",
        target_os = "dragonfly",
        target_os = "freebsd",
        target_os = "linux"
    )
))]
use nix::{
    sched::{sched_setaffinity, CpuSet},
    unistd::Pid,
};
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

/// Number of threads to spawn in a thread pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThreadCount {
    /// Spawn the number of threads returned by
    /// [`std::thread::available_parallelism()`].
    AvailableParallelism,
    /// Spawn the given number of threads.
    Count(NonZeroUsize),
}

impl ThreadCount {
    /// Resolves the number of threads to spawn.
    pub fn count(self) -> Result<NonZeroUsize> {
        match self {
            ThreadCount::AvailableParallelism => hardware_concurrency(),
            ThreadCount::Count(count) => Ok(count),
        }
    }
}

impl TryFrom<usize> for ThreadCount {
    type Error = <NonZeroUsize as TryFrom<usize>>::Error;

    fn try_from(thread_count: usize) -> std::result::Result<Self, Self::Error> {
        let count = NonZeroUsize::try_from(thread_count)?;
        Ok(ThreadCount::Count(count))
    }
}

/// Returns the number of threads that this machine can run in parallel.
pub fn hardware_concurrency() -> Result<NonZeroUsize> {
    std::thread::available_parallelism().map_err(|e| Error::ParallelismUnknown(e.to_string()))
}

/// Policy to pin worker threads to CPUs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CpuPinningPolicy {
    /// Don't pin worker threads to CPUs.
    No,
    /// Pin worker thread `i` to CPU `i`, if CPU pinning is supported and
    /// implemented on this platform. Failures are logged and ignored.
    IfSupported,
    /// Pin worker thread `i` to CPU `i`. If that fails, building the thread
    /// pool fails.
    Always,
}

/// A builder for [`ThreadPool`].
#[derive(Clone, Copy, Debug)]
pub struct ThreadPoolBuilder {
    /// Number of worker threads to spawn in the pool.
    pub num_threads: ThreadCount,
    /// Policy to pin worker threads to CPUs.
    pub cpu_pinning: CpuPinningPolicy,
}

impl ThreadPoolBuilder {
    /// Spawns a thread pool.
    ///
    /// This returns once every worker thread has started and applied the CPU
    /// pinning policy.
    ///
    /// ```
    /// # use dncpool::{CpuPinningPolicy, ThreadCount, ThreadPoolBuilder};
    /// let pool = ThreadPoolBuilder {
    ///     num_threads: ThreadCount::try_from(2).unwrap(),
    ///     cpu_pinning: CpuPinningPolicy::No,
    /// }
    /// .build()
    /// .unwrap();
    ///
    /// let answer = pool.add_awaitable_task(|| 6 * 7);
    /// assert_eq!(answer.wait(), Ok(42));
    /// pool.shutdown();
    /// ```
    pub fn build(&self) -> Result<ThreadPool> {
        ThreadPool::new(self)
    }
}

/// Lifecycle of the pool, observed by the worker threads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PoolStatus {
    /// Workers wait for tasks.
    Running,
    /// Workers drain the queue, then exit.
    ShuttingDown,
}

/// Outcome of applying the pinning policy on a worker thread.
enum PinOutcome {
    Pinned(usize),
    Unpinned,
    Failed(Error),
}

/// Context shared between the pool owner, the producers and the worker
/// threads.
struct SharedContext {
    /// Pending tasks, in submission order.
    queue: ConcurrentQueue<BoxedTask>,
    /// Running flag and wake-up signal of the workers.
    status: Status<PoolStatus>,
    /// Number of tasks that have finished running.
    completed: CachePadded<AtomicUsize>,
}

/// A fixed set of worker threads, consuming tasks from a shared FIFO queue.
///
/// Tasks submitted before [`shutdown()`](Self::shutdown) are all executed:
/// shutting down waits for the workers to drain the queue. Dropping the pool
/// shuts it down as well.
pub struct ThreadPool {
    /// Handles to all the worker threads in the pool.
    threads: Vec<WorkerThreadHandle>,
    /// CPU each worker thread is pinned to, by worker index.
    worker_cpus: Vec<Option<usize>>,
    shared: Arc<SharedContext>,
}

/// Handle to a worker thread in a thread pool.
struct WorkerThreadHandle {
    /// Thread handle object.
    handle: JoinHandle<()>,
}

impl ThreadPool {
    /// Spawns one worker per logical core, each pinned to the core of the same
    /// index when the platform supports it.
    pub fn initialize() -> Result<Self> {
        ThreadPoolBuilder {
            num_threads: ThreadCount::AvailableParallelism,
            cpu_pinning: CpuPinningPolicy::IfSupported,
        }
        .build()
    }

    /// Creates a new thread pool using the given parameters.
    fn new(builder: &ThreadPoolBuilder) -> Result<Self> {
        let num_threads: usize = builder.num_threads.count()?.into();

        #[cfg(any(
            miri,
            not(any(
                target_os = "android",
                target_os = "dragonfly",
                target_os = "freebsd",
                target_os = "linux"
            ))
        ))]
        match builder.cpu_pinning {
            CpuPinningPolicy::No => (),
            CpuPinningPolicy::IfSupported => {
                log_warn!("Pinning threads to CPUs is not implemented on this platform.")
            }
            CpuPinningPolicy::Always => {
                return Err(Error::CpuPinning {
                    worker: 0,
                    reason: "pinning threads to CPUs is not implemented on this platform"
                        .to_owned(),
                })
            }
        }

        let shared = Arc::new(SharedContext {
            queue: ConcurrentQueue::new(),
            status: Status::new(PoolStatus::Running),
            completed: CachePadded::new(AtomicUsize::new(0)),
        });
        let startup: Arc<Status<Vec<Option<PinOutcome>>>> =
            Arc::new(Status::new((0..num_threads).map(|_| None).collect()));

        // From here on, returning early drops the pool, which joins the workers
        // spawned so far.
        let mut pool = Self {
            threads: Vec::with_capacity(num_threads),
            worker_cpus: Vec::with_capacity(num_threads),
            shared,
        };

        for id in 0..num_threads {
            let context = WorkerContext {
                id,
                shared: pool.shared.clone(),
            };
            let startup = startup.clone();
            let cpu_pinning = builder.cpu_pinning;
            let handle = std::thread::Builder::new()
                .name(format!("dncpool-worker-{id}"))
                .spawn(move || {
                    let outcome = pin_current_thread(id, cpu_pinning);
                    startup.notify_all_with(|reports| reports[id] = Some(outcome));
                    context.run()
                })
                .map_err(|e| {
                    log_error!("[main thread] Failed to spawn thread #{id}: {e}");
                    Error::ThreadSpawn(e.to_string())
                })?;
            pool.threads.push(WorkerThreadHandle { handle });
        }
        log_debug!("[main thread] Spawned {num_threads} threads");

        let reports = std::mem::take(
            &mut *startup.wait_while(|reports| reports.iter().any(Option::is_none)),
        );
        for outcome in reports.into_iter().flatten() {
            match outcome {
                PinOutcome::Pinned(cpu) => pool.worker_cpus.push(Some(cpu)),
                PinOutcome::Unpinned => pool.worker_cpus.push(None),
                PinOutcome::Failed(e) => return Err(e),
            }
        }

        Ok(pool)
    }

    /// Returns the number of worker threads in this pool, i.e. the maximum
    /// number of tasks that run in parallel.
    pub fn max_concurrency(&self) -> usize {
        self.threads.len()
    }

    /// Returns the CPU that each worker thread is pinned to, indexed by worker.
    /// Unpinned workers are reported as [`None`].
    pub fn worker_cpus(&self) -> &[Option<usize>] {
        &self.worker_cpus
    }

    /// Returns the number of tasks waiting in the queue.
    pub fn pending_tasks(&self) -> usize {
        self.shared.queue.len()
    }

    /// Returns the number of tasks that have finished running, successfully
    /// or not.
    ///
    /// A task is counted before its result is handed to its [`TaskHandle`], so
    /// every result already received through [`TaskHandle::wait()`] is
    /// included.
    pub fn completed_tasks(&self) -> usize {
        self.shared.completed.load(Ordering::SeqCst)
    }

    /// Submits a task whose outcome isn't observed. If the task panics, the
    /// panic is logged and the worker moves on to the next task.
    pub fn add_task(&self, f: impl FnOnce() + Send + 'static) {
        self.submit(Box::new(FireAndForget::new(f)));
    }

    /// Submits a task and returns a handle to its result.
    ///
    /// ```
    /// # use dncpool::ThreadPool;
    /// let pool = ThreadPool::initialize().unwrap();
    /// let (a, b) = (20, 22);
    /// let sum = pool.add_awaitable_task(move || a + b);
    /// assert_eq!(sum.wait(), Ok(42));
    /// ```
    pub fn add_awaitable_task<R: Send + 'static>(
        &self,
        f: impl FnOnce() -> R + Send + 'static,
    ) -> TaskHandle<R> {
        let (task, handle) = Awaitable::new(f);
        self.submit(Box::new(task));
        handle
    }

    /// Enqueues the task and wakes up one parked worker.
    fn submit(&self, task: BoxedTask) {
        self.shared.queue.enqueue(task);
        self.shared.status.notify_one();
    }

    /// Waits for the queue to be drained, then joins all the threads in the
    /// pool.
    pub fn shutdown(mut self) {
        self.join_workers();
    }

    #[allow(clippy::unused_enumerate_index)]
    fn join_workers(&mut self) {
        if self.threads.is_empty() {
            return;
        }

        log_debug!("[main thread] Notifying threads to finish...");
        self.shared
            .status
            .notify_all_with(|status| *status = PoolStatus::ShuttingDown);

        log_debug!("[main thread] Joining threads in the pool...");
        for (_i, t) in self.threads.drain(..).enumerate() {
            let result = t.handle.join();
            match result {
                Ok(_) => log_debug!("[main thread] Thread {_i} joined with result: {result:?}"),
                Err(_) => log_error!("[main thread] Thread {_i} joined with result: {result:?}"),
            }
        }
        log_debug!(
            "[main thread] Joined threads after {} tasks.",
            self.completed_tasks()
        );
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.join_workers();
    }
}

#[cfg(all(
    not(miri),
    any(
        target_os = "android",
        target_os = "dragonfly",
        target_os = "freebsd",
        target_os = "linux"
    )
))]
fn pin_current_thread(id: usize, cpu_pinning: CpuPinningPolicy) -> PinOutcome {
    if cpu_pinning == CpuPinningPolicy::No {
        return PinOutcome::Unpinned;
    }
    let mut cpu_set = CpuSet::new();
    let result = cpu_set
        .set(id)
        .and_then(|()| sched_setaffinity(Pid::from_raw(0), &cpu_set));
    match (result, cpu_pinning) {
        (Ok(()), _) => {
            log_debug!("Pinned thread #{id} to CPU #{id}");
            PinOutcome::Pinned(id)
        }
        (Err(_e), CpuPinningPolicy::IfSupported) => {
            log_warn!("Failed to set CPU affinity for thread #{id}: {_e}");
            PinOutcome::Unpinned
        }
        (Err(e), _) => PinOutcome::Failed(Error::CpuPinning {
            worker: id,
            reason: e.to_string(),
        }),
    }
}

#[cfg(any(
    miri,
    not(any(
        target_os = "android",
        target_os = "dragonfly",
        target_os = "freebsd",
        target_os = "linux"
    ))
))]
fn pin_current_thread(_id: usize, _cpu_pinning: CpuPinningPolicy) -> PinOutcome {
    // `Always` is rejected before spawning on these platforms.
    PinOutcome::Unpinned
}

/// Context object owned by a worker thread.
struct WorkerContext {
    /// Thread index.
    id: usize,
    shared: Arc<SharedContext>,
}

impl WorkerContext {
    /// Main function run by this thread: park until the queue has a task or the
    /// pool shuts down, run one task, repeat. Once shutting down, the queue is
    /// drained before exiting.
    fn run(&self) {
        let _id = self.id;
        log_debug!("[thread {_id}] Started");
        loop {
            let status = *self.shared.status.wait_while(|status| {
                *status == PoolStatus::Running && self.shared.queue.is_empty()
            });

            match self.shared.queue.dequeue() {
                Some(task) => task.run(&self.shared.completed),
                // Another worker took the task we were woken up for.
                None if status == PoolStatus::Running => continue,
                None => break,
            }
        }
        log_debug!("[thread {_id}] Received finish signal and drained the queue");
    }
}
