// Copyright 2024-2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Core runtime: task queue, tasks, worker pool and execution back-ends.

mod executor;
mod queue;
mod sync;
mod task;
mod thread_pool;

pub use executor::{Executor, OsThreads};
pub use queue::ConcurrentQueue;
pub use task::TaskHandle;
pub(crate) use task::wait_all;
pub use thread_pool::{
    hardware_concurrency, CpuPinningPolicy, ThreadCount, ThreadPool, ThreadPoolBuilder,
};
