// Copyright 2024 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

#![doc = include_str!("../README.md")]
#![forbid(missing_docs, unsafe_code)]

pub mod algorithms;
mod core;
mod engine;
mod error;
mod fork_join;
mod macros;

pub use crate::core::{
    hardware_concurrency, ConcurrentQueue, CpuPinningPolicy, Executor, OsThreads, TaskHandle,
    ThreadCount, ThreadPool, ThreadPoolBuilder,
};
pub use engine::{divide_and_conquer, Engine, MergeStrategy, Problem};
pub use error::{Error, ErrorKind, Result};
pub use fork_join::{exec_parallel, ForkTask};
