// Copyright 2024 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Error type shared by the worker pool, the divide-and-conquer engine and the
//! fork-join helper.

use std::any::Any;
use std::fmt;

/// Broad category of an [`Error`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// A precondition on the arguments of a call was violated. Nothing was
    /// executed.
    InvalidArgument,
    /// The machine can't provide the requested threads or CPUs.
    ResourceUnavailable,
    /// A unit of work failed to produce its result.
    TaskFailed,
}

/// Errors returned by this crate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// A divide-and-conquer run was requested with zero subtasks.
    ZeroSubtasks,
    /// A divide-and-conquer run was requested with an odd number of subtasks.
    OddSubtaskCount(usize),
    /// A fold pass would have to merge an odd number of results.
    OddFoldCount(usize),
    /// The split function didn't return the requested number of chunks.
    ChunkCountMismatch {
        /// Number of chunks that was requested.
        expected: usize,
        /// Number of chunks that the split function returned.
        actual: usize,
    },
    /// More parallelism was requested than the hardware provides.
    ResourceUnavailable {
        /// Requested degree of parallelism.
        requested: usize,
        /// Hardware concurrency of this machine.
        available: usize,
    },
    /// The hardware concurrency of this machine couldn't be determined.
    ParallelismUnknown(String),
    /// A worker thread couldn't be pinned to its CPU.
    CpuPinning {
        /// Index of the worker (and of the CPU it was meant for).
        worker: usize,
        /// Description of the failure.
        reason: String,
    },
    /// The operating system refused to spawn a thread.
    ThreadSpawn(String),
    /// The task body panicked with the given message.
    TaskPanicked(String),
    /// The task was dropped before producing its result.
    TaskAbandoned,
}

/// Result type of this crate.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns the category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::ZeroSubtasks
            | Error::OddSubtaskCount(_)
            | Error::OddFoldCount(_)
            | Error::ChunkCountMismatch { .. } => ErrorKind::InvalidArgument,
            Error::ResourceUnavailable { .. }
            | Error::ParallelismUnknown(_)
            | Error::CpuPinning { .. }
            | Error::ThreadSpawn(_) => ErrorKind::ResourceUnavailable,
            Error::TaskPanicked(_) | Error::TaskAbandoned => ErrorKind::TaskFailed,
        }
    }

    /// Converts the payload of a caught panic into an
    /// [`Error::TaskPanicked`].
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_owned()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_owned()
        };
        Error::TaskPanicked(message)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ZeroSubtasks => write!(f, "the number of subtasks must be positive"),
            Error::OddSubtaskCount(n) => {
                write!(f, "the number of subtasks must be even, got {n}")
            }
            Error::OddFoldCount(n) => write!(
                f,
                "a fold pass can only merge an even number of results, got {n}"
            ),
            Error::ChunkCountMismatch { expected, actual } => write!(
                f,
                "the split function returned {actual} chunks instead of {expected}"
            ),
            Error::ResourceUnavailable {
                requested,
                available,
            } => write!(
                f,
                "requested a parallelism of {requested} but the machine only has {available} cores"
            ),
            Error::ParallelismUnknown(reason) => {
                write!(f, "getting the available parallelism failed: {reason}")
            }
            Error::CpuPinning { worker, reason } => {
                write!(f, "failed to pin worker #{worker} to CPU #{worker}: {reason}")
            }
            Error::ThreadSpawn(reason) => write!(f, "failed to spawn a thread: {reason}"),
            Error::TaskPanicked(message) => write!(f, "task panicked: {message}"),
            Error::TaskAbandoned => write!(f, "task was dropped before completing"),
        }
    }
}

impl std::error::Error for Error {}
