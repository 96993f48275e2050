// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Bare fork-join on scoped OS threads.

use crate::error::{Error, Result};

/// A unit of work for [`exec_parallel()`]. It may borrow from the caller's
/// stack.
pub type ForkTask<'a> = Box<dyn FnOnce() + Send + 'a>;

/// Runs all the given closures concurrently, each on its own scoped thread, and
/// blocks until all of them have completed.
///
/// Every closure runs to completion even if another one panics. The first
/// failure, in the order of the closures, is returned.
///
/// See also the [`exec_parallel!`](crate::exec_parallel!) macro, which boxes
/// its arguments.
pub fn exec_parallel(tasks: Vec<ForkTask<'_>>) -> Result<()> {
    std::thread::scope(|scope| {
        let handles = tasks
            .into_iter()
            .map(|task| std::thread::Builder::new().spawn_scoped(scope, task))
            .collect::<Vec<_>>();
        let outcomes = handles
            .into_iter()
            .map(|handle| match handle {
                Ok(handle) => handle.join().map_err(Error::from_panic),
                Err(e) => Err(Error::ThreadSpawn(e.to_string())),
            })
            .collect::<Vec<_>>();
        outcomes.into_iter().collect()
    })
}

/// Runs closures of possibly different types concurrently and waits for all
/// of them. Evaluates to a [`Result<()>`](crate::Result).
///
/// ```
/// let mut data = vec![5, 3, 1, 4, 2, 6];
/// let (left, right) = data.split_at_mut(3);
/// dncpool::exec_parallel!(|| left.sort(), || right.reverse()).unwrap();
/// assert_eq!(data, [1, 3, 5, 6, 2, 4]);
/// ```
#[macro_export]
macro_rules! exec_parallel {
    ( $( $task:expr ),+ $(,)? ) => {
        $crate::exec_parallel(vec![ $( Box::new($task) as $crate::ForkTask<'_> ),+ ])
    };
}
