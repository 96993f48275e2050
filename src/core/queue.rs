// Copyright 2024 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! An unbounded FIFO queue shared between producers and worker threads.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A first-in first-out queue that can be accessed from multiple threads.
///
/// All operations are serialized by a single mutex. The queue is unbounded:
/// [`enqueue()`](Self::enqueue) never blocks nor fails.
pub struct ConcurrentQueue<T> {
    items: Mutex<VecDeque<T>>,
}

impl<T> Default for ConcurrentQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ConcurrentQueue<T> {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
        }
    }

    /// Appends an item at the tail of the queue.
    pub fn enqueue(&self, item: T) {
        self.lock().push_back(item);
    }

    /// Removes the item at the head of the queue, or returns [`None`] if the
    /// queue is empty.
    pub fn dequeue(&self) -> Option<T> {
        self.lock().pop_front()
    }

    /// Returns whether the queue is empty at the time of the call.
    ///
    /// Other threads may modify the queue as soon as this returns.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Returns the number of items in the queue at the time of the call.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<T>> {
        // No user code runs under this lock.
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
