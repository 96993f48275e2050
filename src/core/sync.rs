// Copyright 2024 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Synchronization primitives

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// An ergonomic wrapper around a [`Mutex`]-[`Condvar`] pair.
///
/// User code never runs while the mutex is held, so a poisoned mutex still
/// contains a consistent value and is recovered rather than propagated.
pub struct Status<T> {
    mutex: Mutex<T>,
    condvar: Condvar,
}

impl<T> Status<T> {
    /// Creates a new status initialized with the given value.
    pub fn new(t: T) -> Self {
        Self {
            mutex: Mutex::new(t),
            condvar: Condvar::new(),
        }
    }

    /// Locks the status without waiting for any condition.
    pub fn lock(&self) -> MutexGuard<'_, T> {
        self.mutex.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Updates the status with the given function and notifies one waiting
    /// thread.
    pub fn notify_one_with<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let result = f(&mut *self.lock());
        self.condvar.notify_one();
        result
    }

    /// Updates the status with the given function and notifies all waiting
    /// threads.
    pub fn notify_all_with<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let result = f(&mut *self.lock());
        self.condvar.notify_all();
        result
    }

    /// Wakes up one waiting thread without modifying the status.
    ///
    /// The lock is taken before notifying, so that a thread that evaluated its
    /// predicate under the lock can't miss the notification.
    pub fn notify_one(&self) {
        let _guard = self.lock();
        self.condvar.notify_one();
    }

    /// Waits until the predicate is false on this status.
    ///
    /// This returns a [`MutexGuard`], allowing to further inspect or modify the
    /// status.
    pub fn wait_while(&self, predicate: impl FnMut(&mut T) -> bool) -> MutexGuard<'_, T> {
        self.condvar
            .wait_while(self.lock(), predicate)
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_status_wait_and_notify() {
        let status = Arc::new(Status::new(0usize));

        let waiter = std::thread::spawn({
            let status = status.clone();
            move || *status.wait_while(|value| *value < 3)
        });

        for _ in 0..3 {
            status.notify_all_with(|value| *value += 1);
        }

        assert_eq!(waiter.join().unwrap(), 3);
        assert_eq!(*status.lock(), 3);
    }

    #[test]
    fn test_status_notify_one_returns_result() {
        let status = Status::new(vec![1, 2]);
        let len = status.notify_one_with(|v| {
            v.push(3);
            v.len()
        });
        assert_eq!(len, 3);
    }

    #[test]
    fn test_status_survives_poisoning() {
        let status = Arc::new(Status::new(42));
        let result = std::thread::spawn({
            let status = status.clone();
            move || {
                let _guard = status.lock();
                panic!("poisoning the status");
            }
        })
        .join();
        assert!(result.is_err());
        assert_eq!(*status.lock(), 42);
    }
}
