// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Counting semaphore signalling that a send/event/listen resource is ready.
//!
//! # Contract
//! - `post` never blocks and accumulates when nobody waits.
//! - `wait` blocks with no timeout and cannot be cancelled; the only way out
//!   is a post. Shutdown calls [`ResourceSemaphore::release_waiters`] to
//!   issue one balancing post per blocked waiter.

use parking_lot::{Condvar, Mutex};

#[derive(Debug, Default)]
struct State {
    permits: usize,
    waiters: usize,
}

#[derive(Debug, Default)]
pub struct ResourceSemaphore {
    state: Mutex<State>,
    condvar: Condvar,
}

impl ResourceSemaphore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one permit and wake one waiter.
    pub fn post(&self) {
        let mut state = self.state.lock();
        state.permits += 1;
        self.condvar.notify_one();
    }

    /// Block until a permit is available, then take it.
    pub fn wait(&self) {
        let mut state = self.state.lock();
        state.waiters += 1;
        while state.permits == 0 {
            self.condvar.wait(&mut state);
        }
        state.permits -= 1;
        state.waiters -= 1;
    }

    /// Take a permit if one is available.
    pub fn try_wait(&self) -> bool {
        let mut state = self.state.lock();
        if state.permits == 0 {
            return false;
        }
        state.permits -= 1;
        true
    }

    /// Permits posted but not yet consumed.
    pub fn available(&self) -> usize {
        self.state.lock().permits
    }

    /// Threads currently blocked in [`ResourceSemaphore::wait`].
    pub fn waiters(&self) -> usize {
        self.state.lock().waiters
    }

    /// Post once for every blocked waiter not already covered by a permit.
    pub fn release_waiters(&self) {
        let mut state = self.state.lock();
        let missing = state.waiters.saturating_sub(state.permits);
        if missing > 0 {
            log::debug!("[semaphore] releasing {} blocked waiter(s)", missing);
            state.permits += missing;
            self.condvar.notify_all();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_posts_accumulate_before_wait() {
        let sem = ResourceSemaphore::new();
        sem.post();
        sem.post();
        sem.post();
        assert_eq!(sem.available(), 3);
        sem.wait();
        sem.wait();
        assert_eq!(sem.available(), 1);
        assert!(sem.try_wait());
        assert!(!sem.try_wait());
    }

    #[test]
    fn test_wait_blocks_until_post() {
        let sem = Arc::new(ResourceSemaphore::new());
        let s = Arc::clone(&sem);
        let waiter = thread::spawn(move || {
            s.wait();
        });

        // Give the waiter time to block.
        while sem.waiters() == 0 {
            thread::sleep(Duration::from_millis(1));
        }
        thread::sleep(Duration::from_millis(20));
        assert!(!waiter.is_finished());

        sem.post();
        waiter.join().expect("waiter thread");
        assert_eq!(sem.available(), 0);
        assert_eq!(sem.waiters(), 0);
    }

    #[test]
    fn test_release_waiters_unblocks_everyone() {
        let sem = Arc::new(ResourceSemaphore::new());
        let handles: Vec<_> = (0..3)
            .map(|_| {
                let s = Arc::clone(&sem);
                thread::spawn(move || s.wait())
            })
            .collect();

        while sem.waiters() < 3 {
            thread::sleep(Duration::from_millis(1));
        }
        sem.release_waiters();
        for h in handles {
            h.join().expect("waiter thread");
        }
        assert_eq!(sem.available(), 0);
    }
}
