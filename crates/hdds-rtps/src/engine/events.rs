// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Event scheduler: one thread running deferred actions at their deadline.
//!
//! ```text
//! EventHandle::schedule_after ──cmd_tx──► scheduler thread
//!                                          BinaryHeap<(deadline, id)>
//!                                          recv_timeout(next deadline)
//!                                          fire due actions
//! ```
//!
//! Endpoints receive a cloned [`EventHandle`]; the handle stays usable for
//! as long as the endpoint lives. After the scheduler stops, scheduling
//! through a stale handle reports `false` and does nothing.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};

use super::semaphore::ResourceSemaphore;

type EventAction = Box<dyn FnOnce() + Send + 'static>;

/// Identifier returned by [`EventHandle::schedule_after`].
pub type EventId = u64;

enum EventCommand {
    Schedule {
        id: EventId,
        deadline: Instant,
        action: EventAction,
    },
    Cancel(EventId),
    Shutdown,
}

/// Cheap, clonable handle used to schedule work on the event thread.
#[derive(Clone)]
pub struct EventHandle {
    cmd_tx: Sender<EventCommand>,
    next_id: Arc<AtomicU64>,
}

impl EventHandle {
    /// Run `action` on the event thread once `delay` has elapsed.
    ///
    /// Returns `None` if the scheduler is gone.
    pub fn schedule_after<F>(&self, delay: Duration, action: F) -> Option<EventId>
    where
        F: FnOnce() + Send + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.cmd_tx
            .send(EventCommand::Schedule {
                id,
                deadline: Instant::now() + delay,
                action: Box::new(action),
            })
            .ok()
            .map(|()| id)
    }

    /// Drop a pending event. No effect if it already fired.
    pub fn cancel(&self, id: EventId) {
        let _ = self.cmd_tx.send(EventCommand::Cancel(id));
    }
}

impl std::fmt::Debug for EventHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventHandle").finish_non_exhaustive()
    }
}

/// Owner of the event thread. Dropping it stops and joins the thread;
/// pending events are discarded.
pub struct EventScheduler {
    handle: EventHandle,
    thread: Option<JoinHandle<()>>,
}

impl EventScheduler {
    /// Spawn the event thread. It posts `semaphore` once it is running.
    pub fn start(name: &str, semaphore: Arc<ResourceSemaphore>) -> std::io::Result<Self> {
        let (cmd_tx, cmd_rx) = channel::unbounded();
        let thread = thread::Builder::new()
            .name(format!("{}-events", name))
            .spawn(move || {
                semaphore.post();
                run_events(&cmd_rx);
            })?;

        log::debug!("[events] scheduler started for '{}'", name);
        Ok(Self {
            handle: EventHandle {
                cmd_tx,
                next_id: Arc::new(AtomicU64::new(1)),
            },
            thread: Some(thread),
        })
    }

    pub fn handle(&self) -> EventHandle {
        self.handle.clone()
    }

    pub fn shutdown(&mut self) {
        if let Some(thread) = self.thread.take() {
            let _ = self.handle.cmd_tx.send(EventCommand::Shutdown);
            if thread.thread().id() == thread::current().id() {
                return;
            }
            if thread.join().is_err() {
                log::error!("[events] scheduler thread panicked");
            }
        }
    }
}

impl Drop for EventScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_events(cmd_rx: &Receiver<EventCommand>) {
    let mut deadlines: BinaryHeap<Reverse<(Instant, EventId)>> = BinaryHeap::new();
    let mut actions: HashMap<EventId, EventAction> = HashMap::new();

    loop {
        let now = Instant::now();
        while let Some(Reverse((deadline, id))) = deadlines.peek().copied() {
            if deadline > now {
                break;
            }
            deadlines.pop();
            if let Some(action) = actions.remove(&id) {
                action();
            }
        }

        let command = match deadlines.peek() {
            Some(Reverse((deadline, _))) => {
                match cmd_rx.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
                    Ok(cmd) => cmd,
                    Err(RecvTimeoutError::Timeout) => continue,
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            None => match cmd_rx.recv() {
                Ok(cmd) => cmd,
                Err(_) => break,
            },
        };

        match command {
            EventCommand::Schedule {
                id,
                deadline,
                action,
            } => {
                deadlines.push(Reverse((deadline, id)));
                actions.insert(id, action);
            }
            EventCommand::Cancel(id) => {
                actions.remove(&id);
            }
            EventCommand::Shutdown => break,
        }
    }

    if !actions.is_empty() {
        log::debug!("[events] discarding {} pending event(s)", actions.len());
    }
}
