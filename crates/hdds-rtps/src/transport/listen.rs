// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Listen resources.
//!
//! A listen resource owns one [`ReceiveChannel`] and the thread draining
//! it. Every datagram is decoded once and each submessage is offered to the
//! endpoints associated with the resource. Association lists are
//! snapshotted per datagram, so endpoints may be added or removed while the
//! thread runs.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::RwLock;

use super::ReceiveChannel;
use crate::config::{LISTEN_POLL_TIMEOUT, RTPS_MESSAGE_MAX_SIZE};
use crate::core::types::{EntityId, Locator};
use crate::endpoint::EndpointRegistry;
use crate::protocol::RtpsMessage;

#[derive(Debug, Default)]
pub struct ListenerMetrics {
    pub packets_received: AtomicU64,
    pub bytes_received: AtomicU64,
    pub decode_errors: AtomicU64,
    pub receive_errors: AtomicU64,
    pub submessages_dispatched: AtomicU64,
}

pub struct ListenResource {
    locator: Locator,
    is_multicast: bool,
    is_fixed: bool,
    associated: Arc<RwLock<Vec<EntityId>>>,
    running: Arc<AtomicBool>,
    metrics: Arc<ListenerMetrics>,
    handle: Option<JoinHandle<()>>,
}

impl ListenResource {
    /// Start the receive thread for `channel` and wait until it runs.
    ///
    /// Readiness is a rendezvous private to this resource, so no other
    /// waiter can consume it.
    pub fn spawn(
        mut channel: Box<dyn ReceiveChannel>,
        is_multicast: bool,
        is_fixed: bool,
        registry: Arc<EndpointRegistry>,
    ) -> std::io::Result<Self> {
        let locator = channel.locator();
        let associated = Arc::new(RwLock::new(Vec::new()));
        let running = Arc::new(AtomicBool::new(true));
        let metrics = Arc::new(ListenerMetrics::default());

        let thread_associated = Arc::clone(&associated);
        let thread_running = Arc::clone(&running);
        let thread_metrics = Arc::clone(&metrics);
        let (ready_tx, ready_rx) = crossbeam::channel::bounded::<()>(0);

        let handle = thread::Builder::new()
            .name(format!("hdds-listen-{}", locator.port))
            .spawn(move || {
                let _ = ready_tx.send(());
                drop(ready_tx);
                let mut buf = vec![0u8; RTPS_MESSAGE_MAX_SIZE];
                while thread_running.load(Ordering::Acquire) {
                    match channel.recv_timeout(&mut buf, LISTEN_POLL_TIMEOUT) {
                        Ok(Some(len)) => {
                            thread_metrics.packets_received.fetch_add(1, Ordering::Relaxed);
                            thread_metrics
                                .bytes_received
                                .fetch_add(len as u64, Ordering::Relaxed);
                            dispatch(&buf[..len], &thread_associated, &registry, &thread_metrics);
                        }
                        Ok(None) => {}
                        Err(e) => {
                            thread_metrics.receive_errors.fetch_add(1, Ordering::Relaxed);
                            log::debug!("[listen] {} receive failed: {}", locator, e);
                            if e.kind() == std::io::ErrorKind::BrokenPipe {
                                break;
                            }
                        }
                    }
                }
                log::trace!("[listen] {} thread exiting", locator);
            })?;

        if ready_rx.recv().is_err() {
            // Only possible if the thread died before its first statement.
            let _ = handle.join();
            return Err(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("listen thread for {} did not start", locator),
            ));
        }

        log::debug!(
            "[listen] resource on {} (multicast={}, fixed={})",
            locator,
            is_multicast,
            is_fixed
        );

        Ok(Self {
            locator,
            is_multicast,
            is_fixed,
            associated,
            running,
            metrics,
            handle: Some(handle),
        })
    }

    /// Concrete bound locator.
    pub fn locator(&self) -> Locator {
        self.locator
    }

    pub fn is_multicast(&self) -> bool {
        self.is_multicast
    }

    pub fn is_fixed(&self) -> bool {
        self.is_fixed
    }

    /// Associate an endpoint. Associating twice is a no-op.
    pub fn associate(&self, id: EntityId) {
        let mut ids = self.associated.write();
        if !ids.contains(&id) {
            ids.push(id);
        }
    }

    /// Returns `true` if `id` was associated.
    pub fn dissociate(&self, id: EntityId) -> bool {
        let mut ids = self.associated.write();
        match ids.iter().position(|x| *x == id) {
            Some(pos) => {
                ids.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn is_associated(&self, id: EntityId) -> bool {
        self.associated.read().contains(&id)
    }

    pub fn associated(&self) -> Vec<EntityId> {
        self.associated.read().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.associated.read().is_empty()
    }

    pub fn metrics(&self) -> &ListenerMetrics {
        &self.metrics
    }

    /// Stop the receive thread and wait for it, unless called from that
    /// very thread (an endpoint deleting itself from a callback).
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            if handle.thread().id() == thread::current().id() {
                log::debug!("[listen] {} stopped from its own thread, detaching", self.locator);
                return;
            }
            if handle.join().is_err() {
                log::error!("[listen] {} thread panicked", self.locator);
            }
        }
    }
}

impl Drop for ListenResource {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for ListenResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenResource")
            .field("locator", &self.locator)
            .field("is_multicast", &self.is_multicast)
            .field("associated", &*self.associated.read())
            .finish()
    }
}

fn dispatch(
    datagram: &[u8],
    associated: &RwLock<Vec<EntityId>>,
    registry: &EndpointRegistry,
    metrics: &ListenerMetrics,
) {
    let message = match RtpsMessage::parse(datagram) {
        Ok(message) => message,
        Err(e) => {
            metrics.decode_errors.fetch_add(1, Ordering::Relaxed);
            log::debug!("[listen] dropping {} byte datagram: {}", datagram.len(), e);
            return;
        }
    };

    let ids = associated.read().clone();
    let source = message.header.guid_prefix;
    for submessage in &message.submessages {
        for id in &ids {
            // Clone out of the map so no shard lock is held during the callback.
            let endpoint = match registry.get(id) {
                Some(entry) => Arc::clone(entry.value()),
                None => continue,
            };
            if endpoint.handle_submessage(source, submessage) {
                metrics.submessages_dispatched.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{ListenTransport, MemoryTransport};
    use dashmap::DashMap;
    use std::net::Ipv4Addr;
    use std::time::{Duration, Instant};

    fn spawn_on(bus: &MemoryTransport, port: u32) -> ListenResource {
        let locator = Locator::udpv4(Ipv4Addr::new(10, 0, 0, 9), port);
        let channel = bus.open(&locator, false, true).expect("bind");
        ListenResource::spawn(channel, false, true, Arc::new(DashMap::new())).expect("spawn")
    }

    #[test]
    fn test_spawn_returns_with_thread_running() {
        let bus = MemoryTransport::new();
        let resource = spawn_on(&bus, 7600);
        assert!(resource.handle.as_ref().is_some_and(|h| !h.is_finished()));
        assert_eq!(resource.locator().port, 7600);
    }

    #[test]
    fn test_association_list() {
        let bus = MemoryTransport::new();
        let resource = spawn_on(&bus, 7601);
        let a = EntityId([0, 0, 1, 0x03]);
        let b = EntityId([0, 0, 2, 0x04]);

        assert!(resource.is_empty());
        resource.associate(a);
        resource.associate(a);
        resource.associate(b);
        assert_eq!(resource.associated(), vec![a, b]);
        assert!(resource.dissociate(a));
        assert!(!resource.dissociate(a));
        assert!(resource.is_associated(b));
        assert!(resource.dissociate(b));
        assert!(resource.is_empty());
    }

    #[test]
    fn test_garbage_counts_decode_error() {
        let bus = MemoryTransport::new();
        let resource = spawn_on(&bus, 7602);
        assert_eq!(bus.inject(&resource.locator(), b"not an rtps message"), 1);

        let deadline = Instant::now() + Duration::from_secs(2);
        while resource.metrics().decode_errors.load(Ordering::Relaxed) == 0 {
            assert!(Instant::now() < deadline, "decode error not counted");
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(resource.metrics().packets_received.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_drop_releases_locator() {
        let bus = MemoryTransport::new();
        let resource = spawn_on(&bus, 7603);
        let locator = resource.locator();
        assert!(bus.is_bound(&locator));
        drop(resource);
        assert!(!bus.is_bound(&locator));
    }
}
