// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! In-process datagram bus.
//!
//! Implements both [`ListenTransport`] and [`SendTransport`] over crossbeam
//! channels keyed by locator. Unicast locators admit one bound channel,
//! multicast locators any number. Tests use [`MemoryTransport::refuse`] to
//! simulate an unavailable address and [`MemoryTransport::inject`] to feed
//! raw datagrams.

use std::collections::HashSet;
use std::io;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use dashmap::DashMap;
use parking_lot::Mutex;

use super::{ListenTransport, ReceiveChannel, SendTransport};
use crate::config::LISTEN_PORT_PROBE_COUNT;
use crate::core::types::Locator;

/// First port handed out for port-0 requests.
const EPHEMERAL_PORT_BASE: u32 = 49152;

struct Route {
    id: u64,
    tx: Sender<Vec<u8>>,
}

#[derive(Default)]
struct Bus {
    routes: DashMap<Locator, Vec<Route>>,
    refused: Mutex<HashSet<Locator>>,
    next_id: AtomicU64,
    next_ephemeral: AtomicU32,
}

impl Bus {
    fn unregister(&self, locator: &Locator, id: u64) {
        let now_empty = match self.routes.get_mut(locator) {
            Some(mut routes) => {
                routes.retain(|r| r.id != id);
                routes.is_empty()
            }
            None => false,
        };
        if now_empty {
            self.routes.remove_if(locator, |_, routes| routes.is_empty());
        }
    }
}

#[derive(Clone, Default)]
pub struct MemoryTransport {
    bus: Arc<Bus>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later `open` of `locator` fail with `AddrNotAvailable`.
    pub fn refuse(&self, locator: Locator) {
        self.bus.refused.lock().insert(locator);
    }

    /// Deliver `datagram` to every channel bound to `locator`.
    ///
    /// Returns the number of channels reached.
    pub fn inject(&self, locator: &Locator, datagram: &[u8]) -> usize {
        match self.bus.routes.get(locator) {
            Some(routes) => routes
                .iter()
                .filter(|r| r.tx.send(datagram.to_vec()).is_ok())
                .count(),
            None => 0,
        }
    }

    pub fn is_bound(&self, locator: &Locator) -> bool {
        self.bus.routes.contains_key(locator)
    }

    pub fn bound_count(&self) -> usize {
        self.bus.routes.iter().map(|entry| entry.value().len()).sum()
    }

    fn register(&self, locator: Locator) -> MemoryReceiveChannel {
        let (tx, rx) = channel::unbounded();
        let id = self.bus.next_id.fetch_add(1, Ordering::Relaxed);
        self.bus
            .routes
            .entry(locator)
            .or_default()
            .push(Route { id, tx });
        MemoryReceiveChannel {
            rx,
            locator,
            id,
            bus: Arc::clone(&self.bus),
        }
    }

    fn is_free(&self, locator: &Locator) -> bool {
        !self.bus.refused.lock().contains(locator) && !self.bus.routes.contains_key(locator)
    }
}

impl ListenTransport for MemoryTransport {
    fn open(
        &self,
        locator: &Locator,
        is_multicast: bool,
        is_fixed: bool,
    ) -> io::Result<Box<dyn ReceiveChannel>> {
        if self.bus.refused.lock().contains(locator) {
            return Err(io::Error::new(
                io::ErrorKind::AddrNotAvailable,
                format!("{} refused", locator),
            ));
        }

        if is_multicast {
            return Ok(Box::new(self.register(*locator)));
        }

        if locator.port == 0 {
            loop {
                let port = EPHEMERAL_PORT_BASE + self.bus.next_ephemeral.fetch_add(1, Ordering::Relaxed);
                if port > u32::from(u16::MAX) {
                    return Err(io::Error::from(io::ErrorKind::AddrInUse));
                }
                let candidate = locator.with_port(port);
                if self.is_free(&candidate) {
                    return Ok(Box::new(self.register(candidate)));
                }
            }
        }

        let probes = if is_fixed { 1 } else { LISTEN_PORT_PROBE_COUNT };
        for offset in 0..probes {
            let candidate = locator.with_port(locator.port + offset);
            if self.is_free(&candidate) {
                return Ok(Box::new(self.register(candidate)));
            }
        }
        Err(io::Error::new(
            io::ErrorKind::AddrInUse,
            format!("{} already bound", locator),
        ))
    }
}

impl SendTransport for MemoryTransport {
    fn send_to(&self, data: &[u8], destination: &Locator) -> io::Result<usize> {
        self.inject(destination, data);
        Ok(data.len())
    }
}

impl std::fmt::Debug for MemoryTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryTransport")
            .field("bound", &self.bound_count())
            .finish()
    }
}

pub struct MemoryReceiveChannel {
    rx: Receiver<Vec<u8>>,
    locator: Locator,
    id: u64,
    bus: Arc<Bus>,
}

impl ReceiveChannel for MemoryReceiveChannel {
    fn locator(&self) -> Locator {
        self.locator
    }

    fn recv_timeout(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<Option<usize>> {
        match self.rx.recv_timeout(timeout) {
            Ok(datagram) => {
                let len = datagram.len().min(buf.len());
                buf[..len].copy_from_slice(&datagram[..len]);
                Ok(Some(len))
            }
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(io::Error::from(io::ErrorKind::BrokenPipe)),
        }
    }
}

impl Drop for MemoryReceiveChannel {
    fn drop(&mut self) {
        self.bus.unregister(&self.locator, self.id);
    }
}
