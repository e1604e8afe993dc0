// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Participant send channel shared by every endpoint.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::SendTransport;
use crate::core::types::Locator;

#[derive(Debug, Default)]
pub struct SendMetrics {
    pub datagrams_sent: AtomicU64,
    pub bytes_sent: AtomicU64,
    pub send_errors: AtomicU64,
}

/// Clonable handle over the participant's [`SendTransport`].
#[derive(Clone)]
pub struct SendChannel {
    transport: Arc<dyn SendTransport>,
    metrics: Arc<SendMetrics>,
}

impl SendChannel {
    pub fn new(transport: Arc<dyn SendTransport>) -> Self {
        Self {
            transport,
            metrics: Arc::new(SendMetrics::default()),
        }
    }

    /// Send one datagram to each locator. Returns how many sends succeeded;
    /// failures are logged and counted.
    pub fn send(&self, datagram: &[u8], destinations: &[Locator]) -> usize {
        let mut delivered = 0;
        for destination in destinations {
            match self.transport.send_to(datagram, destination) {
                Ok(bytes) => {
                    delivered += 1;
                    self.metrics.datagrams_sent.fetch_add(1, Ordering::Relaxed);
                    self.metrics
                        .bytes_sent
                        .fetch_add(bytes as u64, Ordering::Relaxed);
                }
                Err(e) => {
                    self.metrics.send_errors.fetch_add(1, Ordering::Relaxed);
                    log::debug!("[send] {} bytes to {} failed: {}", datagram.len(), destination, e);
                }
            }
        }
        delivered
    }

    pub fn metrics(&self) -> &SendMetrics {
        &self.metrics
    }
}

impl std::fmt::Debug for SendChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SendChannel")
            .field(
                "datagrams_sent",
                &self.metrics.datagrams_sent.load(Ordering::Relaxed),
            )
            .finish_non_exhaustive()
    }
}
