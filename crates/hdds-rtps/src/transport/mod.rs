// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Transport seams and implementations.
//!
//! The participant never touches sockets directly. Inbound traffic goes
//! through a [`ListenTransport`] that opens one [`ReceiveChannel`] per
//! locator; outbound traffic goes through a [`SendTransport`] wrapped in a
//! [`SendChannel`].
//!
//! - [`udp`]: socket2 + mio UDP sockets
//! - [`memory`]: in-process datagram bus (tests, intra-process setups)
//! - [`listen`]: listen resources (one receive thread per locator)
//! - [`multicast`]: interface discovery and multicast group join

pub mod listen;
pub mod memory;
pub mod multicast;
pub mod send;
pub mod udp;

use std::io;
use std::time::Duration;

use crate::core::types::Locator;

pub use listen::{ListenResource, ListenerMetrics};
pub use memory::MemoryTransport;
pub use multicast::{HostIpFinder, IpFinder, StaticIpFinder};
pub use send::SendChannel;
pub use udp::{UdpListenTransport, UdpSendTransport};

/// One bound receiving endpoint. Owned by exactly one listen thread.
pub trait ReceiveChannel: Send {
    /// Concrete locator the channel is bound to.
    fn locator(&self) -> Locator;

    /// Wait up to `timeout` for one datagram.
    ///
    /// Returns `Ok(None)` on timeout.
    fn recv_timeout(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<Option<usize>>;
}

/// Factory of receive channels.
pub trait ListenTransport: Send + Sync {
    /// Bind a channel for `locator`.
    ///
    /// When `is_fixed` is false the transport may bind a different concrete
    /// locator (port 0 picks an ephemeral port, a taken port probes the
    /// following ones); the result's [`ReceiveChannel::locator`] tells which.
    fn open(
        &self,
        locator: &Locator,
        is_multicast: bool,
        is_fixed: bool,
    ) -> io::Result<Box<dyn ReceiveChannel>>;
}

/// Datagram sender.
pub trait SendTransport: Send + Sync {
    fn send_to(&self, data: &[u8], destination: &Locator) -> io::Result<usize>;
}
