// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Interface discovery and multicast group management.
//!
//! [`IpFinder`] supplies the addresses a participant substitutes when it is
//! created without default unicast locators.

use std::io;
use std::net::{IpAddr, Ipv4Addr};

use socket2::Socket;

use crate::config::UNICAST_IF_ENV;

/// Source of the host's discoverable IPv4 addresses.
pub trait IpFinder: Send + Sync {
    fn ipv4_addresses(&self) -> Vec<Ipv4Addr>;
}

/// Non-loopback host interfaces, honoring `HDDS_UNICAST_IF`.
#[derive(Debug, Default, Clone, Copy)]
pub struct HostIpFinder;

impl IpFinder for HostIpFinder {
    fn ipv4_addresses(&self) -> Vec<Ipv4Addr> {
        if let Ok(addr_str) = std::env::var(UNICAST_IF_ENV) {
            match addr_str.parse::<Ipv4Addr>() {
                Ok(ipv4) => {
                    log::debug!("[UDP] Using {}={}", UNICAST_IF_ENV, ipv4);
                    return vec![ipv4];
                }
                Err(_) => log::debug!(
                    "[UDP] [!]  Invalid {}='{}' -- falling back to auto-detect",
                    UNICAST_IF_ENV,
                    addr_str
                ),
            }
        }
        host_interfaces()
    }
}

/// Fixed address list, for tests and pinned deployments.
#[derive(Debug, Default, Clone)]
pub struct StaticIpFinder(pub Vec<Ipv4Addr>);

impl IpFinder for StaticIpFinder {
    fn ipv4_addresses(&self) -> Vec<Ipv4Addr> {
        self.0.clone()
    }
}

/// All non-loopback IPv4 interfaces via `local_ip_address`.
pub fn host_interfaces() -> Vec<Ipv4Addr> {
    let interfaces = match local_ip_address::list_afinet_netifas() {
        Ok(ifs) => ifs,
        Err(e) => {
            log::debug!("[UDP] Failed to list network interfaces: {}", e);
            return vec![];
        }
    };

    let addrs: Vec<Ipv4Addr> = interfaces
        .into_iter()
        .filter_map(|(_name, ip)| match ip {
            IpAddr::V4(ipv4) if !ipv4.is_loopback() => Some(ipv4),
            _ => None,
        })
        .collect();

    log::debug!("[UDP] Discovered {} non-loopback interfaces", addrs.len());
    addrs
}

/// Join `group` on every non-loopback interface (UNSPECIFIED if none).
///
/// Per-interface failures are logged and skipped; the call fails only when
/// no join succeeded at all.
pub fn join_multicast_group(socket: &Socket, group: Ipv4Addr) -> io::Result<()> {
    let mut interfaces = host_interfaces();
    if interfaces.is_empty() {
        interfaces.push(Ipv4Addr::UNSPECIFIED);
    }

    let mut joined = 0usize;
    let mut last_err = None;
    for iface in &interfaces {
        match socket.join_multicast_v4(&group, iface) {
            Ok(()) => {
                log::debug!("[UDP] join_multicast_v4({}) on interface {}", group, iface);
                joined += 1;
            }
            Err(e) if e.raw_os_error() == Some(libc::EADDRINUSE) => {
                log::debug!(
                    "[UDP] join_multicast_v4({}) on {} - already joined, skipping",
                    group,
                    iface
                );
                joined += 1;
            }
            Err(e) => {
                log::debug!(
                    "[UDP] join_multicast_v4({}) on {} failed (non-fatal): {}",
                    group,
                    iface,
                    e
                );
                last_err = Some(e);
            }
        }
    }

    if joined == 0 {
        return Err(last_err.unwrap_or_else(|| io::Error::other("no interface joined")));
    }
    socket.set_multicast_loop_v4(true)?;
    Ok(())
}
