// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! RTPS locator: where a participant or endpoint can be reached.
//!
//! The 16-byte address field carries IPv4 addresses in its last 4 bytes.
//! Two locators are equal when kind, address and port all match; this is the
//! key the participant uses to share listen resources.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::str::FromStr;

/// Locator address family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum LocatorKind {
    Invalid = -1,
    Reserved = 0,
    UdpV4 = 1,
    UdpV6 = 2,
}

impl LocatorKind {
    pub fn from_i32(value: i32) -> Self {
        match value {
            0 => LocatorKind::Reserved,
            1 => LocatorKind::UdpV4,
            2 => LocatorKind::UdpV6,
            _ => LocatorKind::Invalid,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "qos-loaders",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "String", into = "String")
)]
pub struct Locator {
    pub kind: LocatorKind,
    pub address: [u8; 16],
    pub port: u32,
}

impl Locator {
    pub const INVALID: Locator = Locator {
        kind: LocatorKind::Invalid,
        address: [0; 16],
        port: 0,
    };

    pub fn udpv4(ip: Ipv4Addr, port: u32) -> Self {
        let mut address = [0u8; 16];
        address[12..16].copy_from_slice(&ip.octets());
        Self {
            kind: LocatorKind::UdpV4,
            address,
            port,
        }
    }

    pub fn udpv6(ip: Ipv6Addr, port: u32) -> Self {
        Self {
            kind: LocatorKind::UdpV6,
            address: ip.octets(),
            port,
        }
    }

    pub fn from_socket_addr(addr: &SocketAddr) -> Self {
        match addr {
            SocketAddr::V4(v4) => Self::udpv4(*v4.ip(), u32::from(v4.port())),
            SocketAddr::V6(v6) => Self::udpv6(*v6.ip(), u32::from(v6.port())),
        }
    }

    pub fn ip(&self) -> Option<IpAddr> {
        match self.kind {
            LocatorKind::UdpV4 => {
                let mut octets = [0u8; 4];
                octets.copy_from_slice(&self.address[12..16]);
                Some(IpAddr::V4(Ipv4Addr::from(octets)))
            }
            LocatorKind::UdpV6 => Some(IpAddr::V6(Ipv6Addr::from(self.address))),
            LocatorKind::Invalid | LocatorKind::Reserved => None,
        }
    }

    /// `None` for invalid/reserved kinds or ports outside the UDP range.
    pub fn to_socket_addr(&self) -> Option<SocketAddr> {
        let port = u16::try_from(self.port).ok()?;
        self.ip().map(|ip| SocketAddr::new(ip, port))
    }

    pub fn is_multicast(&self) -> bool {
        self.ip().is_some_and(|ip| ip.is_multicast())
    }

    pub fn is_valid(&self) -> bool {
        matches!(self.kind, LocatorKind::UdpV4 | LocatorKind::UdpV6)
    }

    pub fn with_port(mut self, port: u32) -> Self {
        self.port = port;
        self
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_socket_addr() {
            Some(addr) => write!(f, "{}", addr),
            None => write!(f, "invalid"),
        }
    }
}

impl fmt::Debug for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Locator({:?}, {})", self.kind, self)
    }
}

impl FromStr for Locator {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<SocketAddr>()
            .map(|addr| Locator::from_socket_addr(&addr))
            .map_err(|e| crate::Error::Config(format!("invalid locator '{}': {}", s, e)))
    }
}

impl TryFrom<String> for Locator {
    type Error = crate::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Locator> for String {
    fn from(locator: Locator) -> Self {
        locator.to_string()
    }
}
