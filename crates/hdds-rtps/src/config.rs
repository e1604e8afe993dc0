// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Engine configuration: compile-time constants and participant attributes.
//!
//! Every numeric default used by the participant, the listen resources and
//! the codec lives here. `ParticipantAttributes` can be loaded from YAML when
//! the `qos-loaders` feature is enabled.
//!
//! # Example YAML
//!
//! ```yaml
//! name: sensor_node
//! participant_id: 3
//! default_unicast_locators: ["192.168.1.20:7411"]
//! default_multicast_locators: ["239.255.0.1:7400"]
//! default_send_port: 10040
//! discovery:
//!   use_simple_participant_discovery: true
//!   use_writer_liveliness: true
//! ```

use std::time::Duration;

use crate::core::types::Locator;

// =======================================================================
// Wire limits
// =======================================================================

/// Maximum RTPS message size (UDP datagram limit).
pub const RTPS_MESSAGE_MAX_SIZE: usize = 65536;

/// Largest value the 24-bit entity id counter may take.
pub const ENTITY_COUNTER_MAX: u32 = 0x00FF_FFFF;

// =======================================================================
// Ports
// =======================================================================

/// Port given to discovered host addresses when a participant is created
/// without default unicast locators.
pub const FALLBACK_UNICAST_PORT: u32 = 7555;

/// Local port of the participant send channel (0 = ephemeral).
pub const DEFAULT_SEND_PORT: u32 = 10040;

/// How many following ports a non-fixed locator may probe when its port is
/// already taken.
pub const LISTEN_PORT_PROBE_COUNT: u32 = 32;

// =======================================================================
// Threads
// =======================================================================

/// Receive poll timeout of listen threads; bounds shutdown latency.
pub const LISTEN_POLL_TIMEOUT: Duration = Duration::from_millis(100);

/// Environment variable forcing the address used for default locators.
pub const UNICAST_IF_ENV: &str = "HDDS_UNICAST_IF";

/// Which discovery/liveliness collaborators the participant installs.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "qos-loaders",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct DiscoveryAttributes {
    pub use_simple_participant_discovery: bool,
    pub use_writer_liveliness: bool,
    /// Participant announcement period.
    pub resend_period_ms: u64,
    /// Participant lease duration.
    pub lease_duration_ms: u64,
}

impl Default for DiscoveryAttributes {
    fn default() -> Self {
        Self {
            use_simple_participant_discovery: true,
            use_writer_liveliness: true,
            resend_period_ms: 3000,
            lease_duration_ms: 30000,
        }
    }
}

/// Construction inputs of a [`crate::Participant`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "qos-loaders",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct ParticipantAttributes {
    pub name: String,
    pub participant_id: u8,
    pub default_unicast_locators: Vec<Locator>,
    pub default_multicast_locators: Vec<Locator>,
    pub default_send_port: u32,
    /// SO_SNDBUF hint (0 = OS default).
    pub send_socket_buffer_size: usize,
    /// SO_RCVBUF hint (0 = OS default).
    pub listen_socket_buffer_size: usize,
    pub discovery: DiscoveryAttributes,
}

impl Default for ParticipantAttributes {
    fn default() -> Self {
        Self {
            name: "participant".to_string(),
            participant_id: 0,
            default_unicast_locators: Vec::new(),
            default_multicast_locators: Vec::new(),
            default_send_port: DEFAULT_SEND_PORT,
            send_socket_buffer_size: 0,
            listen_socket_buffer_size: 0,
            discovery: DiscoveryAttributes::default(),
        }
    }
}

#[cfg(feature = "qos-loaders")]
impl ParticipantAttributes {
    /// Parse attributes from a YAML document.
    pub fn from_yaml_str(yaml: &str) -> crate::Result<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| crate::Error::Config(format!("Failed to parse YAML: {}", e)))
    }

    /// Load attributes from a YAML file.
    pub fn from_yaml_file<P: AsRef<std::path::Path>>(path: P) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            crate::Error::Config(format!(
                "Failed to read {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_yaml_str(&content)
    }
}
