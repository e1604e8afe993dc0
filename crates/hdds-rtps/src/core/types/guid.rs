// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! RTPS GUID (Globally Unique Identifier) implementation.
//!
//! A GUID is a 12-byte [`GuidPrefix`] shared by every entity of a participant
//! plus a 4-byte [`EntityId`] naming one entity inside it.

use std::fmt;

use crate::config::ENTITY_COUNTER_MAX;
use crate::protocol::constants::HDDS_VENDOR_ID;

/// User writer, topic without key.
pub const ENTITY_KIND_WRITER_NO_KEY: u8 = 0x03;
/// User writer, topic with key.
pub const ENTITY_KIND_WRITER_WITH_KEY: u8 = 0x02;
/// User reader, topic without key.
pub const ENTITY_KIND_READER_NO_KEY: u8 = 0x04;
/// User reader, topic with key.
pub const ENTITY_KIND_READER_WITH_KEY: u8 = 0x07;

/// Participant-wide 12-byte prefix.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct GuidPrefix(pub [u8; 12]);

impl GuidPrefix {
    pub const UNKNOWN: GuidPrefix = GuidPrefix([0; 12]);

    pub const fn new(bytes: [u8; 12]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 12] {
        &self.0
    }

    /// Build a fresh prefix for this host and process.
    ///
    /// # Layout
    /// - bytes 0-1: vendor id
    /// - bytes 2-5: host id (first local IPv4, timestamp fallback)
    /// - bytes 6-9: process id (big-endian)
    /// - bytes 10-11: participant id
    pub fn generate(participant_id: u8) -> Self {
        let host_id = host_id();
        let pid = std::process::id().to_be_bytes();

        let mut prefix = [0u8; 12];
        prefix[0..2].copy_from_slice(&HDDS_VENDOR_ID);
        prefix[2..6].copy_from_slice(&host_id);
        prefix[6..10].copy_from_slice(&pid);
        prefix[10] = 0;
        prefix[11] = participant_id;

        log::debug!(
            "[GUID] Generated prefix: host={:02x?} app={:02x?} instance={}",
            &host_id,
            &pid,
            participant_id
        );
        Self(prefix)
    }
}

fn host_id() -> [u8; 4] {
    if let Ok(std::net::IpAddr::V4(v4)) = local_ip_address::local_ip() {
        return v4.octets();
    }

    let now = std::time::SystemTime::now()
        .duration_since(std::time::SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    (now as u32).to_be_bytes()
}

impl fmt::Display for GuidPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl fmt::Debug for GuidPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GuidPrefix({})", self)
    }
}

/// 4-byte entity identifier. Byte 3 is the entity kind.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default, PartialOrd, Ord)]
pub struct EntityId(pub [u8; 4]);

impl EntityId {
    pub const UNKNOWN: EntityId = EntityId([0x00, 0x00, 0x00, 0x00]);
    pub const PARTICIPANT: EntityId = EntityId([0x00, 0x00, 0x01, 0xC1]);

    pub const SPDP_READER: EntityId = EntityId([0x00, 0x01, 0x00, 0xC7]);
    pub const SPDP_WRITER: EntityId = EntityId([0x00, 0x01, 0x00, 0xC2]);
    pub const SEDP_PUBLICATIONS_READER: EntityId = EntityId([0x00, 0x00, 0x03, 0xC7]);
    pub const SEDP_PUBLICATIONS_WRITER: EntityId = EntityId([0x00, 0x00, 0x03, 0xC2]);
    pub const SEDP_SUBSCRIPTIONS_READER: EntityId = EntityId([0x00, 0x00, 0x04, 0xC7]);
    pub const SEDP_SUBSCRIPTIONS_WRITER: EntityId = EntityId([0x00, 0x00, 0x04, 0xC2]);
    pub const P2P_MESSAGE_READER: EntityId = EntityId([0x00, 0x02, 0x00, 0xC7]);
    pub const P2P_MESSAGE_WRITER: EntityId = EntityId([0x00, 0x02, 0x00, 0xC2]);

    pub const fn new(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }

    /// Build a user entity id from a participant-local counter value.
    ///
    /// Counter bits 16..24 land in byte 0, bits 8..16 in byte 1 and bits
    /// 0..8 in byte 2. Returns `None` once the counter no longer fits in
    /// three bytes.
    pub fn from_counter(counter: u32, kind: u8) -> Option<Self> {
        if counter > ENTITY_COUNTER_MAX {
            return None;
        }
        let be = counter.to_be_bytes();
        Some(Self([be[1], be[2], be[3], kind]))
    }

    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }

    #[inline]
    pub fn kind(&self) -> u8 {
        self.0[3]
    }

    /// Builtin entities carry `0b11` in the two high bits of the kind.
    pub fn is_builtin(&self) -> bool {
        self.kind() & 0xC0 == 0xC0
    }

    pub fn is_writer(&self) -> bool {
        matches!(self.kind() & 0x3F, 0x02 | 0x03)
    }

    pub fn is_reader(&self) -> bool {
        matches!(self.kind() & 0x3F, 0x04 | 0x07)
    }

    pub fn is_unknown(&self) -> bool {
        *self == Self::UNKNOWN
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02x}.{:02x}.{:02x}.{:02x}",
            self.0[0], self.0[1], self.0[2], self.0[3]
        )
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self)
    }
}

/// RTPS GUID: prefix + entity id.
///
/// # Display Format
/// Hex with dots: "01.aa.0a.00.00.05.00.00.12.34.00.01.00.00.01.c1"
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct Guid {
    pub prefix: GuidPrefix,
    pub entity_id: EntityId,
}

impl Guid {
    pub const UNKNOWN: Guid = Guid {
        prefix: GuidPrefix::UNKNOWN,
        entity_id: EntityId::UNKNOWN,
    };

    pub const fn new(prefix: GuidPrefix, entity_id: EntityId) -> Self {
        Self { prefix, entity_id }
    }

    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        let mut prefix = [0u8; 12];
        let mut entity_id = [0u8; 4];
        prefix.copy_from_slice(&bytes[0..12]);
        entity_id.copy_from_slice(&bytes[12..16]);
        Self::new(GuidPrefix(prefix), EntityId(entity_id))
    }

    pub fn as_bytes(&self) -> [u8; 16] {
        let mut bytes = [0u8; 16];
        bytes[0..12].copy_from_slice(&self.prefix.0);
        bytes[12..16].copy_from_slice(&self.entity_id.0);
        bytes
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.prefix, self.entity_id)
    }
}

impl fmt::Debug for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Guid({})", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guid_display() {
        let guid = Guid::new(
            GuidPrefix([1, 15, 172, 16, 0, 0, 0, 0, 0, 0, 0, 1]),
            EntityId::PARTICIPANT,
        );
        assert_eq!(
            guid.to_string(),
            "01.0f.ac.10.00.00.00.00.00.00.00.01.00.00.01.c1"
        );
    }

    #[test]
    fn test_guid_as_bytes() {
        let orig = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16];
        assert_eq!(Guid::from_bytes(orig).as_bytes(), orig);
    }

    #[test]
    fn test_entity_id_counter_mapping() {
        let id = EntityId::from_counter(0x00AB_CDEF, ENTITY_KIND_WRITER_NO_KEY)
            .expect("counter fits in three bytes");
        assert_eq!(id.0, [0xAB, 0xCD, 0xEF, 0x03]);

        let first = EntityId::from_counter(1, ENTITY_KIND_READER_WITH_KEY)
            .expect("counter fits in three bytes");
        assert_eq!(first.0, [0x00, 0x00, 0x01, 0x07]);
    }

    #[test]
    fn test_entity_id_counter_limit() {
        assert!(EntityId::from_counter(ENTITY_COUNTER_MAX, 0x03).is_some());
        assert!(EntityId::from_counter(ENTITY_COUNTER_MAX + 1, 0x03).is_none());
    }

    #[test]
    fn test_entity_kind_classification() {
        assert!(EntityId::SPDP_WRITER.is_builtin());
        assert!(EntityId::SPDP_WRITER.is_writer());
        assert!(EntityId::SEDP_SUBSCRIPTIONS_READER.is_reader());
        assert!(!EntityId([0, 0, 1, ENTITY_KIND_READER_NO_KEY]).is_builtin());
        assert!(EntityId([0, 0, 1, ENTITY_KIND_WRITER_WITH_KEY]).is_writer());
        assert!(!EntityId::PARTICIPANT.is_writer());
        assert!(!EntityId::PARTICIPANT.is_reader());
    }

    #[test]
    fn test_generated_prefix_layout() {
        let prefix = GuidPrefix::generate(42);
        assert_eq!(&prefix.0[0..2], &HDDS_VENDOR_ID);
        assert_eq!(&prefix.0[6..10], &std::process::id().to_be_bytes());
        assert_eq!(prefix.0[10], 0);
        assert_eq!(prefix.0[11], 42);
    }
}
