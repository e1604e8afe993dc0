// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! RTPS protocol constants (DDS-RTPS v2.3 Sec.8.3)
//!
//! Centralizes the magic numbers, vendor id, submessage kinds and flag bits
//! used by the codec.

/// RTPS protocol magic string: "RTPS" (Sec.8.3.3.1)
pub const RTPS_MAGIC: &[u8; 4] = b"RTPS";

/// RTPS protocol version: 2.4 (Sec.8.3.3.1)
pub const RTPS_VERSION_MAJOR: u8 = 0x02;
pub const RTPS_VERSION_MINOR: u8 = 0x04;

/// HDDS Vendor ID (EXPERIMENTAL - not registered with OMG).
pub const HDDS_VENDOR_ID: [u8; 2] = [0x01, 0xAA];

/// Message header: magic (4) + version (2) + vendor (2) + prefix (12).
pub const RTPS_HEADER_SIZE: usize = 20;

/// Submessage header: kind (1) + flags (1) + length (2).
pub const SUBMESSAGE_HEADER_SIZE: usize = 4;

// ============================================================================
// Submessage kinds (Sec.8.3.3.2)
// ============================================================================

pub const SUBMSG_ACKNACK: u8 = 0x06;
pub const SUBMSG_HEARTBEAT: u8 = 0x07;
pub const SUBMSG_GAP: u8 = 0x08;
pub const SUBMSG_INFO_TS: u8 = 0x09;

// ============================================================================
// Flag bits
// ============================================================================

/// Bit 0 of every submessage: 0 = little-endian, 1 = big-endian.
pub const FLAG_ENDIANNESS: u8 = 0x01;

/// HEARTBEAT: no response required.
pub const HEARTBEAT_FLAG_FINAL: u8 = 0x02;
/// HEARTBEAT: liveliness assertion.
pub const HEARTBEAT_FLAG_LIVELINESS: u8 = 0x04;

/// ACKNACK: no response required.
pub const ACKNACK_FLAG_FINAL: u8 = 0x02;

/// INFO_TS: timestamp invalidated, no body follows.
pub const INFO_TS_FLAG_INVALIDATE: u8 = 0x02;

// ============================================================================
// Fixed body sizes
// ============================================================================

/// readerId + writerId + firstSN + lastSN + count.
pub const HEARTBEAT_BODY_SIZE: usize = 28;

/// seconds + fraction.
pub const INFO_TS_BODY_SIZE: usize = 8;
