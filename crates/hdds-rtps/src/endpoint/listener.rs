// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Endpoint listener traits.
//!
//! # Thread Safety
//!
//! Callbacks run on listen-resource threads. Implementations must be
//! `Send + Sync` and should return quickly. A callback may delete its own
//! endpoint through the participant.

use crate::core::types::Guid;
use crate::protocol::{AckNack, Gap, Heartbeat};

/// Notifications delivered to a reader.
///
/// All methods have default no-op implementations.
pub trait ReaderListener: Send + Sync {
    /// Accepted HEARTBEAT from `writer`.
    fn on_heartbeat(&self, reader: &Guid, writer: &Guid, heartbeat: &Heartbeat) {
        let _ = (reader, writer, heartbeat);
    }

    /// Accepted GAP from `writer`.
    fn on_gap(&self, reader: &Guid, writer: &Guid, gap: &Gap) {
        let _ = (reader, writer, gap);
    }
}

/// Notifications delivered to a writer.
pub trait WriterListener: Send + Sync {
    /// Accepted ACKNACK from `reader`.
    fn on_acknack(&self, writer: &Guid, reader: &Guid, acknack: &AckNack) {
        let _ = (writer, reader, acknack);
    }
}
