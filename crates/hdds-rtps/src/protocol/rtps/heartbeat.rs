// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! HEARTBEAT submessage (RTPS 2.3 Section 8.3.7.5)
//!
//! Sent by a Writer to announce the range of sequence numbers it has
//! available, or to assert liveliness.
//!
//! ```text
//! 0                   1                   2                   3
//! 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |   HEARTBEAT   |0|0|0|0|0|L|F|E|      octetsToNextHeader       |
//! +---------------+---------------+-------------------------------+
//! |                         readerId                              |
//! +---------------------------------------------------------------+
//! |                         writerId                              |
//! +---------------------------------------------------------------+
//! +                     firstSN (SequenceNumber)                  +
//! +---------------------------------------------------------------+
//! +                     lastSN (SequenceNumber)                   +
//! +---------------------------------------------------------------+
//! |                           count                               |
//! +---------------------------------------------------------------+
//! ```

use super::{read_entity_id, read_sn, write_entity_id, write_sn, SubmessageBody};
use crate::core::ser::{Cursor, CursorMut, Endianness};
use crate::core::types::{EntityId, SequenceNumber};
use crate::protocol::constants::{HEARTBEAT_FLAG_FINAL, HEARTBEAT_FLAG_LIVELINESS, SUBMSG_HEARTBEAT};
use crate::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heartbeat {
    /// Target reader (ENTITYID_UNKNOWN addresses every reader).
    pub reader_id: EntityId,
    pub writer_id: EntityId,
    pub first_sn: SequenceNumber,
    pub last_sn: SequenceNumber,
    /// Per-writer, strictly increasing.
    pub count: i32,
    pub is_final: bool,
    pub liveliness: bool,
}

impl SubmessageBody for Heartbeat {
    const KIND: u8 = SUBMSG_HEARTBEAT;

    fn flags(&self) -> u8 {
        let mut flags = 0;
        if self.is_final {
            flags |= HEARTBEAT_FLAG_FINAL;
        }
        if self.liveliness {
            flags |= HEARTBEAT_FLAG_LIVELINESS;
        }
        flags
    }

    fn encode_body(&self, w: &mut CursorMut, endianness: Endianness) -> Result<()> {
        write_entity_id(w, &self.reader_id)?;
        write_entity_id(w, &self.writer_id)?;
        write_sn(w, self.first_sn, endianness)?;
        write_sn(w, self.last_sn, endianness)?;
        w.write_i32(self.count, endianness)?;
        Ok(())
    }

    fn decode_body(r: &mut Cursor<'_>, flags: u8, endianness: Endianness) -> Result<Self> {
        Ok(Self {
            reader_id: read_entity_id(r)?,
            writer_id: read_entity_id(r)?,
            first_sn: read_sn(r, endianness)?,
            last_sn: read_sn(r, endianness)?,
            count: r.read_i32(endianness)?,
            is_final: flags & HEARTBEAT_FLAG_FINAL != 0,
            liveliness: flags & HEARTBEAT_FLAG_LIVELINESS != 0,
        })
    }
}
