// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! ACKNACK submessage (RTPS 2.3 Section 8.3.7.1)
//!
//! Body: readerId (4) · writerId (4) · readerSNState (SequenceNumberSet) ·
//! count (4). Every SN below `readerSNState.base` is acknowledged; bitmap
//! members are requested again.

use super::{read_entity_id, read_sn_set, write_entity_id, write_sn_set, SubmessageBody};
use crate::core::ser::{Cursor, CursorMut, Endianness};
use crate::core::types::{EntityId, SequenceNumberSet};
use crate::protocol::constants::{ACKNACK_FLAG_FINAL, SUBMSG_ACKNACK};
use crate::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AckNack {
    pub reader_id: EntityId,
    pub writer_id: EntityId,
    pub reader_sn_state: SequenceNumberSet,
    pub count: i32,
    pub is_final: bool,
}

impl SubmessageBody for AckNack {
    const KIND: u8 = SUBMSG_ACKNACK;

    fn flags(&self) -> u8 {
        if self.is_final {
            ACKNACK_FLAG_FINAL
        } else {
            0
        }
    }

    fn encode_body(&self, w: &mut CursorMut, endianness: Endianness) -> Result<()> {
        write_entity_id(w, &self.reader_id)?;
        write_entity_id(w, &self.writer_id)?;
        write_sn_set(w, &self.reader_sn_state, endianness)?;
        w.write_i32(self.count, endianness)?;
        Ok(())
    }

    fn decode_body(r: &mut Cursor<'_>, flags: u8, endianness: Endianness) -> Result<Self> {
        Ok(Self {
            reader_id: read_entity_id(r)?,
            writer_id: read_entity_id(r)?,
            reader_sn_state: read_sn_set(r, endianness)?,
            count: r.read_i32(endianness)?,
            is_final: flags & ACKNACK_FLAG_FINAL != 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::SequenceNumber;
    use crate::protocol::rtps::{read_submessage, write_submessage, Submessage};

    #[test]
    fn test_acknack_roundtrip_requests() {
        let ack = AckNack {
            reader_id: EntityId([0, 0, 2, 0x04]),
            writer_id: EntityId([0, 0, 1, 0x03]),
            reader_sn_state: SequenceNumberSet::from_members(
                SequenceNumber(4),
                [SequenceNumber(4), SequenceNumber(6)],
            )
            .expect("set"),
            count: 2,
            is_final: true,
        };
        let mut w = CursorMut::with_max_size(128);
        write_submessage(&mut w, &ack, Endianness::Big).expect("encode");
        let buf = w.into_vec();
        assert_eq!(buf[1], 0x03);

        let mut r = Cursor::new(&buf);
        match read_submessage(&mut r).expect("decode") {
            Some(Submessage::AckNack(decoded)) => assert_eq!(decoded, ack),
            other => panic!("unexpected {:?}", other),
        }
    }
}
