// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! GAP submessage (RTPS 2.3 Section 8.3.7.4)
//!
//! Sent by a Writer to tell Readers that a range of sequence numbers is no
//! longer relevant and will never be sent.
//!
//! Body: readerId (4) · writerId (4) · gapStart (8) · gapList, where gapList
//! is base (8) · numBits (4) · ceil(numBits/32) bitmap words.

use super::{
    read_entity_id, read_sn, read_sn_set, write_entity_id, write_sn, write_sn_set, SubmessageBody,
};
use crate::core::ser::{Cursor, CursorMut, Endianness};
use crate::core::types::{EntityId, SequenceNumber, SequenceNumberSet};
use crate::protocol::constants::SUBMSG_GAP;
use crate::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gap {
    pub reader_id: EntityId,
    pub writer_id: EntityId,
    pub gap_start: SequenceNumber,
    pub gap_list: SequenceNumberSet,
}

impl Gap {
    /// Irrelevant sequence numbers as inclusive `(first, last)` ranges: the
    /// contiguous range `[gap_start, gap_list.base)` (when non-empty)
    /// followed by one range per bitmap member.
    ///
    /// The leading range comes straight off the wire and may span up to
    /// 2^63 values; callers keep it as a range.
    pub fn irrelevant_ranges(&self) -> impl Iterator<Item = (SequenceNumber, SequenceNumber)> + '_ {
        let base = self.gap_list.base();
        let leading = (self.gap_start < base).then(|| (self.gap_start, SequenceNumber(base.0 - 1)));
        leading
            .into_iter()
            .chain(self.gap_list.iter().map(|sn| (sn, sn)))
    }
}

impl SubmessageBody for Gap {
    const KIND: u8 = SUBMSG_GAP;

    fn flags(&self) -> u8 {
        0
    }

    fn encode_body(&self, w: &mut CursorMut, endianness: Endianness) -> Result<()> {
        write_entity_id(w, &self.reader_id)?;
        write_entity_id(w, &self.writer_id)?;
        write_sn(w, self.gap_start, endianness)?;
        write_sn_set(w, &self.gap_list, endianness)?;
        Ok(())
    }

    fn decode_body(r: &mut Cursor<'_>, _flags: u8, endianness: Endianness) -> Result<Self> {
        Ok(Self {
            reader_id: read_entity_id(r)?,
            writer_id: read_entity_id(r)?,
            gap_start: read_sn(r, endianness)?,
            gap_list: read_sn_set(r, endianness)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::rtps::write_submessage;

    #[test]
    fn test_gap_length_tracks_bitmap_words() {
        let gap = Gap {
            reader_id: EntityId::UNKNOWN,
            writer_id: EntityId([0, 0, 1, 0x03]),
            gap_start: SequenceNumber(3),
            gap_list: SequenceNumberSet::new(SequenceNumber(5), 33).expect("set"),
        };
        let mut w = CursorMut::with_max_size(128);
        write_submessage(&mut w, &gap, Endianness::Little).expect("encode");
        let buf = w.into_vec();
        // 4 + 4 + 8 + 8 + 4 + 2 words
        assert_eq!(u16::from_le_bytes([buf[2], buf[3]]), 36);
        assert_eq!(buf.len(), 40);
        assert_eq!(buf[1], 0x00);
    }

    #[test]
    fn test_irrelevant_covers_range_and_bitmap() {
        let gap = Gap {
            reader_id: EntityId::UNKNOWN,
            writer_id: EntityId::UNKNOWN,
            gap_start: SequenceNumber(2),
            gap_list: SequenceNumberSet::from_members(
                SequenceNumber(5),
                [SequenceNumber(5), SequenceNumber(7)],
            )
            .expect("set"),
        };
        let ranges: Vec<(i64, i64)> = gap.irrelevant_ranges().map(|(a, b)| (a.0, b.0)).collect();
        assert_eq!(ranges, vec![(2, 4), (5, 5), (7, 7)]);
    }

    #[test]
    fn test_irrelevant_ranges_stay_bounded() {
        let gap = Gap {
            reader_id: EntityId::UNKNOWN,
            writer_id: EntityId::UNKNOWN,
            gap_start: SequenceNumber(i64::MIN),
            gap_list: SequenceNumberSet::new(SequenceNumber(i64::MAX - 10), 0).expect("set"),
        };
        let ranges: Vec<_> = gap.irrelevant_ranges().collect();
        assert_eq!(
            ranges,
            vec![(SequenceNumber(i64::MIN), SequenceNumber(i64::MAX - 11))]
        );

        // A start at or past the base contributes no leading range.
        let gap = Gap {
            gap_start: SequenceNumber(9),
            gap_list: SequenceNumberSet::new(SequenceNumber(5), 0).expect("set"),
            ..gap
        };
        assert_eq!(gap.irrelevant_ranges().count(), 0);
    }
}
