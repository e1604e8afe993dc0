// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # RTPS Submessage Codec (OMG RTPS 2.3 Specification)
//!
//! Every submessage is framed as:
//!
//! ```text
//! 0                   1                   2                   3
//! 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |     kind      |     flags     |      octetsToNextHeader       |
//! +---------------+---------------+-------------------------------+
//! ~                            body                               ~
//! +---------------------------------------------------------------+
//! ```
//!
//! Flag bit 0 selects the byte order of `octetsToNextHeader` and of every
//! multi-byte body field (0 = little, 1 = big). The byte order is a
//! parameter of every function here; nothing is inferred from the host.
//!
//! # Submessages
//!
//! - ACKNACK (0x06): Reader acknowledgment state
//! - HEARTBEAT (0x07): Writer's available sequence range
//! - GAP (0x08): Irrelevant sequence numbers
//! - INFO_TS (0x09): Timestamp for subsequent submessages

mod acknack;
mod gap;
mod heartbeat;
mod info;

pub use acknack::AckNack;
pub use gap::Gap;
pub use heartbeat::Heartbeat;
pub use info::{InfoTimestamp, Time};

use crate::core::ser::{Cursor, CursorMut, Endianness, SerError, SerResult};
use crate::core::types::{EntityId, SequenceNumber, SequenceNumberSet, SN_SET_MAX_BITS};
use crate::protocol::constants::{
    SUBMESSAGE_HEADER_SIZE, SUBMSG_ACKNACK, SUBMSG_GAP, SUBMSG_HEARTBEAT, SUBMSG_INFO_TS,
};
use crate::{Error, Result};

/// Body codec of one submessage kind.
///
/// `flags()` returns the kind-specific bits only; the framing adds the
/// endianness bit.
pub trait SubmessageBody: Sized {
    const KIND: u8;

    fn flags(&self) -> u8;

    fn encode_body(&self, w: &mut CursorMut, endianness: Endianness) -> Result<()>;

    fn decode_body(r: &mut Cursor<'_>, flags: u8, endianness: Endianness) -> Result<Self>;
}

/// Decoded submessage of a kind this engine understands.
#[derive(Debug, Clone, PartialEq)]
pub enum Submessage {
    AckNack(AckNack),
    Heartbeat(Heartbeat),
    Gap(Gap),
    InfoTimestamp(InfoTimestamp),
}

impl Submessage {
    pub fn kind(&self) -> u8 {
        match self {
            Submessage::AckNack(_) => SUBMSG_ACKNACK,
            Submessage::Heartbeat(_) => SUBMSG_HEARTBEAT,
            Submessage::Gap(_) => SUBMSG_GAP,
            Submessage::InfoTimestamp(_) => SUBMSG_INFO_TS,
        }
    }

    /// Reader the submessage is addressed to, if the kind carries one.
    pub fn reader_id(&self) -> Option<EntityId> {
        match self {
            Submessage::AckNack(m) => Some(m.reader_id),
            Submessage::Heartbeat(m) => Some(m.reader_id),
            Submessage::Gap(m) => Some(m.reader_id),
            Submessage::InfoTimestamp(_) => None,
        }
    }

    /// Writer the submessage concerns, if the kind carries one.
    pub fn writer_id(&self) -> Option<EntityId> {
        match self {
            Submessage::AckNack(m) => Some(m.writer_id),
            Submessage::Heartbeat(m) => Some(m.writer_id),
            Submessage::Gap(m) => Some(m.writer_id),
            Submessage::InfoTimestamp(_) => None,
        }
    }

    pub fn encode(&self, w: &mut CursorMut, endianness: Endianness) -> Result<()> {
        match self {
            Submessage::AckNack(m) => write_submessage(w, m, endianness),
            Submessage::Heartbeat(m) => write_submessage(w, m, endianness),
            Submessage::Gap(m) => write_submessage(w, m, endianness),
            Submessage::InfoTimestamp(m) => write_submessage(w, m, endianness),
        }
    }
}

/// Append header + body of one submessage.
///
/// The body is encoded into a scratch cursor first so the length field is
/// known; nothing reaches `w` unless the whole submessage fits.
pub fn write_submessage<B: SubmessageBody>(
    w: &mut CursorMut,
    body: &B,
    endianness: Endianness,
) -> Result<()> {
    let mut scratch = CursorMut::with_max_size(w.remaining().saturating_sub(SUBMESSAGE_HEADER_SIZE));
    body.encode_body(&mut scratch, endianness)?;

    let length = u16::try_from(scratch.pos()).map_err(|_| {
        Error::SubmessageEncodeFailure(format!(
            "submessage 0x{:02x} body of {} bytes does not fit the length field",
            B::KIND,
            scratch.pos()
        ))
    })?;

    w.write_u8(B::KIND)?;
    w.write_u8(body.flags() | endianness.flag_bit())?;
    w.write_u16(length, endianness)?;
    w.write_bytes(scratch.as_slice())?;
    Ok(())
}

/// Read one submessage starting at the cursor.
///
/// Returns `Ok(None)` for unknown kinds, which are skipped by their declared
/// length. Known kinds must consume exactly the declared body length.
pub fn read_submessage(r: &mut Cursor<'_>) -> Result<Option<Submessage>> {
    let kind = r.read_u8()?;
    let flags = r.read_u8()?;
    let endianness = Endianness::from_flags(flags);
    let declared = usize::from(r.read_u16(endianness)?);

    if declared > r.remaining() {
        return Err(Error::DecodeFailed(format!(
            "submessage 0x{:02x} declares {} bytes, only {} remain",
            kind,
            declared,
            r.remaining()
        )));
    }
    let body = r.read_bytes(declared)?;
    let mut br = Cursor::new(body);

    let submessage = match kind {
        SUBMSG_ACKNACK => Submessage::AckNack(AckNack::decode_body(&mut br, flags, endianness)?),
        SUBMSG_HEARTBEAT => {
            Submessage::Heartbeat(Heartbeat::decode_body(&mut br, flags, endianness)?)
        }
        SUBMSG_GAP => Submessage::Gap(Gap::decode_body(&mut br, flags, endianness)?),
        SUBMSG_INFO_TS => {
            Submessage::InfoTimestamp(InfoTimestamp::decode_body(&mut br, flags, endianness)?)
        }
        other => {
            log::trace!("[codec] skipping submessage 0x{:02x} ({} bytes)", other, declared);
            return Ok(None);
        }
    };

    if br.offset() != declared {
        return Err(Error::SubmessageDecodeLengthMismatch {
            kind,
            declared,
            consumed: br.offset(),
        });
    }
    Ok(Some(submessage))
}

// ============================================================================
// Shared field codecs
// ============================================================================

pub(crate) fn write_entity_id(w: &mut CursorMut, id: &EntityId) -> SerResult<()> {
    w.write_bytes(id.as_bytes())
}

pub(crate) fn read_entity_id(r: &mut Cursor<'_>) -> SerResult<EntityId> {
    Ok(EntityId(r.read_array()?))
}

/// SequenceNumber_t: high (i32) then low (u32).
pub(crate) fn write_sn(
    w: &mut CursorMut,
    sn: SequenceNumber,
    endianness: Endianness,
) -> SerResult<()> {
    w.write_i32(sn.high(), endianness)?;
    w.write_u32(sn.low(), endianness)
}

pub(crate) fn read_sn(r: &mut Cursor<'_>, endianness: Endianness) -> SerResult<SequenceNumber> {
    let high = r.read_i32(endianness)?;
    let low = r.read_u32(endianness)?;
    Ok(SequenceNumber::from_parts(high, low))
}

/// SequenceNumberSet: base (8) + numBits (4) + ceil(numBits/32) words.
pub(crate) fn write_sn_set(
    w: &mut CursorMut,
    set: &SequenceNumberSet,
    endianness: Endianness,
) -> SerResult<()> {
    write_sn(w, set.base(), endianness)?;
    w.write_u32(set.num_bits(), endianness)?;
    for word in set.words() {
        w.write_u32(*word, endianness)?;
    }
    Ok(())
}

pub(crate) fn read_sn_set(r: &mut Cursor<'_>, endianness: Endianness) -> Result<SequenceNumberSet> {
    let base = read_sn(r, endianness)?;
    let num_bits = r.read_u32(endianness)?;
    if num_bits > SN_SET_MAX_BITS {
        return Err(Error::InvalidSequenceNumberSet(format!(
            "numBits {} exceeds {}",
            num_bits, SN_SET_MAX_BITS
        )));
    }
    let word_count = SequenceNumberSet::words_for(num_bits);
    if r.remaining() < word_count * 4 {
        return Err(SerError::ReadFailed {
            offset: r.offset(),
            reason: format!("bitmap needs {} words", word_count),
        }
        .into());
    }
    let mut words = Vec::with_capacity(word_count);
    for _ in 0..word_count {
        words.push(r.read_u32(endianness)?);
    }
    SequenceNumberSet::from_wire(base, num_bits, &words)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_kind_is_skipped_by_length() {
        // DATA (0x15), little-endian, 4-byte body, followed by one trailing byte
        let bytes = [0x15, 0x00, 0x04, 0x00, 0xAA, 0xBB, 0xCC, 0xDD, 0xFF];
        let mut r = Cursor::new(&bytes);
        assert!(read_submessage(&mut r).expect("skip unknown").is_none());
        assert_eq!(r.offset(), 8);
    }

    #[test]
    fn test_declared_length_past_end_is_error() {
        let bytes = [SUBMSG_HEARTBEAT, 0x00, 0x1C, 0x00, 0x00, 0x00];
        let mut r = Cursor::new(&bytes);
        assert!(matches!(read_submessage(&mut r), Err(Error::DecodeFailed(_))));
    }

    #[test]
    fn test_sn_set_with_too_many_bits_is_rejected() {
        let mut w = CursorMut::with_max_size(64);
        write_sn(&mut w, SequenceNumber(1), Endianness::Little).expect("base");
        w.write_u32(257, Endianness::Little).expect("num_bits");
        let bytes = w.into_vec();
        let mut r = Cursor::new(&bytes);
        assert!(matches!(
            read_sn_set(&mut r, Endianness::Little),
            Err(Error::InvalidSequenceNumberSet(_))
        ));
    }

    #[test]
    fn test_write_submessage_leaves_cursor_untouched_on_overflow() {
        let mut w = CursorMut::with_max_size(16);
        let hb = Heartbeat {
            reader_id: EntityId::UNKNOWN,
            writer_id: EntityId::SPDP_WRITER,
            first_sn: SequenceNumber(1),
            last_sn: SequenceNumber(2),
            count: 1,
            is_final: false,
            liveliness: false,
        };
        let err = write_submessage(&mut w, &hb, Endianness::Little).expect_err("too small");
        assert!(matches!(err, Error::SubmessageEncodeFailure(_)));
        assert_eq!(w.pos(), 0);
    }
}
