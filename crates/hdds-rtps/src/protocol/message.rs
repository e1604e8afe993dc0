// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! RTPS message framing: header plus concatenated submessages.
//!
//! RTPS Header layout (20 bytes total):
//! - Magic "RTPS": 4 bytes (offset 0-3)
//! - Protocol version: 2 bytes (offset 4-5)
//! - Vendor ID: 2 bytes (offset 6-7)
//! - GUID Prefix: 12 bytes (offset 8-19)
//! - First submessage starts at offset 20

use crate::config::RTPS_MESSAGE_MAX_SIZE;
use crate::core::ser::{Cursor, CursorMut, Endianness};
use crate::core::types::GuidPrefix;
use crate::protocol::constants::{
    HDDS_VENDOR_ID, RTPS_HEADER_SIZE, RTPS_MAGIC, RTPS_VERSION_MAJOR, RTPS_VERSION_MINOR,
};
use crate::protocol::rtps::{read_submessage, write_submessage, Submessage, SubmessageBody};
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RtpsHeader {
    pub version: (u8, u8),
    pub vendor_id: [u8; 2],
    pub guid_prefix: GuidPrefix,
}

impl RtpsHeader {
    /// Header announcing this implementation.
    pub fn local(guid_prefix: GuidPrefix) -> Self {
        Self {
            version: (RTPS_VERSION_MAJOR, RTPS_VERSION_MINOR),
            vendor_id: HDDS_VENDOR_ID,
            guid_prefix,
        }
    }

    fn encode(&self, w: &mut CursorMut) -> Result<()> {
        w.write_bytes(RTPS_MAGIC)?;
        w.write_u8(self.version.0)?;
        w.write_u8(self.version.1)?;
        w.write_bytes(&self.vendor_id)?;
        w.write_bytes(self.guid_prefix.as_bytes())?;
        Ok(())
    }

    fn decode(r: &mut Cursor<'_>) -> Result<Self> {
        if r.remaining() < RTPS_HEADER_SIZE {
            return Err(Error::InvalidHeader(format!(
                "{} bytes, header needs {}",
                r.remaining(),
                RTPS_HEADER_SIZE
            )));
        }
        let magic: [u8; 4] = r.read_array()?;
        if &magic != RTPS_MAGIC {
            return Err(Error::InvalidHeader(format!("bad magic {:02x?}", magic)));
        }
        let major = r.read_u8()?;
        let minor = r.read_u8()?;
        if major != RTPS_VERSION_MAJOR {
            return Err(Error::InvalidHeader(format!(
                "unsupported protocol version {}.{}",
                major, minor
            )));
        }
        Ok(Self {
            version: (major, minor),
            vendor_id: r.read_array()?,
            guid_prefix: GuidPrefix(r.read_array()?),
        })
    }
}

/// Bounded builder for one outgoing message.
///
/// The header goes in at construction; every push either appends a whole
/// submessage or fails leaving the buffer as it was. [`MessageBuffer::finish`]
/// records the high-water mark and hands out the bytes.
pub struct MessageBuffer {
    cursor: CursorMut,
}

impl MessageBuffer {
    pub fn new(guid_prefix: GuidPrefix) -> Result<Self> {
        Self::with_max_size(guid_prefix, RTPS_MESSAGE_MAX_SIZE)
    }

    pub fn with_max_size(guid_prefix: GuidPrefix, max_size: usize) -> Result<Self> {
        let mut cursor = CursorMut::with_max_size(max_size);
        RtpsHeader::local(guid_prefix).encode(&mut cursor)?;
        Ok(Self { cursor })
    }

    pub fn push<B: SubmessageBody>(&mut self, body: &B, endianness: Endianness) -> Result<()> {
        write_submessage(&mut self.cursor, body, endianness)
    }

    pub fn push_submessage(&mut self, submessage: &Submessage, endianness: Endianness) -> Result<()> {
        submessage.encode(&mut self.cursor, endianness)
    }

    pub fn len(&self) -> usize {
        self.cursor.pos()
    }

    pub fn is_empty(&self) -> bool {
        self.cursor.pos() <= RTPS_HEADER_SIZE
    }

    pub fn finish(mut self) -> Vec<u8> {
        let length = self.cursor.finish();
        log::trace!("[codec] message built: {} bytes", length);
        self.cursor.into_vec()
    }
}

/// Fully decoded inbound message.
#[derive(Debug, Clone, PartialEq)]
pub struct RtpsMessage {
    pub header: RtpsHeader,
    pub submessages: Vec<Submessage>,
}

impl RtpsMessage {
    /// Decode a datagram. Unknown submessage kinds are skipped.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut r = Cursor::new(bytes);
        let header = RtpsHeader::decode(&mut r)?;
        let mut submessages = Vec::new();
        while !r.is_eof() {
            if let Some(submessage) = read_submessage(&mut r)? {
                submessages.push(submessage);
            }
        }
        Ok(Self {
            header,
            submessages,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{EntityId, SequenceNumber};
    use crate::protocol::rtps::Heartbeat;

    fn prefix() -> GuidPrefix {
        GuidPrefix([0x01, 0xAA, 10, 0, 0, 5, 0, 0, 0x12, 0x34, 0, 1])
    }

    #[test]
    fn test_header_bytes() {
        let bytes = MessageBuffer::new(prefix()).expect("buffer").finish();
        assert_eq!(bytes.len(), RTPS_HEADER_SIZE);
        assert_eq!(&bytes[0..4], b"RTPS");
        assert_eq!(bytes[4], RTPS_VERSION_MAJOR);
        assert_eq!(bytes[5], RTPS_VERSION_MINOR);
        assert_eq!(&bytes[6..8], &HDDS_VENDOR_ID);
        assert_eq!(&bytes[8..20], prefix().as_bytes());
    }

    #[test]
    fn test_parse_rejects_bad_header() {
        assert!(matches!(
            RtpsMessage::parse(b"RTP"),
            Err(Error::InvalidHeader(_))
        ));
        let mut bytes = MessageBuffer::new(prefix()).expect("buffer").finish();
        bytes[0] = b'X';
        assert!(matches!(
            RtpsMessage::parse(&bytes),
            Err(Error::InvalidHeader(_))
        ));
    }

    #[test]
    fn test_push_overflow_keeps_previous_submessages() {
        let hb = Heartbeat {
            reader_id: EntityId::UNKNOWN,
            writer_id: EntityId::SPDP_WRITER,
            first_sn: SequenceNumber(1),
            last_sn: SequenceNumber(1),
            count: 1,
            is_final: true,
            liveliness: false,
        };
        let mut msg = MessageBuffer::with_max_size(prefix(), RTPS_HEADER_SIZE + 40).expect("buf");
        msg.push(&hb, Endianness::Little).expect("first fits");
        assert!(msg.push(&hb, Endianness::Little).is_err());
        assert_eq!(msg.len(), RTPS_HEADER_SIZE + 32);

        let parsed = RtpsMessage::parse(&msg.finish()).expect("parse");
        assert_eq!(parsed.submessages.len(), 1);
        assert_eq!(parsed.header.guid_prefix, prefix());
    }
}
