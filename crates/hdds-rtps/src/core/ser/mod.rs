// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Endianness-aware serialization helpers for RTPS message encoding/decoding.
//!
//! Every multi-byte read or write takes the target [`Endianness`] explicitly.
//! Nothing here keeps a "current endianness" on the buffer: the submessage
//! codec decides it per submessage and threads it through each call.

pub mod cursor;

pub use cursor::{Cursor, CursorMut};

use std::fmt;

/// Byte order used for the multi-byte fields of one submessage.
///
/// Recorded in bit 0 of the submessage flags (0 = little, 1 = big).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endianness {
    Little,
    Big,
}

impl Endianness {
    /// Flag bit 0 value for this byte order.
    #[inline]
    pub const fn flag_bit(self) -> u8 {
        match self {
            Endianness::Little => 0x00,
            Endianness::Big => 0x01,
        }
    }

    /// Byte order recorded in a submessage flags byte.
    #[inline]
    pub const fn from_flags(flags: u8) -> Self {
        if flags & 0x01 == 0 {
            Endianness::Little
        } else {
            Endianness::Big
        }
    }

    /// Byte order of the host.
    #[inline]
    pub const fn native() -> Self {
        if cfg!(target_endian = "big") {
            Endianness::Big
        } else {
            Endianness::Little
        }
    }
}

impl Default for Endianness {
    fn default() -> Self {
        Self::native()
    }
}

/// Serialization error used within core::ser.
#[derive(Debug, Clone)]
pub enum SerError {
    WriteFailed { offset: usize, reason: String },
    ReadFailed { offset: usize, reason: String },
    InvalidData { reason: String },
}

impl fmt::Display for SerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SerError::WriteFailed { offset, reason } => {
                write!(f, "write failed at offset {}: {}", offset, reason)
            }
            SerError::ReadFailed { offset, reason } => {
                write!(f, "read failed at offset {}: {}", offset, reason)
            }
            SerError::InvalidData { reason } => write!(f, "invalid data: {}", reason),
        }
    }
}

impl std::error::Error for SerError {}

impl From<SerError> for crate::Error {
    fn from(err: SerError) -> Self {
        match err {
            SerError::WriteFailed { .. } => crate::Error::SubmessageEncodeFailure(err.to_string()),
            SerError::ReadFailed { .. } | SerError::InvalidData { .. } => {
                crate::Error::DecodeFailed(err.to_string())
            }
        }
    }
}

pub type SerResult<T> = core::result::Result<T, SerError>;
