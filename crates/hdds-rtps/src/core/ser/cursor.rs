// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Read/write cursors for RTPS buffer manipulation.
//!
//! `CursorMut` appends into a growable buffer that refuses to grow past an
//! explicit capacity bound; `Cursor` reads from a borrowed slice. Both check
//! bounds on every access and never panic on short input.

use super::{Endianness, SerError, SerResult};

/// Generate endian-selectable write methods for primitive types.
///
/// Each generated method checks the capacity bound, converts the value with
/// `to_le_bytes()` or `to_be_bytes()`, then appends it.
macro_rules! impl_write {
    ($name:ident, $type:ty) => {
        pub fn $name(&mut self, value: $type, endianness: Endianness) -> SerResult<()> {
            match endianness {
                Endianness::Little => self.write_bytes(&value.to_le_bytes()),
                Endianness::Big => self.write_bytes(&value.to_be_bytes()),
            }
        }
    };
}

/// Generate endian-selectable read methods for primitive types.
macro_rules! impl_read {
    ($name:ident, $type:ty, $size:expr) => {
        pub fn $name(&mut self, endianness: Endianness) -> SerResult<$type> {
            let bytes: [u8; $size] = self.read_array()?;
            Ok(match endianness {
                Endianness::Little => <$type>::from_le_bytes(bytes),
                Endianness::Big => <$type>::from_be_bytes(bytes),
            })
        }
    };
}

/// Bounded append-only writer.
///
/// `pos` is where the next byte goes; `length` is the high-water mark
/// recorded by [`CursorMut::finish`].
#[derive(Debug, Clone)]
pub struct CursorMut {
    buffer: Vec<u8>,
    max_size: usize,
    length: usize,
}

impl CursorMut {
    /// Create a writer that refuses to grow past `max_size` bytes.
    pub fn with_max_size(max_size: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(max_size.min(1500)),
            max_size,
            length: 0,
        }
    }

    pub fn write_u8(&mut self, value: u8) -> SerResult<()> {
        self.write_bytes(&[value])
    }

    impl_write!(write_u16, u16);
    impl_write!(write_u32, u32);
    impl_write!(write_i32, i32);

    pub fn write_bytes(&mut self, data: &[u8]) -> SerResult<()> {
        if self.buffer.len() + data.len() > self.max_size {
            return Err(SerError::WriteFailed {
                offset: self.buffer.len(),
                reason: format!(
                    "buffer capacity exceeded ({} + {} > {})",
                    self.buffer.len(),
                    data.len(),
                    self.max_size
                ),
            });
        }
        self.buffer.extend_from_slice(data);
        Ok(())
    }

    /// Current write position.
    pub fn pos(&self) -> usize {
        self.buffer.len()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn remaining(&self) -> usize {
        self.max_size.saturating_sub(self.buffer.len())
    }

    /// Record the high-water mark reached so far.
    pub fn finish(&mut self) -> usize {
        self.length = self.buffer.len();
        self.length
    }

    /// Logical length recorded by the last [`CursorMut::finish`].
    pub fn length(&self) -> usize {
        self.length
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buffer[..self.buffer.len()]
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.buffer
    }
}

/// Immutable cursor for reading (bounds-checked, zero-copy)
pub struct Cursor<'a> {
    buffer: &'a [u8],
    offset: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, offset: 0 }
    }

    pub fn read_u8(&mut self) -> SerResult<u8> {
        let [b] = self.read_array::<1>()?;
        Ok(b)
    }

    impl_read!(read_u16, u16, 2);
    impl_read!(read_u32, u32, 4);
    impl_read!(read_i32, i32, 4);

    pub fn read_array<const N: usize>(&mut self) -> SerResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    pub fn read_bytes(&mut self, len: usize) -> SerResult<&'a [u8]> {
        if self.offset + len > self.buffer.len() {
            return Err(SerError::ReadFailed {
                offset: self.offset,
                reason: "unexpected end of buffer".into(),
            });
        }
        let slice = &self.buffer[self.offset..self.offset + len];
        self.offset += len;
        Ok(slice)
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.offset)
    }

    pub fn is_eof(&self) -> bool {
        self.offset >= self.buffer.len()
    }
}
