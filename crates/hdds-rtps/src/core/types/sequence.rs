// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Sequence numbers and sequence number sets.

use std::fmt;

use crate::{Error, Result};

/// Maximum number of bits a [`SequenceNumberSet`] can carry.
pub const SN_SET_MAX_BITS: u32 = 256;

const SN_SET_WORDS: usize = (SN_SET_MAX_BITS / 32) as usize;

/// 64-bit signed per-writer sequence number (first valid value is 1).
///
/// Wire form: high `i32` then low `u32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SequenceNumber(pub i64);

impl SequenceNumber {
    pub const ZERO: SequenceNumber = SequenceNumber(0);
    /// First sequence number a writer hands out.
    pub const FIRST: SequenceNumber = SequenceNumber(1);
    /// SEQUENCENUMBER_UNKNOWN: high = -1, low = 0.
    pub const UNKNOWN: SequenceNumber = SequenceNumber(-(1i64 << 32));

    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn from_parts(high: i32, low: u32) -> Self {
        Self((i64::from(high) << 32) | i64::from(low))
    }

    #[inline]
    pub fn high(&self) -> i32 {
        (self.0 >> 32) as i32
    }

    #[inline]
    pub fn low(&self) -> u32 {
        self.0 as u32
    }

    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for SequenceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for SequenceNumber {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// Base sequence number plus a bitmap of at most 256 bits.
///
/// Bit `i` set means `base + i` is a member. Words are stored MSB-first:
/// bit `i` lives at `1 << (31 - i % 32)` of word `i / 32`.
#[derive(Clone, PartialEq, Eq)]
pub struct SequenceNumberSet {
    base: SequenceNumber,
    num_bits: u32,
    bitmap: [u32; SN_SET_WORDS],
}

impl SequenceNumberSet {
    /// Empty set covering `[base, base + num_bits)`.
    pub fn new(base: SequenceNumber, num_bits: u32) -> Result<Self> {
        if base.0 < 1 {
            return Err(Error::InvalidSequenceNumberSet(format!(
                "base {} must be >= 1",
                base
            )));
        }
        if num_bits > SN_SET_MAX_BITS {
            return Err(Error::InvalidSequenceNumberSet(format!(
                "num_bits {} exceeds {}",
                num_bits, SN_SET_MAX_BITS
            )));
        }
        // The last covered sequence number must be representable.
        if base.0.checked_add(i64::from(num_bits.saturating_sub(1))).is_none() {
            return Err(Error::InvalidSequenceNumberSet(format!(
                "base {} with {} bits overflows",
                base, num_bits
            )));
        }
        Ok(Self {
            base,
            num_bits,
            bitmap: [0; SN_SET_WORDS],
        })
    }

    /// Smallest set starting at `base` that holds every member.
    pub fn from_members<I>(base: SequenceNumber, members: I) -> Result<Self>
    where
        I: IntoIterator<Item = SequenceNumber>,
    {
        let members: Vec<SequenceNumber> = members.into_iter().collect();
        let span = members
            .iter()
            .map(|sn| sn.0.saturating_sub(base.0).saturating_add(1))
            .max()
            .unwrap_or(0);
        if span > i64::from(SN_SET_MAX_BITS) {
            return Err(Error::InvalidSequenceNumberSet(format!(
                "members span {} sequence numbers from base {}",
                span, base
            )));
        }
        let mut set = Self::new(base, span.max(0) as u32)?;
        for sn in members {
            set.insert(sn)?;
        }
        Ok(set)
    }

    /// Rebuild from decoded wire fields, validating every invariant.
    pub fn from_wire(base: SequenceNumber, num_bits: u32, words: &[u32]) -> Result<Self> {
        let mut set = Self::new(base, num_bits)?;
        if words.len() != Self::words_for(num_bits) {
            return Err(Error::InvalidSequenceNumberSet(format!(
                "{} bitmap words for {} bits",
                words.len(),
                num_bits
            )));
        }
        set.bitmap[..words.len()].copy_from_slice(words);
        // Bits past num_bits in the last word are not members.
        if num_bits % 32 != 0 {
            let last = words.len() - 1;
            set.bitmap[last] &= u32::MAX << (32 - num_bits % 32);
        }
        Ok(set)
    }

    /// Number of 32-bit words needed for `num_bits`.
    #[inline]
    pub fn words_for(num_bits: u32) -> usize {
        num_bits.div_ceil(32) as usize
    }

    pub fn base(&self) -> SequenceNumber {
        self.base
    }

    pub fn num_bits(&self) -> u32 {
        self.num_bits
    }

    /// The bitmap words that go on the wire.
    pub fn words(&self) -> &[u32] {
        &self.bitmap[..Self::words_for(self.num_bits)]
    }

    /// Bit index of `sn`, if it falls inside the covered range.
    fn bit_index(&self, sn: SequenceNumber) -> Option<usize> {
        let offset = sn.0.checked_sub(self.base.0)?;
        if offset < 0 || offset >= i64::from(self.num_bits) {
            return None;
        }
        Some(offset as usize)
    }

    pub fn insert(&mut self, sn: SequenceNumber) -> Result<()> {
        let Some(i) = self.bit_index(sn) else {
            return Err(Error::InvalidSequenceNumberSet(format!(
                "{} outside [{}, +{})",
                sn, self.base, self.num_bits
            )));
        };
        self.bitmap[i / 32] |= 1 << (31 - i % 32);
        Ok(())
    }

    pub fn contains(&self, sn: SequenceNumber) -> bool {
        match self.bit_index(sn) {
            Some(i) => self.bitmap[i / 32] & (1 << (31 - i % 32)) != 0,
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = SequenceNumber> + '_ {
        (0..self.num_bits as usize)
            .filter(move |i| self.bitmap[i / 32] & (1 << (31 - i % 32)) != 0)
            .map(move |i| SequenceNumber(self.base.0 + i as i64))
    }

    pub fn is_empty(&self) -> bool {
        self.words().iter().all(|w| *w == 0)
    }

    pub fn len(&self) -> usize {
        self.words().iter().map(|w| w.count_ones() as usize).sum()
    }
}

impl fmt::Debug for SequenceNumberSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SequenceNumberSet")
            .field("base", &self.base.0)
            .field("num_bits", &self.num_bits)
            .field("members", &self.iter().map(|sn| sn.0).collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_number_parts() {
        let sn = SequenceNumber::from_parts(1, 5);
        assert_eq!(sn.0, (1i64 << 32) + 5);
        assert_eq!(sn.high(), 1);
        assert_eq!(sn.low(), 5);
        assert_eq!(SequenceNumber::UNKNOWN.high(), -1);
        assert_eq!(SequenceNumber::UNKNOWN.low(), 0);
    }

    #[test]
    fn test_set_msb_first_layout() {
        let mut set = SequenceNumberSet::new(SequenceNumber(10), 40).expect("valid set");
        set.insert(SequenceNumber(10)).expect("bit 0");
        set.insert(SequenceNumber(42)).expect("bit 32");
        assert_eq!(set.words(), &[0x8000_0000, 0x8000_0000]);
        assert!(set.contains(SequenceNumber(42)));
        assert!(!set.contains(SequenceNumber(11)));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_set_rejects_bad_invariants() {
        assert!(SequenceNumberSet::new(SequenceNumber(0), 8).is_err());
        assert!(SequenceNumberSet::new(SequenceNumber(1), 257).is_err());
        assert!(SequenceNumberSet::new(SequenceNumber(i64::MAX - 10), 256).is_err());
        assert!(SequenceNumberSet::from_wire(SequenceNumber(i64::MAX - 10), 256, &[1; 8]).is_err());

        let mut set = SequenceNumberSet::new(SequenceNumber(1), 8).expect("valid set");
        assert!(set.insert(SequenceNumber(9)).is_err());
        assert!(set.insert(SequenceNumber(0)).is_err());
    }

    #[test]
    fn test_from_members_sizes_bitmap() {
        let set = SequenceNumberSet::from_members(
            SequenceNumber(100),
            [100, 103, 164].map(SequenceNumber),
        )
        .expect("valid set");
        assert_eq!(set.num_bits(), 65);
        assert_eq!(set.words().len(), 3);
        assert_eq!(
            set.iter().map(|sn| sn.0).collect::<Vec<_>>(),
            vec![100, 103, 164]
        );

        let too_wide = SequenceNumberSet::from_members(
            SequenceNumber(1),
            [SequenceNumber(1), SequenceNumber(300)],
        );
        assert!(too_wide.is_err());
    }

    #[test]
    fn test_set_at_top_of_range() {
        let base = SequenceNumber(i64::MAX - 255);
        let mut set = SequenceNumberSet::new(base, 256).expect("last bit is i64::MAX");
        set.insert(SequenceNumber(i64::MAX)).expect("top bit");
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![SequenceNumber(i64::MAX)]);
        assert!(!set.contains(SequenceNumber(i64::MIN)));
        assert!(set.insert(SequenceNumber(i64::MIN)).is_err());
    }

    #[test]
    fn test_from_wire_masks_trailing_bits() {
        let set = SequenceNumberSet::from_wire(SequenceNumber(1), 4, &[0xFFFF_FFFF])
            .expect("valid wire set");
        assert_eq!(set.len(), 4);
        assert!(SequenceNumberSet::from_wire(SequenceNumber(1), 33, &[0]).is_err());
    }
}
