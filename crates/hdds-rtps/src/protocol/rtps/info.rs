// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! INFO_TS submessage (RTPS 2.3 Section 8.3.7.9)
//!
//! Timestamp applying to the submessages that follow it. With the
//! invalidate flag set there is no body.

use std::time::{SystemTime, UNIX_EPOCH};

use super::SubmessageBody;
use crate::core::ser::{Cursor, CursorMut, Endianness};
use crate::protocol::constants::{INFO_TS_FLAG_INVALIDATE, SUBMSG_INFO_TS};
use crate::Result;

/// RTPS Time_t: seconds + fraction in 1/2^32 s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Time {
    pub seconds: i32,
    pub fraction: u32,
}

impl Time {
    pub fn now() -> Self {
        let since_epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        let fraction = (u64::from(since_epoch.subsec_nanos()) << 32) / 1_000_000_000;
        Self {
            seconds: since_epoch.as_secs() as i32,
            fraction: fraction as u32,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InfoTimestamp {
    /// `None` invalidates the current timestamp.
    pub timestamp: Option<Time>,
}

impl InfoTimestamp {
    pub fn now() -> Self {
        Self {
            timestamp: Some(Time::now()),
        }
    }
}

impl SubmessageBody for InfoTimestamp {
    const KIND: u8 = SUBMSG_INFO_TS;

    fn flags(&self) -> u8 {
        match self.timestamp {
            Some(_) => 0,
            None => INFO_TS_FLAG_INVALIDATE,
        }
    }

    fn encode_body(&self, w: &mut CursorMut, endianness: Endianness) -> Result<()> {
        if let Some(time) = self.timestamp {
            w.write_i32(time.seconds, endianness)?;
            w.write_u32(time.fraction, endianness)?;
        }
        Ok(())
    }

    fn decode_body(r: &mut Cursor<'_>, flags: u8, endianness: Endianness) -> Result<Self> {
        if flags & INFO_TS_FLAG_INVALIDATE != 0 {
            return Ok(Self { timestamp: None });
        }
        Ok(Self {
            timestamp: Some(Time {
                seconds: r.read_i32(endianness)?,
                fraction: r.read_u32(endianness)?,
            }),
        })
    }
}
