// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! One-call builders for complete RTPS messages and single submessages.
//!
//! A builder either returns the whole encoded buffer or an error; partial
//! buffers never escape.

use crate::config::RTPS_MESSAGE_MAX_SIZE;
use crate::core::ser::{CursorMut, Endianness};
use crate::core::types::{EntityId, GuidPrefix, SequenceNumber, SequenceNumberSet};
use crate::protocol::message::MessageBuffer;
use crate::protocol::rtps::{write_submessage, AckNack, Gap, Heartbeat, InfoTimestamp, SubmessageBody};
use crate::Result;

fn submessage_bytes<B: SubmessageBody>(body: &B, endianness: Endianness) -> Result<Vec<u8>> {
    let mut cursor = CursorMut::with_max_size(RTPS_MESSAGE_MAX_SIZE);
    write_submessage(&mut cursor, body, endianness)?;
    cursor.finish();
    Ok(cursor.into_vec())
}

/// HEARTBEAT submessage bytes (header + 28-byte body).
#[allow(clippy::too_many_arguments)]
pub fn create_submessage_heartbeat(
    reader_id: EntityId,
    writer_id: EntityId,
    first_sn: SequenceNumber,
    last_sn: SequenceNumber,
    count: i32,
    is_final: bool,
    liveliness: bool,
    endianness: Endianness,
) -> Result<Vec<u8>> {
    let hb = Heartbeat {
        reader_id,
        writer_id,
        first_sn,
        last_sn,
        count,
        is_final,
        liveliness,
    };
    submessage_bytes(&hb, endianness)
}

/// Complete message: header + HEARTBEAT.
#[allow(clippy::too_many_arguments)]
pub fn create_message_heartbeat(
    guid_prefix: GuidPrefix,
    reader_id: EntityId,
    writer_id: EntityId,
    first_sn: SequenceNumber,
    last_sn: SequenceNumber,
    count: i32,
    is_final: bool,
    liveliness: bool,
    endianness: Endianness,
) -> Result<Vec<u8>> {
    let hb = Heartbeat {
        reader_id,
        writer_id,
        first_sn,
        last_sn,
        count,
        is_final,
        liveliness,
    };
    let mut msg = MessageBuffer::new(guid_prefix)?;
    msg.push(&hb, endianness)?;
    Ok(msg.finish())
}

pub fn create_submessage_gap(
    gap_start: SequenceNumber,
    gap_list: &SequenceNumberSet,
    reader_id: EntityId,
    writer_id: EntityId,
    endianness: Endianness,
) -> Result<Vec<u8>> {
    let gap = Gap {
        reader_id,
        writer_id,
        gap_start,
        gap_list: gap_list.clone(),
    };
    submessage_bytes(&gap, endianness)
}

/// Complete message: header + INFO_TS (now) + GAP.
pub fn create_message_gap(
    guid_prefix: GuidPrefix,
    gap_start: SequenceNumber,
    gap_list: &SequenceNumberSet,
    reader_id: EntityId,
    writer_id: EntityId,
    endianness: Endianness,
) -> Result<Vec<u8>> {
    let gap = Gap {
        reader_id,
        writer_id,
        gap_start,
        gap_list: gap_list.clone(),
    };
    let mut msg = MessageBuffer::new(guid_prefix)?;
    msg.push(&InfoTimestamp::now(), endianness)?;
    msg.push(&gap, endianness)?;
    Ok(msg.finish())
}

pub fn create_submessage_acknack(
    reader_id: EntityId,
    writer_id: EntityId,
    reader_sn_state: &SequenceNumberSet,
    count: i32,
    is_final: bool,
    endianness: Endianness,
) -> Result<Vec<u8>> {
    let ack = AckNack {
        reader_id,
        writer_id,
        reader_sn_state: reader_sn_state.clone(),
        count,
        is_final,
    };
    submessage_bytes(&ack, endianness)
}

/// Complete message: header + ACKNACK.
pub fn create_message_acknack(
    guid_prefix: GuidPrefix,
    reader_id: EntityId,
    writer_id: EntityId,
    reader_sn_state: &SequenceNumberSet,
    count: i32,
    is_final: bool,
    endianness: Endianness,
) -> Result<Vec<u8>> {
    let ack = AckNack {
        reader_id,
        writer_id,
        reader_sn_state: reader_sn_state.clone(),
        count,
        is_final,
    };
    let mut msg = MessageBuffer::new(guid_prefix)?;
    msg.push(&ack, endianness)?;
    Ok(msg.finish())
}
