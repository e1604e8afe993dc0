// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! RTPS wire codec
//!
//! - Constants: magic, vendor id, submessage kinds, flag bits
//! - Message framing: header + submessages, bounded builder, parser
//! - Submessage bodies: HEARTBEAT, GAP, ACKNACK, INFO_TS
//! - One-call message builders

pub mod builder;
pub mod constants;
pub mod message;
pub mod rtps;

pub use builder::{
    create_message_acknack, create_message_gap, create_message_heartbeat,
    create_submessage_acknack, create_submessage_gap, create_submessage_heartbeat,
};
pub use message::{MessageBuffer, RtpsHeader, RtpsMessage};
pub use rtps::{AckNack, Gap, Heartbeat, InfoTimestamp, Submessage, SubmessageBody, Time};
