// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # hdds-rtps - RTPS entity/resource manager and submessage codec
//!
//! The protocol core underneath a DDS stack: a [`Participant`] that creates
//! and deletes readers and writers, shares network listeners between
//! endpoints asking for the same locator, and the binary codec for RTPS
//! messages with explicit per-submessage endianness.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use hdds_rtps::{
//!     Participant, ReaderAttributes, Result, StateKind, TopicAttributes, TopicKind,
//!     TypeDescriptor,
//! };
//!
//! fn main() -> Result<()> {
//!     let participant = Participant::builder("sensor_node").build()?;
//!
//!     let topic = TopicAttributes::new("sensors/temperature", "Temperature", TopicKind::NoKey);
//!     let reader = participant.create_reader(
//!         ReaderAttributes::new(topic),
//!         false,
//!         StateKind::Stateful,
//!         Arc::new(TypeDescriptor::new("Temperature", 8, false)),
//!         None,
//!         None,
//!     )?;
//!     println!("reader {} listening on {:?}", reader.guid(), reader.unicast_locators());
//!
//!     participant.delete_user_endpoint(&reader, 'R');
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------------+
//! |  Participant: endpoint registry, listen resources, entity counter   |
//! +---------------------------------------------------------------------+
//! |  Endpoints: Stateless/Stateful Writer, Stateless/Stateful Reader     |
//! +---------------------------------------------------------------------+
//! |  Protocol: header, HEARTBEAT, GAP, ACKNACK, INFO_TS, builders        |
//! +---------------------------------------------------------------------+
//! |  Transport: listen resources, UDP (socket2 + mio), in-memory bus    |
//! +---------------------------------------------------------------------+
//! ```
//!
//! ## Modules Overview
//!
//! - [`participant`] - entity and resource manager (start here)
//! - [`endpoint`] - readers and writers
//! - [`protocol`] - RTPS wire codec
//! - [`transport`] - listen resources and datagram transports
//! - [`engine`] - event scheduler and resource semaphore
//! - [`config`] - constants and participant attributes

pub mod config;
pub mod core;
pub mod endpoint;
pub mod engine;
mod error;
pub mod participant;
pub mod protocol;
pub mod transport;

pub use crate::config::{DiscoveryAttributes, ParticipantAttributes};
pub use crate::core::ser::Endianness;
pub use crate::core::types::{
    EntityId, Guid, GuidPrefix, Locator, LocatorKind, SequenceNumber, SequenceNumberSet,
    TypeDescriptor,
};
pub use crate::endpoint::{
    Endpoint, EndpointKind, EndpointQos, ReaderAttributes, ReaderListener, StateKind,
    TopicAttributes, TopicKind, WriterAttributes, WriterListener,
};
pub use crate::error::{Error, Result};
pub use crate::participant::{
    DiscoveryProtocol, LivelinessProtocol, Participant, ParticipantBuilder, WriterLiveliness,
};
