// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Discovery and liveliness seams.
//!
//! The participant owns at most one of each and calls them after releasing
//! its state lock, so implementations may call back into the participant.

use std::sync::{Arc, Weak};

use super::Participant;
use crate::endpoint::Endpoint;

/// Participant/endpoint discovery (SPDP + SEDP in a full stack).
pub trait DiscoveryProtocol: Send + Sync {
    /// Called once, right after the participant is built.
    fn init(&self, participant: Weak<Participant>) {
        let _ = participant;
    }

    /// A local writer appeared (`active`) or went away.
    fn local_writer_matching(&self, writer: &Arc<Endpoint>, active: bool);

    /// A local reader appeared (`active`) or went away.
    fn local_reader_matching(&self, reader: &Arc<Endpoint>, active: bool);

    fn announce_participant_state(&self, new_change: bool);

    fn stop_participant_announcement(&self);

    fn reset_participant_announcement(&self);
}

/// Writer liveliness assertion.
pub trait LivelinessProtocol: Send + Sync {
    fn add_local_writer(&self, writer: &Arc<Endpoint>);

    fn remove_local_writer(&self, writer: &Arc<Endpoint>);
}
