// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Reader endpoints.
//!
//! Stateless readers accept HEARTBEAT and GAP from any writer. Stateful
//! readers only accept matched writers and track each one in a
//! [`WriterProxy`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use super::listener::ReaderListener;
use super::qos::StateKind;
use super::{Endpoint, EndpointVariant, ENDPOINT_ENDIANNESS};
use crate::core::types::{EntityId, Guid, GuidPrefix, Locator, SequenceNumber, SequenceNumberSet};
use crate::protocol::{create_message_acknack, Gap, Heartbeat, Submessage};
use crate::{Error, Result};

pub struct StatelessReader {
    listener: Option<Arc<dyn ReaderListener>>,
}

impl StatelessReader {
    pub(crate) fn new(listener: Option<Arc<dyn ReaderListener>>) -> Self {
        Self { listener }
    }
}

pub struct StatefulReader {
    listener: Option<Arc<dyn ReaderListener>>,
    matched_writers: RwLock<HashMap<Guid, WriterProxy>>,
    acknack_count: AtomicI32,
}

impl StatefulReader {
    pub(crate) fn new(listener: Option<Arc<dyn ReaderListener>>) -> Self {
        Self {
            listener,
            matched_writers: RwLock::new(HashMap::new()),
            acknack_count: AtomicI32::new(0),
        }
    }
}

/// What a stateful reader knows about one matched remote writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriterProxy {
    pub remote_writer: Guid,
    pub unicast_locators: Vec<Locator>,
    pub multicast_locators: Vec<Locator>,
    pub first_available: SequenceNumber,
    pub last_available: SequenceNumber,
    pub last_heartbeat_count: Option<i32>,
    /// Sorted, disjoint inclusive ranges of irrelevant sequence numbers.
    irrelevant: Vec<(i64, i64)>,
}

impl WriterProxy {
    pub fn new(remote_writer: Guid, unicast_locators: Vec<Locator>, multicast_locators: Vec<Locator>) -> Self {
        Self {
            remote_writer,
            unicast_locators,
            multicast_locators,
            first_available: SequenceNumber::FIRST,
            last_available: SequenceNumber::ZERO,
            last_heartbeat_count: None,
            irrelevant: Vec::new(),
        }
    }

    pub fn is_irrelevant(&self, sn: SequenceNumber) -> bool {
        self.irrelevant.iter().any(|&(first, last)| first <= sn.0 && sn.0 <= last)
    }

    /// Irrelevant sequence numbers as `(first, last)` inclusive ranges.
    pub fn irrelevant_ranges(&self) -> Vec<(SequenceNumber, SequenceNumber)> {
        self.irrelevant
            .iter()
            .map(|&(first, last)| (SequenceNumber(first), SequenceNumber(last)))
            .collect()
    }

    fn mark_irrelevant(&mut self, first: i64, last: i64) {
        if first > last {
            return;
        }
        let (mut first, mut last) = (first, last);
        // Overlapping or adjacent ranges merge.
        self.irrelevant.retain(|&(f, l)| {
            if l.saturating_add(1) < first || f > last.saturating_add(1) {
                true
            } else {
                first = first.min(f);
                last = last.max(l);
                false
            }
        });
        let pos = self.irrelevant.partition_point(|&(f, _)| f < first);
        self.irrelevant.insert(pos, (first, last));
    }

    fn apply_gap(&mut self, gap: &Gap) {
        for (first, last) in gap.irrelevant_ranges() {
            self.mark_irrelevant(first.0, last.0);
        }
    }

    /// Returns `false` for a stale heartbeat.
    fn apply_heartbeat(&mut self, hb: &Heartbeat) -> bool {
        if matches!(self.last_heartbeat_count, Some(last) if hb.count <= last) {
            return false;
        }
        self.last_heartbeat_count = Some(hb.count);
        self.first_available = hb.first_sn;
        self.last_available = hb.last_sn;
        true
    }

    fn destinations(&self) -> &[Locator] {
        if self.unicast_locators.is_empty() {
            &self.multicast_locators
        } else {
            &self.unicast_locators
        }
    }
}

#[derive(Clone, Copy)]
enum Accepted<'a> {
    Heartbeat(&'a Heartbeat),
    Gap(&'a Gap),
}

impl Endpoint {
    fn stateful_reader(&self) -> Result<&StatefulReader> {
        self.ensure_open()?;
        match &self.variant {
            EndpointVariant::StatefulReader(r) => Ok(r),
            EndpointVariant::StatelessReader(_) => Err(Error::WrongStateKind {
                guid: self.guid(),
                expected: StateKind::Stateful,
            }),
            _ => Err(Error::WrongEndpointKind {
                guid: self.guid(),
                expected: 'R',
            }),
        }
    }

    /// Match a remote writer. Re-adding a known writer replaces its proxy.
    pub fn matched_writer_add(&self, proxy: WriterProxy) -> Result<()> {
        let reader = self.stateful_reader()?;
        log::debug!("[endpoint] {} matched writer {}", self.guid(), proxy.remote_writer);
        reader.matched_writers.write().insert(proxy.remote_writer, proxy);
        Ok(())
    }

    pub fn matched_writer_remove(&self, writer: &Guid) -> bool {
        match &self.variant {
            EndpointVariant::StatefulReader(r) => r.matched_writers.write().remove(writer).is_some(),
            _ => false,
        }
    }

    pub fn writer_proxy(&self, writer: &Guid) -> Option<WriterProxy> {
        match &self.variant {
            EndpointVariant::StatefulReader(r) => r.matched_writers.read().get(writer).cloned(),
            _ => None,
        }
    }

    pub fn matched_writers(&self) -> Vec<Guid> {
        match &self.variant {
            EndpointVariant::StatefulReader(r) => r.matched_writers.read().keys().copied().collect(),
            _ => Vec::new(),
        }
    }

    /// ACKNACK acknowledging everything the matched `writer` announced.
    pub fn acknack_message(&self, writer: &Guid, is_final: bool) -> Result<Vec<u8>> {
        let reader = self.stateful_reader()?;
        let proxy = reader
            .matched_writers
            .read()
            .get(writer)
            .cloned()
            .ok_or(Error::EndpointNotFound(*writer))?;
        let base = SequenceNumber(proxy.last_available.0.max(0).saturating_add(1));
        let state = SequenceNumberSet::new(base, 0)?;
        let count = reader.acknack_count.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
        create_message_acknack(
            self.guid().prefix,
            self.entity_id(),
            writer.entity_id,
            &state,
            count,
            is_final,
            ENDPOINT_ENDIANNESS,
        )
    }

    /// Send [`Endpoint::acknack_message`] to the writer's locators.
    pub fn send_acknack(&self, writer: &Guid) -> Result<usize> {
        let message = self.acknack_message(writer, true)?;
        let destinations = self
            .writer_proxy(writer)
            .map(|p| p.destinations().to_vec())
            .unwrap_or_default();
        Ok(self.send_channel().send(&message, &destinations))
    }

    fn is_addressed(&self, reader_id: EntityId) -> bool {
        reader_id == self.entity_id() || reader_id.is_unknown()
    }

    pub(super) fn on_reader_submessage(&self, source: GuidPrefix, submessage: &Submessage) -> bool {
        let accepted = match submessage {
            Submessage::Heartbeat(hb) if self.is_addressed(hb.reader_id) => Accepted::Heartbeat(hb),
            Submessage::Gap(gap) if self.is_addressed(gap.reader_id) => Accepted::Gap(gap),
            _ => return false,
        };
        let writer = match accepted {
            Accepted::Heartbeat(hb) => Guid::new(source, hb.writer_id),
            Accepted::Gap(gap) => Guid::new(source, gap.writer_id),
        };

        let listener = match &self.variant {
            EndpointVariant::StatelessReader(r) => r.listener.clone(),
            EndpointVariant::StatefulReader(r) => {
                let mut proxies = r.matched_writers.write();
                let Some(proxy) = proxies.get_mut(&writer) else {
                    log::trace!("[endpoint] {} ignoring unmatched writer {}", self.guid(), writer);
                    return false;
                };
                match accepted {
                    Accepted::Heartbeat(hb) => {
                        if !proxy.apply_heartbeat(hb) {
                            return false;
                        }
                    }
                    Accepted::Gap(gap) => proxy.apply_gap(gap),
                }
                r.listener.clone()
            }
            _ => return false,
        };

        if let Some(listener) = listener {
            match accepted {
                Accepted::Heartbeat(hb) => listener.on_heartbeat(&self.guid(), &writer, hb),
                Accepted::Gap(gap) => listener.on_gap(&self.guid(), &writer, gap),
            }
        }
        true
    }
}
