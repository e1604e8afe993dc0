// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Writer endpoints.
//!
//! Stateless writers address a plain list of reader locators. Stateful
//! writers keep one [`ReaderProxy`] per matched remote reader, updated by
//! inbound ACKNACKs.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};

use super::listener::WriterListener;
use super::qos::StateKind;
use super::{Endpoint, EndpointVariant, ENDPOINT_ENDIANNESS};
use crate::core::types::{EntityId, Guid, GuidPrefix, Locator, SequenceNumber, SequenceNumberSet};
use crate::engine::EventId;
use crate::protocol::{create_message_gap, create_message_heartbeat, AckNack, Submessage};
use crate::{Error, Result};

/// State shared by both writer flavours.
pub(crate) struct WriterCore {
    last_sn: Mutex<SequenceNumber>,
    heartbeat_count: AtomicI32,
    periodic: Mutex<Option<EventId>>,
    listener: Option<Arc<dyn WriterListener>>,
}

impl WriterCore {
    fn new(listener: Option<Arc<dyn WriterListener>>) -> Self {
        Self {
            last_sn: Mutex::new(SequenceNumber::ZERO),
            heartbeat_count: AtomicI32::new(0),
            periodic: Mutex::new(None),
            listener,
        }
    }

    fn next_heartbeat_count(&self) -> i32 {
        self.heartbeat_count.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
    }
}

pub struct StatelessWriter {
    core: WriterCore,
    reader_locators: RwLock<Vec<Locator>>,
}

impl StatelessWriter {
    pub(crate) fn new(listener: Option<Arc<dyn WriterListener>>) -> Self {
        Self {
            core: WriterCore::new(listener),
            reader_locators: RwLock::new(Vec::new()),
        }
    }
}

pub struct StatefulWriter {
    core: WriterCore,
    matched_readers: RwLock<HashMap<Guid, ReaderProxy>>,
}

impl StatefulWriter {
    pub(crate) fn new(listener: Option<Arc<dyn WriterListener>>) -> Self {
        Self {
            core: WriterCore::new(listener),
            matched_readers: RwLock::new(HashMap::new()),
        }
    }
}

/// What a stateful writer knows about one matched remote reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderProxy {
    pub remote_reader: Guid,
    pub unicast_locators: Vec<Locator>,
    pub multicast_locators: Vec<Locator>,
    /// Highest sequence number acknowledged (everything up to it included).
    pub acked_sn: SequenceNumber,
    /// Sequence numbers the reader asked for again in its last ACKNACK.
    pub requested_changes: Vec<SequenceNumber>,
    pub last_acknack_count: Option<i32>,
}

impl ReaderProxy {
    pub fn new(remote_reader: Guid, unicast_locators: Vec<Locator>, multicast_locators: Vec<Locator>) -> Self {
        Self {
            remote_reader,
            unicast_locators,
            multicast_locators,
            acked_sn: SequenceNumber::ZERO,
            requested_changes: Vec::new(),
            last_acknack_count: None,
        }
    }

    /// Unicast locators when known, multicast otherwise.
    fn destinations(&self) -> &[Locator] {
        if self.unicast_locators.is_empty() {
            &self.multicast_locators
        } else {
            &self.unicast_locators
        }
    }
}

impl Endpoint {
    fn writer_core(&self) -> Result<&WriterCore> {
        self.ensure_open()?;
        match &self.variant {
            EndpointVariant::StatelessWriter(w) => Ok(&w.core),
            EndpointVariant::StatefulWriter(w) => Ok(&w.core),
            _ => Err(Error::WrongEndpointKind {
                guid: self.guid(),
                expected: 'W',
            }),
        }
    }

    fn stateful_writer(&self) -> Result<&StatefulWriter> {
        self.ensure_open()?;
        match &self.variant {
            EndpointVariant::StatefulWriter(w) => Ok(w),
            EndpointVariant::StatelessWriter(_) => Err(Error::WrongStateKind {
                guid: self.guid(),
                expected: StateKind::Stateful,
            }),
            _ => Err(Error::WrongEndpointKind {
                guid: self.guid(),
                expected: 'W',
            }),
        }
    }

    /// Allocate the next sequence number (the first one is 1).
    pub fn new_change(&self) -> Result<SequenceNumber> {
        let core = self.writer_core()?;
        let mut last = core.last_sn.lock();
        *last = last.next();
        Ok(*last)
    }

    /// Last allocated sequence number (0 before the first change).
    pub fn last_sequence_number(&self) -> Result<SequenceNumber> {
        Ok(*self.writer_core()?.last_sn.lock())
    }

    /// Complete HEARTBEAT message announcing `[1, last]`.
    ///
    /// Each call consumes one heartbeat count.
    pub fn heartbeat_message(&self, reader_id: EntityId, is_final: bool) -> Result<Vec<u8>> {
        let core = self.writer_core()?;
        let last = *core.last_sn.lock();
        create_message_heartbeat(
            self.guid().prefix,
            reader_id,
            self.entity_id(),
            SequenceNumber::FIRST,
            last,
            core.next_heartbeat_count(),
            is_final,
            false,
            ENDPOINT_ENDIANNESS,
        )
    }

    /// Complete INFO_TS + GAP message.
    pub fn gap_message(
        &self,
        reader_id: EntityId,
        gap_start: SequenceNumber,
        gap_list: &SequenceNumberSet,
    ) -> Result<Vec<u8>> {
        self.writer_core()?;
        create_message_gap(
            self.guid().prefix,
            gap_start,
            gap_list,
            reader_id,
            self.entity_id(),
            ENDPOINT_ENDIANNESS,
        )
    }

    /// Send a HEARTBEAT to every reader locator (stateless) or matched
    /// reader proxy (stateful). Returns the number of datagrams delivered.
    pub fn send_heartbeat(&self) -> Result<usize> {
        self.writer_core()?;
        match &self.variant {
            EndpointVariant::StatelessWriter(w) => {
                let locators = w.reader_locators.read().clone();
                if locators.is_empty() {
                    return Ok(0);
                }
                let message = self.heartbeat_message(EntityId::UNKNOWN, false)?;
                Ok(self.send_channel().send(&message, &locators))
            }
            EndpointVariant::StatefulWriter(w) => {
                let proxies: Vec<ReaderProxy> = w.matched_readers.read().values().cloned().collect();
                let mut delivered = 0;
                for proxy in &proxies {
                    let message = self.heartbeat_message(proxy.remote_reader.entity_id, false)?;
                    delivered += self.send_channel().send(&message, proxy.destinations());
                }
                Ok(delivered)
            }
            _ => Ok(0),
        }
    }

    pub fn add_reader_locator(&self, locator: Locator) -> Result<()> {
        self.ensure_open()?;
        match &self.variant {
            EndpointVariant::StatelessWriter(w) => {
                let mut locators = w.reader_locators.write();
                if !locators.contains(&locator) {
                    locators.push(locator);
                }
                Ok(())
            }
            EndpointVariant::StatefulWriter(_) => Err(Error::WrongStateKind {
                guid: self.guid(),
                expected: StateKind::Stateless,
            }),
            _ => Err(Error::WrongEndpointKind {
                guid: self.guid(),
                expected: 'W',
            }),
        }
    }

    pub fn remove_reader_locator(&self, locator: &Locator) -> bool {
        match &self.variant {
            EndpointVariant::StatelessWriter(w) => {
                let mut locators = w.reader_locators.write();
                let before = locators.len();
                locators.retain(|l| l != locator);
                locators.len() != before
            }
            _ => false,
        }
    }

    pub fn reader_locators(&self) -> Vec<Locator> {
        match &self.variant {
            EndpointVariant::StatelessWriter(w) => w.reader_locators.read().clone(),
            _ => Vec::new(),
        }
    }

    /// Match a remote reader. Re-adding a known reader replaces its proxy.
    pub fn matched_reader_add(&self, proxy: ReaderProxy) -> Result<()> {
        let writer = self.stateful_writer()?;
        log::debug!("[endpoint] {} matched reader {}", self.guid(), proxy.remote_reader);
        writer.matched_readers.write().insert(proxy.remote_reader, proxy);
        Ok(())
    }

    pub fn matched_reader_remove(&self, reader: &Guid) -> bool {
        match &self.variant {
            EndpointVariant::StatefulWriter(w) => w.matched_readers.write().remove(reader).is_some(),
            _ => false,
        }
    }

    pub fn reader_proxy(&self, reader: &Guid) -> Option<ReaderProxy> {
        match &self.variant {
            EndpointVariant::StatefulWriter(w) => w.matched_readers.read().get(reader).cloned(),
            _ => None,
        }
    }

    pub fn matched_readers(&self) -> Vec<Guid> {
        match &self.variant {
            EndpointVariant::StatefulWriter(w) => w.matched_readers.read().keys().copied().collect(),
            _ => Vec::new(),
        }
    }

    /// Arm the periodic HEARTBEAT of this writer on the event scheduler.
    pub(crate) fn start_periodic_heartbeat(&self) {
        let period = self.qos().heartbeat_period;
        if period.is_zero() {
            return;
        }
        if let Ok(core) = self.writer_core() {
            self.arm_heartbeat(core, period);
        }
    }

    fn arm_heartbeat(&self, core: &WriterCore, period: Duration) {
        let weak = self.common.self_ref.clone();
        let id = self.common.events.schedule_after(period, move || {
            if let Some(endpoint) = weak.upgrade() {
                endpoint.periodic_heartbeat(period);
            }
        });
        *core.periodic.lock() = id;
    }

    fn periodic_heartbeat(&self, period: Duration) {
        if self.is_closed() {
            return;
        }
        if let Err(e) = self.send_heartbeat() {
            log::debug!("[endpoint] {} periodic heartbeat failed: {}", self.guid(), e);
        }
        if let Ok(core) = self.writer_core() {
            self.arm_heartbeat(core, period);
        }
    }

    pub(super) fn take_periodic_heartbeat(&self) -> Option<EventId> {
        match &self.variant {
            EndpointVariant::StatelessWriter(w) => w.core.periodic.lock().take(),
            EndpointVariant::StatefulWriter(w) => w.core.periodic.lock().take(),
            _ => None,
        }
    }

    pub(super) fn on_writer_submessage(&self, source: GuidPrefix, submessage: &Submessage) -> bool {
        let Submessage::AckNack(ack) = submessage else {
            return false;
        };
        if ack.writer_id != self.entity_id() {
            return false;
        }
        let reader = Guid::new(source, ack.reader_id);
        let listener = match &self.variant {
            EndpointVariant::StatelessWriter(w) => w.core.listener.clone(),
            EndpointVariant::StatefulWriter(w) => {
                if !apply_acknack(&mut w.matched_readers.write(), &reader, ack) {
                    return false;
                }
                w.core.listener.clone()
            }
            _ => return false,
        };
        if let Some(listener) = listener {
            listener.on_acknack(&self.guid(), &reader, ack);
        }
        true
    }
}

/// Update the proxy of `reader`. Stale or unmatched ACKNACKs are dropped.
fn apply_acknack(proxies: &mut HashMap<Guid, ReaderProxy>, reader: &Guid, ack: &AckNack) -> bool {
    let Some(proxy) = proxies.get_mut(reader) else {
        log::trace!("[endpoint] ACKNACK from unmatched reader {}", reader);
        return false;
    };
    if matches!(proxy.last_acknack_count, Some(last) if ack.count <= last) {
        return false;
    }
    proxy.last_acknack_count = Some(ack.count);
    proxy.acked_sn = SequenceNumber(ack.reader_sn_state.base().0 - 1);
    proxy.requested_changes = ack.reader_sn_state.iter().collect();
    true
}
