// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Protocol-level readers and writers.
//!
//! An [`Endpoint`] is a common record (guid, topic, QoS, locators, handles
//! to the participant's send channel and event scheduler) plus one of four
//! kind-specific payloads in [`EndpointVariant`]. Endpoints are created and
//! destroyed only by their [`Participant`](crate::Participant); user code
//! holds `Arc<Endpoint>` handles that become inert once the endpoint is
//! deleted.

pub mod listener;
pub mod qos;
pub mod reader;
pub mod writer;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use dashmap::DashMap;
use parking_lot::RwLock;

use crate::core::ser::Endianness;
use crate::core::types::{EntityId, Guid, GuidPrefix, Locator, TypeDescriptor};
use crate::engine::EventHandle;
use crate::participant::Participant;
use crate::protocol::Submessage;
use crate::transport::SendChannel;
use crate::{Error, Result};

pub use listener::{ReaderListener, WriterListener};
pub use qos::{
    Durability, EndpointKind, EndpointQos, History, ReaderAttributes, Reliability, StateKind,
    TopicAttributes, TopicKind, WriterAttributes,
};
pub use reader::{StatefulReader, StatelessReader, WriterProxy};
pub use writer::{ReaderProxy, StatefulWriter, StatelessWriter};

/// Endpoints of one participant keyed by entity id.
pub type EndpointRegistry = DashMap<EntityId, Arc<Endpoint>>;

/// Byte order of every message an endpoint emits.
pub(crate) const ENDPOINT_ENDIANNESS: Endianness = Endianness::native();

/// Handles a participant injects into each endpoint it creates.
#[derive(Clone)]
pub(crate) struct EndpointContext {
    pub participant: Weak<Participant>,
    pub guid_prefix: GuidPrefix,
    pub send: SendChannel,
    pub events: EventHandle,
}

/// Fields shared by every endpoint kind.
pub struct EndpointCommon {
    guid: Guid,
    topic: TopicAttributes,
    qos: EndpointQos,
    type_descriptor: Arc<TypeDescriptor>,
    payload_size: u32,
    unicast_locators: RwLock<Vec<Locator>>,
    multicast_locators: RwLock<Vec<Locator>>,
    participant: Weak<Participant>,
    send: SendChannel,
    events: EventHandle,
    self_ref: Weak<Endpoint>,
    closed: AtomicBool,
}

pub enum EndpointVariant {
    StatelessWriter(StatelessWriter),
    StatefulWriter(StatefulWriter),
    StatelessReader(StatelessReader),
    StatefulReader(StatefulReader),
}

pub struct Endpoint {
    common: EndpointCommon,
    variant: EndpointVariant,
}

struct CommonParts {
    guid: Guid,
    topic: TopicAttributes,
    qos: EndpointQos,
    type_descriptor: Arc<TypeDescriptor>,
    payload_size: u32,
    unicast_locators: Vec<Locator>,
    multicast_locators: Vec<Locator>,
}

impl Endpoint {
    fn build(parts: CommonParts, variant: EndpointVariant, ctx: EndpointContext) -> Arc<Self> {
        Arc::new_cyclic(|self_ref| Endpoint {
            common: EndpointCommon {
                guid: parts.guid,
                topic: parts.topic,
                qos: parts.qos,
                type_descriptor: parts.type_descriptor,
                payload_size: parts.payload_size,
                unicast_locators: RwLock::new(parts.unicast_locators),
                multicast_locators: RwLock::new(parts.multicast_locators),
                participant: ctx.participant,
                send: ctx.send,
                events: ctx.events,
                self_ref: self_ref.clone(),
                closed: AtomicBool::new(false),
            },
            variant,
        })
    }

    pub(crate) fn new_writer(
        entity_id: EntityId,
        attributes: WriterAttributes,
        state_kind: StateKind,
        type_descriptor: Arc<TypeDescriptor>,
        listener: Option<Arc<dyn WriterListener>>,
        ctx: EndpointContext,
    ) -> Arc<Self> {
        let variant = match state_kind {
            StateKind::Stateless => EndpointVariant::StatelessWriter(StatelessWriter::new(listener)),
            StateKind::Stateful => EndpointVariant::StatefulWriter(StatefulWriter::new(listener)),
        };
        let parts = CommonParts {
            guid: Guid::new(ctx.guid_prefix, entity_id),
            topic: attributes.topic,
            qos: attributes.qos,
            type_descriptor,
            payload_size: attributes.payload_size,
            unicast_locators: attributes.unicast_locators,
            multicast_locators: attributes.multicast_locators,
        };
        Self::build(parts, variant, ctx)
    }

    pub(crate) fn new_reader(
        entity_id: EntityId,
        attributes: ReaderAttributes,
        state_kind: StateKind,
        type_descriptor: Arc<TypeDescriptor>,
        listener: Option<Arc<dyn ReaderListener>>,
        ctx: EndpointContext,
    ) -> Arc<Self> {
        let variant = match state_kind {
            StateKind::Stateless => EndpointVariant::StatelessReader(StatelessReader::new(listener)),
            StateKind::Stateful => EndpointVariant::StatefulReader(StatefulReader::new(listener)),
        };
        let parts = CommonParts {
            guid: Guid::new(ctx.guid_prefix, entity_id),
            topic: attributes.topic,
            qos: attributes.qos,
            type_descriptor,
            payload_size: attributes.payload_size,
            unicast_locators: attributes.unicast_locators,
            multicast_locators: attributes.multicast_locators,
        };
        Self::build(parts, variant, ctx)
    }

    pub fn guid(&self) -> Guid {
        self.common.guid
    }

    pub fn entity_id(&self) -> EntityId {
        self.common.guid.entity_id
    }

    pub fn kind(&self) -> EndpointKind {
        match self.variant {
            EndpointVariant::StatelessWriter(_) | EndpointVariant::StatefulWriter(_) => {
                EndpointKind::Writer
            }
            EndpointVariant::StatelessReader(_) | EndpointVariant::StatefulReader(_) => {
                EndpointKind::Reader
            }
        }
    }

    pub fn state_kind(&self) -> StateKind {
        match self.variant {
            EndpointVariant::StatelessWriter(_) | EndpointVariant::StatelessReader(_) => {
                StateKind::Stateless
            }
            EndpointVariant::StatefulWriter(_) | EndpointVariant::StatefulReader(_) => {
                StateKind::Stateful
            }
        }
    }

    pub fn is_writer(&self) -> bool {
        self.kind() == EndpointKind::Writer
    }

    pub fn is_reader(&self) -> bool {
        self.kind() == EndpointKind::Reader
    }

    pub fn variant(&self) -> &EndpointVariant {
        &self.variant
    }

    pub fn topic(&self) -> &TopicAttributes {
        &self.common.topic
    }

    pub fn topic_kind(&self) -> TopicKind {
        self.common.topic.topic_kind
    }

    pub fn qos(&self) -> &EndpointQos {
        &self.common.qos
    }

    pub fn type_descriptor(&self) -> &TypeDescriptor {
        &self.common.type_descriptor
    }

    pub fn payload_size(&self) -> u32 {
        self.common.payload_size
    }

    pub fn unicast_locators(&self) -> Vec<Locator> {
        self.common.unicast_locators.read().clone()
    }

    pub fn multicast_locators(&self) -> Vec<Locator> {
        self.common.multicast_locators.read().clone()
    }

    pub(crate) fn set_unicast_locators(&self, locators: Vec<Locator>) {
        *self.common.unicast_locators.write() = locators;
    }

    pub(crate) fn set_multicast_locators(&self, locators: Vec<Locator>) {
        *self.common.multicast_locators.write() = locators;
    }

    /// Owning participant, or `None` once it has been dropped.
    pub fn participant(&self) -> Option<Arc<Participant>> {
        self.common.participant.upgrade()
    }

    pub fn send_channel(&self) -> &SendChannel {
        &self.common.send
    }

    pub fn event_handle(&self) -> &EventHandle {
        &self.common.events
    }

    /// `true` once the participant deleted this endpoint or was dropped.
    pub fn is_closed(&self) -> bool {
        self.common.closed.load(Ordering::Acquire)
    }

    pub(crate) fn close(&self) {
        if self.common.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(id) = self.take_periodic_heartbeat() {
            self.common.events.cancel(id);
        }
        log::debug!("[endpoint] {} closed", self.common.guid);
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            Err(Error::EndpointClosed(self.common.guid))
        } else {
            Ok(())
        }
    }

    /// Offer one inbound submessage from participant `source`.
    ///
    /// Returns `true` when the endpoint accepted it.
    pub fn handle_submessage(&self, source: GuidPrefix, submessage: &Submessage) -> bool {
        if self.is_closed() {
            return false;
        }
        match &self.variant {
            EndpointVariant::StatelessWriter(_) | EndpointVariant::StatefulWriter(_) => {
                self.on_writer_submessage(source, submessage)
            }
            EndpointVariant::StatelessReader(_) | EndpointVariant::StatefulReader(_) => {
                self.on_reader_submessage(source, submessage)
            }
        }
    }
}

impl std::fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Endpoint")
            .field("guid", &self.common.guid)
            .field("kind", &self.kind())
            .field("state_kind", &self.state_kind())
            .field("topic", &self.common.topic.topic_name)
            .field("closed", &self.is_closed())
            .finish()
    }
}
