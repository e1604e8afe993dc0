// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Participant builder.
//!
//! Everything has a default: UDP transports, a guid prefix generated from
//! the host, and the host's IPv4 addresses on port 7555 when no default
//! unicast locator is given. Tests swap the transports for a
//! [`MemoryTransport`] and the IP finder for a [`StaticIpFinder`].
//!
//! [`StaticIpFinder`]: crate::transport::StaticIpFinder

use std::sync::Arc;

use parking_lot::Mutex;

use super::collaborators::{DiscoveryProtocol, LivelinessProtocol};
use super::liveliness::WriterLiveliness;
use super::{Participant, ParticipantState};
use crate::config::{DiscoveryAttributes, ParticipantAttributes, FALLBACK_UNICAST_PORT};
use crate::core::types::{EntityId, Guid, GuidPrefix, Locator};
use crate::engine::{EventScheduler, ResourceSemaphore};
use crate::transport::{
    HostIpFinder, IpFinder, ListenTransport, MemoryTransport, SendChannel, SendTransport,
    UdpListenTransport, UdpSendTransport,
};
use crate::Result;

/// Builder for configuring and creating a [`Participant`].
pub struct ParticipantBuilder {
    attributes: ParticipantAttributes,
    guid_prefix: Option<GuidPrefix>,
    discovery: Option<Arc<dyn DiscoveryProtocol>>,
    liveliness: Option<Arc<dyn LivelinessProtocol>>,
    listen_transport: Option<Arc<dyn ListenTransport>>,
    send_transport: Option<Arc<dyn SendTransport>>,
    ip_finder: Option<Box<dyn IpFinder>>,
}

impl ParticipantBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            attributes: ParticipantAttributes {
                name: name.to_string(),
                ..ParticipantAttributes::default()
            },
            guid_prefix: None,
            discovery: None,
            liveliness: None,
            listen_transport: None,
            send_transport: None,
            ip_finder: None,
        }
    }

    /// Replace every attribute at once (e.g. loaded from YAML). The name
    /// given to the builder is kept when `attributes.name` is empty.
    pub fn attributes(mut self, attributes: ParticipantAttributes) -> Self {
        let name = std::mem::take(&mut self.attributes.name);
        self.attributes = attributes;
        if self.attributes.name.is_empty() {
            self.attributes.name = name;
        }
        self
    }

    pub fn participant_id(mut self, id: u8) -> Self {
        self.attributes.participant_id = id;
        self
    }

    pub fn guid_prefix(mut self, prefix: GuidPrefix) -> Self {
        self.guid_prefix = Some(prefix);
        self
    }

    pub fn default_unicast_locator(mut self, locator: Locator) -> Self {
        self.attributes.default_unicast_locators.push(locator);
        self
    }

    pub fn default_multicast_locator(mut self, locator: Locator) -> Self {
        self.attributes.default_multicast_locators.push(locator);
        self
    }

    pub fn default_send_port(mut self, port: u32) -> Self {
        self.attributes.default_send_port = port;
        self
    }

    pub fn send_socket_buffer_size(mut self, bytes: usize) -> Self {
        self.attributes.send_socket_buffer_size = bytes;
        self
    }

    pub fn listen_socket_buffer_size(mut self, bytes: usize) -> Self {
        self.attributes.listen_socket_buffer_size = bytes;
        self
    }

    pub fn discovery_attributes(mut self, discovery: DiscoveryAttributes) -> Self {
        self.attributes.discovery = discovery;
        self
    }

    /// Discovery collaborator, installed when
    /// `use_simple_participant_discovery` is set.
    pub fn discovery(mut self, discovery: Arc<dyn DiscoveryProtocol>) -> Self {
        self.discovery = Some(discovery);
        self
    }

    /// Liveliness collaborator, installed when `use_writer_liveliness` is
    /// set ([`WriterLiveliness`] otherwise).
    pub fn liveliness(mut self, liveliness: Arc<dyn LivelinessProtocol>) -> Self {
        self.liveliness = Some(liveliness);
        self
    }

    pub fn listen_transport(mut self, transport: Arc<dyn ListenTransport>) -> Self {
        self.listen_transport = Some(transport);
        self
    }

    pub fn send_transport(mut self, transport: Arc<dyn SendTransport>) -> Self {
        self.send_transport = Some(transport);
        self
    }

    /// Use one in-process bus for both directions.
    pub fn memory_transport(self, bus: MemoryTransport) -> Self {
        self.listen_transport(Arc::new(bus.clone()))
            .send_transport(Arc::new(bus))
    }

    pub fn ip_finder(mut self, finder: impl IpFinder + 'static) -> Self {
        self.ip_finder = Some(Box::new(finder));
        self
    }

    /// Build the participant and start its event thread.
    ///
    /// # Initialization Sequence
    /// 1. Generate the guid prefix unless one was given
    /// 2. Open the send channel (UDP on `default_send_port` by default)
    /// 3. Fill empty default unicast locators from the IP finder
    /// 4. Start the event scheduler and wait for it
    /// 5. Install liveliness and discovery per `DiscoveryAttributes`
    /// 6. Hand discovery a weak reference to the participant
    pub fn build(self) -> Result<Arc<Participant>> {
        let attrs = self.attributes;
        log::debug!("[participant] ParticipantBuilder::build name={}", attrs.name);

        let prefix = self
            .guid_prefix
            .unwrap_or_else(|| GuidPrefix::generate(attrs.participant_id));

        let send_transport: Arc<dyn SendTransport> = match self.send_transport {
            Some(transport) => transport,
            None => Arc::new(UdpSendTransport::bind(
                attrs.default_send_port,
                attrs.send_socket_buffer_size,
            )?),
        };
        let listen_transport: Arc<dyn ListenTransport> = match self.listen_transport {
            Some(transport) => transport,
            None => Arc::new(UdpListenTransport::new(attrs.listen_socket_buffer_size)),
        };

        let mut default_unicast = attrs.default_unicast_locators;
        if default_unicast.is_empty() {
            let finder = self.ip_finder.unwrap_or_else(|| Box::new(HostIpFinder));
            default_unicast = finder
                .ipv4_addresses()
                .into_iter()
                .map(|ip| Locator::udpv4(ip, FALLBACK_UNICAST_PORT))
                .collect();
            if default_unicast.is_empty() {
                log::warn!("[participant] no host address found for default unicast locators");
            } else {
                log::debug!("[participant] default unicast locators {:?}", default_unicast);
            }
        }

        let semaphore = Arc::new(ResourceSemaphore::new());
        let events = EventScheduler::start(&attrs.name, Arc::clone(&semaphore))?;
        semaphore.wait();
        let event_handle = events.handle();

        let discovery_attrs = attrs.discovery;
        let liveliness = if discovery_attrs.use_writer_liveliness {
            Some(
                self.liveliness
                    .unwrap_or_else(|| Arc::new(WriterLiveliness::new())),
            )
        } else {
            None
        };
        let discovery = if discovery_attrs.use_simple_participant_discovery {
            if self.discovery.is_none() {
                log::warn!(
                    "[participant] '{}' asked for participant discovery but none was supplied",
                    attrs.name
                );
            }
            self.discovery
        } else {
            if self.discovery.is_some() {
                log::debug!("[participant] discovery disabled, ignoring supplied collaborator");
            }
            None
        };

        let state = ParticipantState {
            default_unicast,
            default_multicast: attrs.default_multicast_locators,
            ..ParticipantState::default()
        };

        let participant = Arc::new_cyclic(|self_ref| Participant {
            guid: Guid::new(prefix, EntityId::PARTICIPANT),
            name: attrs.name,
            participant_id: attrs.participant_id,
            discovery_attributes: discovery_attrs,
            send_socket_buffer_size: attrs.send_socket_buffer_size,
            listen_socket_buffer_size: attrs.listen_socket_buffer_size,
            state: Mutex::new(state),
            registry: Arc::new(Default::default()),
            listen_transport,
            send_channel: SendChannel::new(send_transport),
            events: Mutex::new(events),
            event_handle,
            semaphore,
            discovery,
            liveliness,
            self_ref: self_ref.clone(),
        });

        if let Some(discovery) = &participant.discovery {
            discovery.init(Arc::downgrade(&participant));
        }

        log::info!(
            "[participant] '{}' created with guid prefix {}",
            participant.name,
            prefix
        );
        Ok(participant)
    }
}
