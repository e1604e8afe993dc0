// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! RTPS participant: entity and resource manager.
//!
//! The participant owns every endpoint it creates (registry keyed by
//! [`EntityId`]) and every listen resource. One mutex guards the endpoint
//! collections, the listen resources and the entity id counter, so creation
//! and deletion are atomic with respect to each other.
//!
//! - [`builder`]: construction (`Participant::builder(name).build()`)
//! - [`entities`]: endpoint creation and deletion
//! - [`resources`]: locator to listen-resource resolution
//! - [`collaborators`]: discovery and liveliness seams
//! - [`liveliness`]: default liveliness collaborator

pub mod builder;
pub mod collaborators;
mod entities;
pub mod liveliness;
mod resources;

use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::config::DiscoveryAttributes;
use crate::core::types::{EntityId, Guid, GuidPrefix, Locator};
use crate::endpoint::{Endpoint, EndpointContext, EndpointRegistry};
use crate::engine::{EventHandle, EventScheduler, ResourceSemaphore};
use crate::transport::{ListenResource, ListenTransport, SendChannel};

pub use builder::ParticipantBuilder;
pub use collaborators::{DiscoveryProtocol, LivelinessProtocol};
pub use liveliness::WriterLiveliness;

/// Collections guarded by the participant mutex.
#[derive(Default)]
pub(crate) struct ParticipantState {
    pub default_unicast: Vec<Locator>,
    pub default_multicast: Vec<Locator>,
    pub listen_resources: Vec<ListenResource>,
    pub user_writers: Vec<EntityId>,
    pub user_readers: Vec<EntityId>,
    pub all_writers: Vec<EntityId>,
    pub all_readers: Vec<EntityId>,
    pub id_counter: u32,
}

pub struct Participant {
    guid: Guid,
    name: String,
    participant_id: u8,
    discovery_attributes: DiscoveryAttributes,
    send_socket_buffer_size: usize,
    listen_socket_buffer_size: usize,
    state: Mutex<ParticipantState>,
    registry: Arc<EndpointRegistry>,
    listen_transport: Arc<dyn ListenTransport>,
    send_channel: SendChannel,
    events: Mutex<EventScheduler>,
    event_handle: EventHandle,
    semaphore: Arc<ResourceSemaphore>,
    discovery: Option<Arc<dyn DiscoveryProtocol>>,
    liveliness: Option<Arc<dyn LivelinessProtocol>>,
    self_ref: Weak<Participant>,
}

impl Participant {
    pub fn builder(name: &str) -> ParticipantBuilder {
        ParticipantBuilder::new(name)
    }

    /// Participant guid (prefix + `ENTITYID_PARTICIPANT`).
    pub fn guid(&self) -> Guid {
        self.guid
    }

    pub fn guid_prefix(&self) -> GuidPrefix {
        self.guid.prefix
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn participant_id(&self) -> u8 {
        self.participant_id
    }

    pub fn discovery_attributes(&self) -> &DiscoveryAttributes {
        &self.discovery_attributes
    }

    pub fn send_socket_buffer_size(&self) -> usize {
        self.send_socket_buffer_size
    }

    pub fn listen_socket_buffer_size(&self) -> usize {
        self.listen_socket_buffer_size
    }

    pub fn default_unicast_locators(&self) -> Vec<Locator> {
        self.state.lock().default_unicast.clone()
    }

    pub fn default_multicast_locators(&self) -> Vec<Locator> {
        self.state.lock().default_multicast.clone()
    }

    pub fn send_channel(&self) -> &SendChannel {
        &self.send_channel
    }

    pub fn event_handle(&self) -> &EventHandle {
        &self.event_handle
    }

    pub fn discovery(&self) -> Option<&Arc<dyn DiscoveryProtocol>> {
        self.discovery.as_ref()
    }

    pub fn liveliness(&self) -> Option<&Arc<dyn LivelinessProtocol>> {
        self.liveliness.as_ref()
    }

    /// Registered endpoint with this entity id.
    pub fn endpoint(&self, entity_id: EntityId) -> Option<Arc<Endpoint>> {
        self.registry.get(&entity_id).map(|e| Arc::clone(e.value()))
    }

    fn resolve(&self, ids: &[EntityId]) -> Vec<Arc<Endpoint>> {
        ids.iter().filter_map(|id| self.endpoint(*id)).collect()
    }

    pub fn user_writers(&self) -> Vec<Arc<Endpoint>> {
        let ids = self.state.lock().user_writers.clone();
        self.resolve(&ids)
    }

    pub fn user_readers(&self) -> Vec<Arc<Endpoint>> {
        let ids = self.state.lock().user_readers.clone();
        self.resolve(&ids)
    }

    pub fn all_writers(&self) -> Vec<Arc<Endpoint>> {
        let ids = self.state.lock().all_writers.clone();
        self.resolve(&ids)
    }

    pub fn all_readers(&self) -> Vec<Arc<Endpoint>> {
        let ids = self.state.lock().all_readers.clone();
        self.resolve(&ids)
    }

    pub fn user_writer_count(&self) -> usize {
        self.state.lock().user_writers.len()
    }

    pub fn user_reader_count(&self) -> usize {
        self.state.lock().user_readers.len()
    }

    pub fn listen_resource_count(&self) -> usize {
        self.state.lock().listen_resources.len()
    }

    /// Bound locators of the listen resources, in creation order.
    pub fn listen_resource_locators(&self) -> Vec<Locator> {
        self.state
            .lock()
            .listen_resources
            .iter()
            .map(ListenResource::locator)
            .collect()
    }

    /// Entity ids associated with the listen resource bound to `locator`.
    pub fn listen_resource_associations(&self, locator: &Locator) -> Option<Vec<EntityId>> {
        self.state
            .lock()
            .listen_resources
            .iter()
            .find(|r| r.locator() == *locator)
            .map(ListenResource::associated)
    }

    pub fn announce_participant_state(&self) {
        match &self.discovery {
            Some(discovery) => discovery.announce_participant_state(false),
            None => log::warn!("[participant] '{}' has no discovery to announce through", self.name),
        }
    }

    pub fn stop_participant_announcement(&self) {
        match &self.discovery {
            Some(discovery) => discovery.stop_participant_announcement(),
            None => log::warn!("[participant] '{}' has no discovery to stop", self.name),
        }
    }

    pub fn reset_participant_announcement(&self) {
        match &self.discovery {
            Some(discovery) => discovery.reset_participant_announcement(),
            None => log::warn!("[participant] '{}' has no discovery to reset", self.name),
        }
    }

    /// Add one permit to the resource semaphore. Never blocks.
    pub fn resource_semaphore_post(&self) {
        self.semaphore.post();
    }

    /// Take one permit, blocking until one is available. No timeout.
    pub fn resource_semaphore_wait(&self) {
        self.semaphore.wait();
    }

    pub(crate) fn endpoint_context(&self) -> EndpointContext {
        EndpointContext {
            participant: self.self_ref.clone(),
            guid_prefix: self.guid.prefix,
            send: self.send_channel.clone(),
            events: self.event_handle.clone(),
        }
    }
}

impl Drop for Participant {
    fn drop(&mut self) {
        let resources = std::mem::take(&mut self.state.get_mut().listen_resources);
        // Joins every receive thread.
        drop(resources);

        let endpoints: Vec<Arc<Endpoint>> = self
            .registry
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        self.registry.clear();
        for endpoint in &endpoints {
            endpoint.close();
        }

        self.events.get_mut().shutdown();
        self.semaphore.release_waiters();
        log::debug!(
            "[participant] '{}' dropped ({} endpoints closed)",
            self.name,
            endpoints.len()
        );
    }
}

impl std::fmt::Debug for Participant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Participant")
            .field("name", &self.name)
            .field("guid", &self.guid)
            .field("participant_id", &self.participant_id)
            .finish_non_exhaustive()
    }
}
