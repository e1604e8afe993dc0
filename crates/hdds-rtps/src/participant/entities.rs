// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Endpoint creation and deletion.

use std::sync::Arc;

use parking_lot::MutexGuard;

use super::resources::{release_associations, BindFailures};
use super::{Participant, ParticipantState};
use crate::core::types::{EntityId, Guid, TypeDescriptor};
use crate::endpoint::{
    Endpoint, EndpointKind, ReaderAttributes, ReaderListener, Reliability, StateKind,
    WriterAttributes, WriterListener,
};
use crate::{Error, Result};

impl Participant {
    /// Create a writer.
    ///
    /// Without `explicit_entity_id` the id comes from the participant
    /// counter and the topic kind. Stateful writers get their listen
    /// resources resolved; if that fails nothing is registered and
    /// [`Error::ListenResourceBindFailure`] is returned.
    pub fn create_writer(
        &self,
        attributes: WriterAttributes,
        is_builtin: bool,
        state_kind: StateKind,
        data_type: Arc<TypeDescriptor>,
        listener: Option<Arc<dyn WriterListener>>,
        explicit_entity_id: Option<EntityId>,
    ) -> Result<Arc<Endpoint>> {
        let kind = attributes.topic.topic_kind.writer_entity_kind();
        let mut state = self.state.lock();
        let entity_id = self.next_entity_id(&mut state, kind, explicit_entity_id)?;

        let writer = Endpoint::new_writer(
            entity_id,
            attributes,
            state_kind,
            data_type,
            listener,
            self.endpoint_context(),
        );

        if state_kind == StateKind::Stateful {
            let mut failures = BindFailures::default();
            if !self.assign_endpoint_locked(&mut state, &writer, is_builtin, &mut failures) {
                return Err(self.abort_creation(state, &writer, failures));
            }
        }

        self.registry.insert(entity_id, Arc::clone(&writer));
        state.all_writers.push(entity_id);
        if !is_builtin {
            state.user_writers.push(entity_id);
        }
        drop(state);

        if !is_builtin {
            if let Some(discovery) = &self.discovery {
                discovery.local_writer_matching(&writer, true);
            }
            if let Some(liveliness) = &self.liveliness {
                liveliness.add_local_writer(&writer);
            }
        }

        if state_kind == StateKind::Stateful && writer.qos().reliability == Reliability::Reliable {
            writer.start_periodic_heartbeat();
        }

        log::debug!(
            "[participant] created {} writer {} on '{}'",
            state_kind,
            writer.guid(),
            writer.topic().topic_name
        );
        Ok(writer)
    }

    /// Create a reader. Listen resources are resolved for every reader.
    pub fn create_reader(
        &self,
        attributes: ReaderAttributes,
        is_builtin: bool,
        state_kind: StateKind,
        data_type: Arc<TypeDescriptor>,
        listener: Option<Arc<dyn ReaderListener>>,
        explicit_entity_id: Option<EntityId>,
    ) -> Result<Arc<Endpoint>> {
        let kind = attributes.topic.topic_kind.reader_entity_kind();
        let mut state = self.state.lock();
        let entity_id = self.next_entity_id(&mut state, kind, explicit_entity_id)?;

        let reader = Endpoint::new_reader(
            entity_id,
            attributes,
            state_kind,
            data_type,
            listener,
            self.endpoint_context(),
        );

        let mut failures = BindFailures::default();
        if !self.assign_endpoint_locked(&mut state, &reader, is_builtin, &mut failures) {
            return Err(self.abort_creation(state, &reader, failures));
        }

        self.registry.insert(entity_id, Arc::clone(&reader));
        state.all_readers.push(entity_id);
        if !is_builtin {
            state.user_readers.push(entity_id);
        }
        drop(state);

        if !is_builtin {
            if let Some(discovery) = &self.discovery {
                discovery.local_reader_matching(&reader, true);
            }
        }

        log::debug!(
            "[participant] created {} reader {} on '{}'",
            state_kind,
            reader.guid(),
            reader.topic().topic_name
        );
        Ok(reader)
    }

    /// Delete a user endpoint; `kind` is `'W'` or `'R'`.
    ///
    /// Returns `false` when the endpoint is not a user endpoint of that
    /// kind on this participant.
    pub fn delete_user_endpoint(&self, endpoint: &Endpoint, kind: char) -> bool {
        match EndpointKind::from_char(kind) {
            Some(kind) => self.remove_user_endpoint(endpoint.guid(), kind).is_ok(),
            None => {
                log::debug!("[participant] unknown endpoint kind '{}'", kind);
                false
            }
        }
    }

    /// Typed form of [`Participant::delete_user_endpoint`].
    pub fn remove_user_endpoint(&self, guid: Guid, kind: EndpointKind) -> Result<()> {
        if guid.prefix != self.guid.prefix {
            return Err(Error::EndpointNotFound(guid));
        }
        let id = guid.entity_id;

        let mut state = self.state.lock();
        let ParticipantState {
            user_writers,
            user_readers,
            all_writers,
            all_readers,
            ..
        } = &mut *state;
        let (user, all) = match kind {
            EndpointKind::Writer => (user_writers, all_writers),
            EndpointKind::Reader => (user_readers, all_readers),
        };
        let Some(pos) = user.iter().position(|x| *x == id) else {
            return Err(Error::EndpointNotFound(guid));
        };
        user.remove(pos);
        all.retain(|x| *x != id);

        let endpoint = self.registry.remove(&id).map(|(_, endpoint)| endpoint);
        let released = release_associations(&mut state, id, &[]);
        drop(state);
        // Joins the receive threads of emptied resources.
        drop(released);

        if let Some(endpoint) = endpoint {
            match kind {
                EndpointKind::Writer => {
                    if let Some(liveliness) = &self.liveliness {
                        liveliness.remove_local_writer(&endpoint);
                    }
                    if let Some(discovery) = &self.discovery {
                        discovery.local_writer_matching(&endpoint, false);
                    }
                }
                EndpointKind::Reader => {
                    if let Some(discovery) = &self.discovery {
                        discovery.local_reader_matching(&endpoint, false);
                    }
                }
            }
            endpoint.close();
        }
        log::debug!("[participant] deleted {:?} {}", kind, guid);
        Ok(())
    }

    fn next_entity_id(
        &self,
        state: &mut ParticipantState,
        kind: u8,
        explicit_entity_id: Option<EntityId>,
    ) -> Result<EntityId> {
        if let Some(id) = explicit_entity_id {
            if self.registry.contains_key(&id) {
                return Err(Error::DuplicateEntityId(id));
            }
            return Ok(id);
        }
        loop {
            let next = state.id_counter + 1;
            let id = EntityId::from_counter(next, kind).ok_or(Error::EntityIdExhausted)?;
            state.id_counter = next;
            // Skip ids taken explicitly.
            if !self.registry.contains_key(&id) {
                return Ok(id);
            }
        }
    }

    /// Undo a failed creation: drop associations and emptied resources
    /// (after unlocking) and close the endpoint.
    fn abort_creation(
        &self,
        mut state: MutexGuard<'_, ParticipantState>,
        endpoint: &Endpoint,
        failures: BindFailures,
    ) -> Error {
        let released = release_associations(&mut state, endpoint.entity_id(), &[]);
        drop(state);
        drop(released);
        endpoint.close();
        let err = failures.into_error();
        log::warn!("[participant] endpoint {} not created: {}", endpoint.guid(), err);
        err
    }
}
