// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Locator to listen-resource resolution.
//!
//! At most one listen resource exists per distinct bound locator. An
//! endpoint asking for a locator that is already served is simply
//! associated with the existing resource.

use std::sync::Arc;

use super::{Participant, ParticipantState};
use crate::core::types::{EntityId, Locator};
use crate::endpoint::Endpoint;
use crate::transport::ListenResource;
use crate::Error;

/// Locators that could not be bound during one resolution pass.
#[derive(Debug, Default)]
pub(super) struct BindFailures(Vec<(Locator, String)>);

impl BindFailures {
    fn push(&mut self, locator: Locator, reason: String) {
        self.0.push((locator, reason));
    }

    /// First failure as a crate error.
    pub(super) fn into_error(self) -> Error {
        let count = self.0.len();
        match self.0.into_iter().next() {
            Some((locator, reason)) if count > 1 => Error::ListenResourceBindFailure {
                locator,
                reason: format!("{} ({} more locators failed)", reason, count - 1),
            },
            Some((locator, reason)) => Error::ListenResourceBindFailure { locator, reason },
            None => Error::ListenResourceBindFailure {
                locator: Locator::INVALID,
                reason: "no locator resolved".to_string(),
            },
        }
    }
}

impl Participant {
    /// Resolve every locator of `endpoint` to a listen resource.
    ///
    /// Best effort: every locator is tried even after a failure, and the
    /// result is the AND of all attempts. On failure the associations made
    /// by this call are undone and resources left empty are dropped.
    pub fn assign_endpoint_listen_resources(&self, endpoint: &Endpoint, is_builtin: bool) -> bool {
        let mut state = self.state.lock();
        let before = associated_locators(&state, endpoint.entity_id());
        let mut failures = BindFailures::default();
        if self.assign_endpoint_locked(&mut state, endpoint, is_builtin, &mut failures) {
            return true;
        }
        let released = release_associations(&mut state, endpoint.entity_id(), &before);
        drop(state);
        drop(released);
        false
    }

    /// Associate `endpoint` with the listen resource serving `locator`,
    /// creating one if needed. The resolved locator is written back.
    pub fn assign_locator_to_listen_resources(
        &self,
        endpoint: &Endpoint,
        locator: &mut Locator,
        is_multicast: bool,
        is_fixed: bool,
    ) -> bool {
        let mut state = self.state.lock();
        let mut failures = BindFailures::default();
        self.assign_locator_locked(
            &mut state,
            endpoint.entity_id(),
            locator,
            is_multicast,
            is_fixed,
            &mut failures,
        )
    }

    pub(super) fn assign_endpoint_locked(
        &self,
        state: &mut ParticipantState,
        endpoint: &Endpoint,
        is_builtin: bool,
        failures: &mut BindFailures,
    ) -> bool {
        let id = endpoint.entity_id();
        let mut ok = true;

        let mut unicast = endpoint.unicast_locators();
        if unicast.is_empty() && !is_builtin {
            let mut defaults = state.default_unicast.clone();
            for locator in defaults.iter_mut() {
                ok &= self.assign_locator_locked(state, id, locator, false, false, failures);
            }
            if ok {
                state.default_unicast = defaults.clone();
                endpoint.set_unicast_locators(defaults);
            }
        } else {
            for locator in unicast.iter_mut() {
                ok &= self.assign_locator_locked(state, id, locator, false, !is_builtin, failures);
            }
            endpoint.set_unicast_locators(unicast);
        }

        let mut multicast = endpoint.multicast_locators();
        if multicast.is_empty() && !is_builtin {
            let mut defaults = state.default_multicast.clone();
            for locator in defaults.iter_mut() {
                ok &= self.assign_locator_locked(state, id, locator, true, false, failures);
            }
            if ok {
                state.default_multicast = defaults.clone();
                endpoint.set_multicast_locators(defaults);
            }
        } else {
            for locator in multicast.iter_mut() {
                ok &= self.assign_locator_locked(state, id, locator, true, !is_builtin, failures);
            }
            endpoint.set_multicast_locators(multicast);
        }

        ok
    }

    pub(super) fn assign_locator_locked(
        &self,
        state: &mut ParticipantState,
        id: EntityId,
        locator: &mut Locator,
        is_multicast: bool,
        is_fixed: bool,
        failures: &mut BindFailures,
    ) -> bool {
        if let Some(existing) = state
            .listen_resources
            .iter()
            .find(|r| r.locator() == *locator)
        {
            existing.associate(id);
            return true;
        }

        let channel = match self.listen_transport.open(locator, is_multicast, is_fixed) {
            Ok(channel) => channel,
            Err(e) => {
                log::warn!("[participant] cannot listen on {}: {}", locator, e);
                failures.push(*locator, e.to_string());
                return false;
            }
        };

        let resolved = channel.locator();
        let resource = match ListenResource::spawn(
            channel,
            is_multicast,
            is_fixed,
            Arc::clone(&self.registry),
        ) {
            Ok(resource) => resource,
            Err(e) => {
                log::warn!("[participant] cannot start listen thread for {}: {}", resolved, e);
                failures.push(*locator, e.to_string());
                return false;
            }
        };
        if resolved != *locator {
            log::debug!("[participant] {} resolved to {}", locator, resolved);
            *locator = resolved;
        }
        resource.associate(id);
        state.listen_resources.push(resource);
        true
    }
}

fn associated_locators(state: &ParticipantState, id: EntityId) -> Vec<Locator> {
    state
        .listen_resources
        .iter()
        .filter(|r| r.is_associated(id))
        .map(ListenResource::locator)
        .collect()
}

/// Dissociate `id` from every resource not listed in `keep` and take out
/// the resources left empty. The caller drops them after unlocking.
pub(super) fn release_associations(
    state: &mut ParticipantState,
    id: EntityId,
    keep: &[Locator],
) -> Vec<ListenResource> {
    for resource in &state.listen_resources {
        if !keep.contains(&resource.locator()) {
            resource.dissociate(id);
        }
    }
    let (empty, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut state.listen_resources)
        .into_iter()
        .partition(ListenResource::is_empty);
    state.listen_resources = kept;
    for resource in &empty {
        log::debug!("[participant] releasing listen resource {}", resource.locator());
    }
    empty
}
