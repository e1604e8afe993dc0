// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Default liveliness collaborator: tracks the participant's user writers.

use std::sync::Arc;

use parking_lot::Mutex;

use super::collaborators::LivelinessProtocol;
use crate::core::types::Guid;
use crate::endpoint::Endpoint;

/// Keeps the set of local writers whose liveliness the participant asserts.
///
/// Assertion timing is left to the owner; this type only tracks membership.
#[derive(Debug, Default)]
pub struct WriterLiveliness {
    writers: Mutex<Vec<Guid>>,
}

impl WriterLiveliness {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn local_writers(&self) -> Vec<Guid> {
        self.writers.lock().clone()
    }

    pub fn contains(&self, writer: &Guid) -> bool {
        self.writers.lock().contains(writer)
    }

    pub fn len(&self) -> usize {
        self.writers.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.writers.lock().is_empty()
    }
}

impl LivelinessProtocol for WriterLiveliness {
    fn add_local_writer(&self, writer: &Arc<Endpoint>) {
        let guid = writer.guid();
        let mut writers = self.writers.lock();
        if !writers.contains(&guid) {
            writers.push(guid);
            log::trace!("[liveliness] tracking writer {}", guid);
        }
    }

    fn remove_local_writer(&self, writer: &Arc<Endpoint>) {
        let guid = writer.guid();
        self.writers.lock().retain(|g| *g != guid);
        log::trace!("[liveliness] released writer {}", guid);
    }
}
