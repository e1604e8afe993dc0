// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Identifier value types shared by the codec, endpoints and participant.

pub mod descriptor;
pub mod guid;
pub mod locator;
pub mod sequence;

pub use descriptor::TypeDescriptor;
pub use guid::{
    EntityId, Guid, GuidPrefix, ENTITY_KIND_READER_NO_KEY, ENTITY_KIND_READER_WITH_KEY,
    ENTITY_KIND_WRITER_NO_KEY, ENTITY_KIND_WRITER_WITH_KEY,
};
pub use locator::{Locator, LocatorKind};
pub use sequence::{SequenceNumber, SequenceNumberSet, SN_SET_MAX_BITS};
