// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Participant background machinery: event thread and resource semaphore.

pub mod events;
pub mod semaphore;

pub use events::{EventHandle, EventId, EventScheduler};
pub use semaphore::ResourceSemaphore;
