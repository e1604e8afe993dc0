// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Core building blocks: identifiers and serialization cursors.

pub mod ser;
pub mod types;
