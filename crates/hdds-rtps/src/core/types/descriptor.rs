// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Data type descriptor handed to endpoints at creation.
//!
//! The engine never serializes user samples; it only needs the name, an id
//! for quick comparison and the serialized size hints.

/// Type descriptor: metadata about the data type an endpoint carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescriptor {
    pub type_id: u32,          // FNV-1a hash of type_name
    pub type_name: String,     // e.g., "Point"
    pub size_bytes: u32,       // serialized size (if fixed)
    pub is_variable_size: bool, // true if contains sequence/string
    pub has_key: bool,
}

impl TypeDescriptor {
    pub fn new(type_name: impl Into<String>, size_bytes: u32, is_variable_size: bool) -> Self {
        let type_name = type_name.into();
        Self {
            type_id: fnv1a(type_name.as_bytes()),
            type_name,
            size_bytes,
            is_variable_size,
            has_key: false,
        }
    }

    pub fn keyed(mut self) -> Self {
        self.has_key = true;
        self
    }
}

fn fnv1a(bytes: &[u8]) -> u32 {
    let mut hash: u32 = 0x811c_9dc5;
    for b in bytes {
        hash ^= u32::from(*b);
        hash = hash.wrapping_mul(0x0100_0193);
    }
    hash
}
