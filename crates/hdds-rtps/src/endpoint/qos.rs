// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Endpoint kinds, topic attributes and the QoS snapshot carried by each
//! endpoint. Policies are stored, not evaluated.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::core::types::{
    Locator, ENTITY_KIND_READER_NO_KEY, ENTITY_KIND_READER_WITH_KEY, ENTITY_KIND_WRITER_NO_KEY,
    ENTITY_KIND_WRITER_WITH_KEY,
};
use crate::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointKind {
    Reader,
    Writer,
}

impl EndpointKind {
    /// `'W'` selects writers, `'R'` readers; anything else is `None`.
    pub fn from_char(tag: char) -> Option<Self> {
        match tag {
            'W' => Some(EndpointKind::Writer),
            'R' => Some(EndpointKind::Reader),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            EndpointKind::Writer => 'W',
            EndpointKind::Reader => 'R',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateKind {
    Stateless,
    Stateful,
}

impl FromStr for StateKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "STATELESS" => Ok(StateKind::Stateless),
            "STATEFUL" => Ok(StateKind::Stateful),
            _ => Err(Error::UnsupportedStateKind(s.to_string())),
        }
    }
}

impl fmt::Display for StateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateKind::Stateless => write!(f, "STATELESS"),
            StateKind::Stateful => write!(f, "STATEFUL"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TopicKind {
    #[default]
    NoKey,
    WithKey,
}

impl TopicKind {
    pub fn writer_entity_kind(self) -> u8 {
        match self {
            TopicKind::NoKey => ENTITY_KIND_WRITER_NO_KEY,
            TopicKind::WithKey => ENTITY_KIND_WRITER_WITH_KEY,
        }
    }

    pub fn reader_entity_kind(self) -> u8 {
        match self {
            TopicKind::NoKey => ENTITY_KIND_READER_NO_KEY,
            TopicKind::WithKey => ENTITY_KIND_READER_WITH_KEY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TopicAttributes {
    pub topic_name: String,
    pub type_name: String,
    pub topic_kind: TopicKind,
}

impl TopicAttributes {
    pub fn new(topic_name: impl Into<String>, type_name: impl Into<String>, topic_kind: TopicKind) -> Self {
        Self {
            topic_name: topic_name.into(),
            type_name: type_name.into(),
            topic_kind,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Reliability {
    #[default]
    BestEffort,
    Reliable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Durability {
    #[default]
    Volatile,
    TransientLocal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum History {
    KeepLast(u32),
    KeepAll,
}

impl Default for History {
    fn default() -> Self {
        History::KeepLast(1)
    }
}

/// QoS snapshot taken at endpoint creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointQos {
    pub reliability: Reliability,
    pub durability: Durability,
    pub history: History,
    /// Period of the automatic HEARTBEAT of reliable stateful writers
    /// (zero disables it).
    pub heartbeat_period: Duration,
}

impl Default for EndpointQos {
    fn default() -> Self {
        Self {
            reliability: Reliability::BestEffort,
            durability: Durability::Volatile,
            history: History::default(),
            heartbeat_period: Duration::from_secs(3),
        }
    }
}

impl EndpointQos {
    pub fn reliable() -> Self {
        Self {
            reliability: Reliability::Reliable,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WriterAttributes {
    pub topic: TopicAttributes,
    pub qos: EndpointQos,
    pub unicast_locators: Vec<Locator>,
    pub multicast_locators: Vec<Locator>,
    /// Largest serialized sample expected, in bytes.
    pub payload_size: u32,
}

impl WriterAttributes {
    pub fn new(topic: TopicAttributes) -> Self {
        Self {
            topic,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReaderAttributes {
    pub topic: TopicAttributes,
    pub qos: EndpointQos,
    pub unicast_locators: Vec<Locator>,
    pub multicast_locators: Vec<Locator>,
    pub payload_size: u32,
}

impl ReaderAttributes {
    pub fn new(topic: TopicAttributes) -> Self {
        Self {
            topic,
            ..Self::default()
        }
    }
}
