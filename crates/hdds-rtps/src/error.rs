// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Crate-wide error type.

use crate::core::types::{EntityId, Guid, Locator};
use crate::endpoint::StateKind;

/// Errors returned by the participant, endpoints and wire codec.
///
/// # Example
///
/// ```rust,no_run
/// use hdds_rtps::{Error, Participant};
///
/// match Participant::builder("demo").build() {
///     Err(Error::ListenResourceBindFailure { locator, reason }) => {
///         println!("cannot listen on {}: {}", locator, reason)
///     }
///     Err(e) => println!("Other error: {}", e),
///     Ok(_) => println!("Success"),
/// }
/// ```
#[derive(Debug)]
pub enum Error {
    // ========================================================================
    // Entity Errors
    // ========================================================================
    /// Requested state kind is neither stateless nor stateful.
    UnsupportedStateKind(String),
    /// A listen resource could not be bound for a locator.
    ListenResourceBindFailure { locator: Locator, reason: String },
    /// Endpoint not present in the selected collection.
    EndpointNotFound(Guid),
    /// The 24-bit entity counter has no values left.
    EntityIdExhausted,
    /// Explicit entity id already used on this participant.
    DuplicateEntityId(EntityId),
    /// Operation on an endpoint that was already deleted.
    EndpointClosed(Guid),
    /// Writer operation on a reader or the reverse.
    WrongEndpointKind { guid: Guid, expected: char },
    /// Operation that only the other state kind supports (e.g. reader
    /// locators on a stateful writer).
    WrongStateKind { guid: Guid, expected: StateKind },

    // ========================================================================
    // Codec Errors
    // ========================================================================
    /// Declared submessage length disagrees with bytes consumed.
    SubmessageDecodeLengthMismatch {
        kind: u8,
        declared: usize,
        consumed: usize,
    },
    /// A field failed to serialize (e.g. buffer capacity exceeded).
    SubmessageEncodeFailure(String),
    /// RTPS message header missing or malformed.
    InvalidHeader(String),
    /// Truncated or malformed submessage body.
    DecodeFailed(String),
    /// SequenceNumberSet invariant violated.
    InvalidSequenceNumberSet(String),

    // ========================================================================
    // Other
    // ========================================================================
    /// Invalid configuration value or file.
    Config(String),
    /// I/O error with underlying cause.
    Io(std::io::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::UnsupportedStateKind(kind) => write!(f, "Unsupported state kind: {}", kind),
            Error::ListenResourceBindFailure { locator, reason } => {
                write!(f, "Listen resource bind failed for {}: {}", locator, reason)
            }
            Error::EndpointNotFound(guid) => write!(f, "Endpoint not found: {}", guid),
            Error::EntityIdExhausted => write!(f, "Entity id counter exhausted"),
            Error::DuplicateEntityId(id) => write!(f, "Entity id already in use: {}", id),
            Error::EndpointClosed(guid) => write!(f, "Endpoint closed: {}", guid),
            Error::WrongEndpointKind { guid, expected } => {
                write!(f, "Endpoint {} is not of kind '{}'", guid, expected)
            }
            Error::WrongStateKind { guid, expected } => {
                write!(f, "Endpoint {} is not {}", guid, expected)
            }
            Error::SubmessageDecodeLengthMismatch {
                kind,
                declared,
                consumed,
            } => write!(
                f,
                "Submessage 0x{:02x} declared {} bytes but {} were consumed",
                kind, declared, consumed
            ),
            Error::SubmessageEncodeFailure(msg) => write!(f, "Submessage encode failed: {}", msg),
            Error::InvalidHeader(msg) => write!(f, "Invalid RTPS header: {}", msg),
            Error::DecodeFailed(msg) => write!(f, "Decode failed: {}", msg),
            Error::InvalidSequenceNumberSet(msg) => {
                write!(f, "Invalid sequence number set: {}", msg)
            }
            Error::Config(msg) => write!(f, "Configuration error: {}", msg),
            Error::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

/// Convenient alias for API results using the crate `Error` type.
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_length_mismatch() {
        let err = Error::SubmessageDecodeLengthMismatch {
            kind: 0x07,
            declared: 32,
            consumed: 28,
        };
        assert_eq!(
            err.to_string(),
            "Submessage 0x07 declared 32 bytes but 28 were consumed"
        );
    }

    #[test]
    fn test_io_source_is_kept() {
        use std::error::Error as _;
        let err = Error::from(std::io::Error::new(
            std::io::ErrorKind::AddrInUse,
            "port taken",
        ));
        assert!(err.source().is_some());
        assert!(Error::EntityIdExhausted.source().is_none());
    }
}
