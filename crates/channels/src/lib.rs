//! Contracts between the void engine and the chat platform.
//!
//! A platform adapter (Discord) feeds [`InboundMessage`]s in and implements
//! [`MessageDeleter`] and [`RelayDirectory`] so the engine can act on them
//! without knowing which client library sits underneath.

pub mod error;
pub mod message;
pub mod platform;
pub mod report;

pub use {
    error::{Error, Result},
    message::{InboundMessage, RelayIdentity, RelayedMessage},
    platform::{MessageDeleter, RelayDirectory},
    report::{FailureKind, FailureReporter, PlatformFailure, TracingReporter},
};
