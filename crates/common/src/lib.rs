//! Shared types used across all thevoid crates.

pub mod types;

pub use types::{CategoryId, ChannelId, MessageId, ParseIdError, RelayId, ServerId, UserId};
