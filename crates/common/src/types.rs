//! Platform-assigned 64-bit identifiers.
//!
//! Each id kind gets its own newtype so a channel id can never be passed
//! where a server id is expected. All of them serialize as plain integers.

use std::{fmt, num::ParseIntError, str::FromStr};

use serde::{Deserialize, Serialize};

/// Failed to parse an identifier from text.
#[derive(Debug, thiserror::Error)]
#[error("invalid {kind} id {input:?}: {source}")]
pub struct ParseIdError {
    pub kind: &'static str,
    pub input: String,
    #[source]
    pub source: ParseIntError,
}

macro_rules! snowflake_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            #[must_use]
            pub const fn new(id: u64) -> Self {
                Self(id)
            }

            #[must_use]
            pub const fn get(self) -> u64 {
                self.0
            }

            /// SQLite stores integers as signed 64-bit values. The cast is a
            /// bit-for-bit reinterpretation, so it round-trips every id.
            #[must_use]
            pub const fn to_db(self) -> i64 {
                self.0 as i64
            }

            #[must_use]
            pub const fn from_db(value: i64) -> Self {
                Self(value as u64)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim()
                    .parse::<u64>()
                    .map(Self)
                    .map_err(|source| ParseIdError {
                        kind: $kind,
                        input: s.to_string(),
                        source,
                    })
            }
        }
    };
}

snowflake_id!(
    /// A server (Discord guild).
    ServerId,
    "server"
);
snowflake_id!(
    /// A text channel.
    ChannelId,
    "channel"
);
snowflake_id!(
    /// A channel category grouping several channels.
    CategoryId,
    "category"
);
snowflake_id!(UserId, "user");
snowflake_id!(MessageId, "message");
snowflake_id!(
    /// Handle of a relay identity (a Discord webhook).
    RelayId,
    "relay"
);
