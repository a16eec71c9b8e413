use {std::error::Error as StdError, thevoid_common::ChannelId, thiserror::Error};

#[derive(Debug, Error)]
pub enum Error {
    /// A void channel row already exists for this channel.
    #[error("channel {channel_id} is already a void channel")]
    AlreadyExists { channel_id: ChannelId },

    #[error("delete delay must be a finite, non-negative number of seconds (got {seconds})")]
    InvalidDelay { seconds: f64 },

    #[error("unknown event type: {name}")]
    UnknownEventType { name: String },

    /// The backing store could not be reached or rejected the query.
    #[error("config store unavailable: {source}")]
    Unavailable {
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

impl Error {
    #[must_use]
    pub fn already_exists(channel_id: ChannelId) -> Self {
        Self::AlreadyExists { channel_id }
    }

    #[must_use]
    pub fn unknown_event_type(name: impl Into<String>) -> Self {
        Self::UnknownEventType { name: name.into() }
    }

    #[must_use]
    pub fn unavailable(source: impl StdError + Send + Sync + 'static) -> Self {
        Self::Unavailable {
            source: Box::new(source),
        }
    }
}

impl From<sqlx::Error> for Error {
    fn from(source: sqlx::Error) -> Self {
        Self::unavailable(source)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
