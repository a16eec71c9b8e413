use {thevoid_common::ChannelId, thiserror::Error};

/// Typed outcomes for void operations.
///
/// `NotFound` on the deletion path never reaches this type: the scheduler
/// absorbs it. It only surfaces from explicit platform calls such as proxying.
#[derive(Debug, Error)]
pub enum Error {
    #[error("channel {channel_id} is already a void channel")]
    AlreadyExists { channel_id: ChannelId },

    /// A mutation targeted a channel with no void configuration.
    #[error("channel {channel_id} has not been configured as a void channel")]
    NotConfigured { channel_id: ChannelId },

    #[error("delete delay must be a finite, non-negative number of seconds (got {seconds})")]
    InvalidDelay { seconds: f64 },

    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    #[error("permission denied: {context}")]
    PermissionDenied { context: String },

    #[error("not found: {context}")]
    NotFound { context: String },

    /// The store could not answer; callers must not guess.
    #[error("{source}")]
    StoreUnavailable {
        #[source]
        source: thevoid_store::Error,
    },

    #[error(transparent)]
    Platform(thevoid_channels::Error),
}

impl Error {
    #[must_use]
    pub fn not_configured(channel_id: ChannelId) -> Self {
        Self::NotConfigured { channel_id }
    }
}

impl From<thevoid_store::Error> for Error {
    fn from(err: thevoid_store::Error) -> Self {
        use thevoid_store::Error as StoreError;
        match err {
            StoreError::AlreadyExists { channel_id } => Self::AlreadyExists { channel_id },
            StoreError::InvalidDelay { seconds } => Self::InvalidDelay { seconds },
            StoreError::UnknownEventType { name } => Self::InvalidInput {
                message: format!("unknown event type: {name}"),
            },
            source @ (StoreError::Unavailable { .. } | StoreError::Migrate(_)) => {
                Self::StoreUnavailable { source }
            },
        }
    }
}

impl From<thevoid_channels::Error> for Error {
    fn from(err: thevoid_channels::Error) -> Self {
        use thevoid_channels::Error as ChannelError;
        match err {
            ChannelError::PermissionDenied { context } => Self::PermissionDenied { context },
            ChannelError::NotFound { context } => Self::NotFound { context },
            other => Self::Platform(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
