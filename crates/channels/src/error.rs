use std::error::Error as StdError;

/// Crate-wide result type for platform operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Typed platform errors shared across channel traits.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The target (message, channel, relay) no longer exists.
    #[error("not found: {context}")]
    NotFound { context: String },

    /// The platform refused the action for lack of rights.
    #[error("permission denied: {context}")]
    PermissionDenied { context: String },

    /// Input payload or parameter is invalid.
    #[error("invalid channel input: {message}")]
    InvalidInput { message: String },

    /// Wrapped source error from the platform client.
    #[error("channel operation failed: {context}: {source}")]
    External {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl Error {
    #[must_use]
    pub fn not_found(context: impl std::fmt::Display) -> Self {
        Self::NotFound {
            context: context.to_string(),
        }
    }

    #[must_use]
    pub fn permission_denied(context: impl std::fmt::Display) -> Self {
        Self::PermissionDenied {
            context: context.to_string(),
        }
    }

    #[must_use]
    pub fn invalid_input(message: impl std::fmt::Display) -> Self {
        Self::InvalidInput {
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn external(
        context: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::External {
            context: context.into(),
            source: Box::new(source),
        }
    }
}
