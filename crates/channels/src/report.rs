//! Reporting of platform failures that need an administrator's attention.

use {
    async_trait::async_trait,
    thevoid_common::{ChannelId, MessageId},
    tracing::warn,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The bot lacks a permission; retrying will not help.
    PermissionDenied,
    Other,
}

/// A failed platform action, handed to a [`FailureReporter`].
#[derive(Debug, Clone)]
pub struct PlatformFailure {
    /// Short operation name, e.g. `"delete_message"`.
    pub operation: &'static str,
    pub kind: FailureKind,
    pub channel_id: ChannelId,
    pub message_id: Option<MessageId>,
    pub detail: String,
}

impl std::fmt::Display for PlatformFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.kind {
            FailureKind::PermissionDenied => "permission denied",
            FailureKind::Other => "failed",
        };
        write!(f, "{} {kind} in channel {}", self.operation, self.channel_id)?;
        if let Some(message_id) = self.message_id {
            write!(f, " (message {message_id})")?;
        }
        write!(f, ": {}", self.detail)
    }
}

/// Observability collaborator for failures that are not retried.
#[async_trait]
pub trait FailureReporter: Send + Sync {
    async fn report(&self, failure: &PlatformFailure);
}

/// Reporter that only writes a log line.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

#[async_trait]
impl FailureReporter for TracingReporter {
    async fn report(&self, failure: &PlatformFailure) {
        warn!(
            operation = failure.operation,
            channel_id = %failure.channel_id,
            kind = ?failure.kind,
            detail = %failure.detail,
            "platform failure"
        );
    }
}
