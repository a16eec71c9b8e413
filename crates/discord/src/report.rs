use std::{num::NonZeroU64, sync::Arc};

use {
    async_trait::async_trait,
    serenity::all::{ChannelId as DiscordChannelId, Http},
    thevoid_channels::{FailureKind, FailureReporter, PlatformFailure},
    thevoid_common::ChannelId,
    tracing::warn,
};

use crate::markdown::truncate;

/// Discord's message length limit.
const MAX_MESSAGE_LEN: usize = 2000;

/// Posts platform failures to an error-log channel.
///
/// Every failure is also logged, so a broken log channel loses nothing.
pub struct ErrorChannelReporter {
    http: Arc<Http>,
    channel_id: ChannelId,
}

impl ErrorChannelReporter {
    pub fn new(http: Arc<Http>, channel_id: ChannelId) -> Self {
        Self { http, channel_id }
    }
}

pub(crate) fn render(failure: &PlatformFailure) -> String {
    let hint = match failure.kind {
        FailureKind::PermissionDenied => "\nCheck that `void` has the **Manage Messages** permission.",
        FailureKind::Other => "",
    };
    truncate(&format!("\u{26a0} {failure}{hint}"), MAX_MESSAGE_LEN)
}

#[async_trait]
impl FailureReporter for ErrorChannelReporter {
    async fn report(&self, failure: &PlatformFailure) {
        warn!(
            operation = failure.operation,
            channel_id = %failure.channel_id,
            kind = ?failure.kind,
            detail = %failure.detail,
            "platform failure"
        );

        let Some(id) = NonZeroU64::new(self.channel_id.get()) else {
            return;
        };
        if let Err(e) = DiscordChannelId::from(id)
            .say(&self.http, render(failure))
            .await
        {
            warn!(log_channel = %self.channel_id, error = %e, "failed to post to error log channel");
        }
    }
}
