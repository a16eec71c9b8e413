//! Delayed, fire-and-forget message deletion.

use std::{sync::Arc, time::Duration};

use {
    thevoid_channels::{Error as ChannelError, FailureKind, FailureReporter, MessageDeleter, PlatformFailure},
    thevoid_common::{ChannelId, MessageId},
    tokio::task::JoinHandle,
    tracing::{debug, info, warn},
};

/// How a scheduled deletion ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// The message was removed before the timer fired.
    AlreadyGone,
    PermissionDenied,
    Failed,
}

/// Spawns one independent timed task per deletion.
///
/// There is no cancellation: once scheduled, a deletion runs even if the
/// channel is disabled or removed in the meantime.
#[derive(Clone)]
pub struct DeleteScheduler {
    deleter: Arc<dyn MessageDeleter>,
    reporter: Arc<dyn FailureReporter>,
}

impl DeleteScheduler {
    pub fn new(deleter: Arc<dyn MessageDeleter>, reporter: Arc<dyn FailureReporter>) -> Self {
        Self { deleter, reporter }
    }

    pub fn deleter(&self) -> &Arc<dyn MessageDeleter> {
        &self.deleter
    }

    /// Delete `message_id` once `delay` has elapsed from now.
    ///
    /// Returns immediately. The handle resolves to the outcome; dropping it
    /// does not cancel the deletion.
    pub fn schedule(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
        delay: Duration,
    ) -> JoinHandle<DeleteOutcome> {
        let scheduler = self.clone();
        let delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        debug!(%channel_id, %message_id, delay_ms, "scheduling delete");
        tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            scheduler.delete_now(channel_id, message_id).await
        })
    }

    async fn delete_now(&self, channel_id: ChannelId, message_id: MessageId) -> DeleteOutcome {
        match self.deleter.delete_message(channel_id, message_id).await {
            Ok(()) => {
                debug!(%channel_id, %message_id, "deleted void message");
                DeleteOutcome::Deleted
            },
            Err(ChannelError::NotFound { .. }) => {
                debug!(%channel_id, %message_id, "message already gone");
                DeleteOutcome::AlreadyGone
            },
            Err(ChannelError::PermissionDenied { context }) => {
                info!(%channel_id, %message_id, %context, "missing permission to delete message");
                self.report(channel_id, message_id, FailureKind::PermissionDenied, context)
                    .await;
                DeleteOutcome::PermissionDenied
            },
            Err(e) => {
                warn!(%channel_id, %message_id, error = %e, "failed to delete message");
                self.report(channel_id, message_id, FailureKind::Other, e.to_string())
                    .await;
                DeleteOutcome::Failed
            },
        }
    }

    async fn report(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
        kind: FailureKind,
        detail: String,
    ) {
        self.reporter
            .report(&PlatformFailure {
                operation: "delete_message",
                kind,
                channel_id,
                message_id: Some(message_id),
                detail,
            })
            .await;
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::test_support::{DeleteBehavior, FakePlatform, RecordingReporter},
        tokio::time::Instant,
    };

    fn scheduler() -> (DeleteScheduler, Arc<FakePlatform>, Arc<RecordingReporter>) {
        let platform = Arc::new(FakePlatform::default());
        let reporter = Arc::new(RecordingReporter::default());
        (
            DeleteScheduler::new(platform.clone(), reporter.clone()),
            platform,
            reporter,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn deletes_after_delay() {
        let (scheduler, platform, _) = scheduler();
        let start = Instant::now();

        let handle = scheduler.schedule(ChannelId::new(10), MessageId::new(1), Duration::from_secs(5));
        assert!(platform.deleted_ids().is_empty());

        assert_eq!(handle.await.unwrap(), DeleteOutcome::Deleted);
        assert!(start.elapsed() >= Duration::from_secs(5));
        assert_eq!(platform.deleted_ids(), vec![1]);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_delay_deletes_without_waiting() {
        let (scheduler, platform, _) = scheduler();
        let start = Instant::now();

        let outcome = scheduler
            .schedule(ChannelId::new(10), MessageId::new(1), Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(outcome, DeleteOutcome::Deleted);
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(platform.deleted_ids(), vec![1]);
    }

    #[tokio::test(start_paused = true)]
    async fn deletions_are_independent() {
        let (scheduler, platform, _) = scheduler();
        let channel = ChannelId::new(10);

        let slow = scheduler.schedule(channel, MessageId::new(1), Duration::from_secs(10));
        let fast = scheduler.schedule(channel, MessageId::new(2), Duration::from_secs(1));

        fast.await.unwrap();
        assert_eq!(platform.deleted_ids(), vec![2]);
        slow.await.unwrap();
        assert_eq!(platform.deleted_ids(), vec![2, 1]);
    }

    #[tokio::test(start_paused = true)]
    async fn saturated_delay_keeps_waiting() {
        let (scheduler, platform, _) = scheduler();

        let handle = scheduler.schedule(ChannelId::new(10), MessageId::new(1), Duration::MAX);
        tokio::time::sleep(Duration::from_secs(365 * 24 * 3600)).await;
        assert!(!handle.is_finished());
        assert!(platform.deleted_ids().is_empty());
        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn not_found_is_absorbed() {
        let (scheduler, platform, reporter) = scheduler();
        platform.fail_delete(MessageId::new(1), DeleteBehavior::NotFound);

        let outcome = scheduler
            .schedule(ChannelId::new(10), MessageId::new(1), Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(outcome, DeleteOutcome::AlreadyGone);
        assert!(reporter.failures.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn permission_denied_is_reported_once() {
        let (scheduler, platform, reporter) = scheduler();
        platform.fail_delete(MessageId::new(1), DeleteBehavior::Denied);

        let outcome = scheduler
            .schedule(ChannelId::new(10), MessageId::new(1), Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(outcome, DeleteOutcome::PermissionDenied);

        let failures = reporter.failures.lock().unwrap();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].kind, FailureKind::PermissionDenied);
        assert_eq!(failures[0].message_id, Some(MessageId::new(1)));
    }

    #[tokio::test(start_paused = true)]
    async fn failure_does_not_affect_other_deletions() {
        let (scheduler, platform, reporter) = scheduler();
        platform.fail_delete(MessageId::new(1), DeleteBehavior::Broken);
        let channel = ChannelId::new(10);

        let broken = scheduler.schedule(channel, MessageId::new(1), Duration::from_secs(1));
        let fine = scheduler.schedule(channel, MessageId::new(2), Duration::from_secs(2));

        assert_eq!(broken.await.unwrap(), DeleteOutcome::Failed);
        assert_eq!(fine.await.unwrap(), DeleteOutcome::Deleted);
        assert_eq!(reporter.failures.lock().unwrap()[0].kind, FailureKind::Other);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_handle_does_not_cancel() {
        let (scheduler, platform, _) = scheduler();
        drop(scheduler.schedule(ChannelId::new(10), MessageId::new(1), Duration::from_secs(3)));

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert_eq!(platform.deleted_ids(), vec![1]);
    }
}
