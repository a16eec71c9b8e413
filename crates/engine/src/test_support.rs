//! Test doubles for the platform and the store.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::{
    collections::{HashMap, HashSet},
    sync::{
        Mutex,
        atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
    },
    time::Duration,
};

use {
    async_trait::async_trait,
    thevoid_channels::{
        Error as ChannelError, FailureReporter, InboundMessage, MessageDeleter, PlatformFailure,
        RelayDirectory, RelayIdentity, RelayedMessage, Result as ChannelResult,
    },
    thevoid_common::{CategoryId, ChannelId, MessageId, RelayId, ServerId, UserId},
    thevoid_store::{
        Error as StoreError, EventLogConfig, EventType, LogConfigStore, Result as StoreResult,
        UserOverride, VoidChannel, VoidChannelStore,
    },
};

#[derive(Debug, Clone, Copy)]
pub enum DeleteBehavior {
    NotFound,
    Denied,
    Broken,
}

/// In-memory platform recording every call made to it.
pub struct FakePlatform {
    relays: Mutex<HashMap<ChannelId, RelayIdentity>>,
    next_relay_id: AtomicU64,
    pub relays_created: AtomicUsize,
    pub deny_relay_creation: AtomicBool,
    pub deleted: Mutex<Vec<(ChannelId, MessageId)>>,
    delete_behavior: Mutex<HashMap<MessageId, DeleteBehavior>>,
    pub sent: Mutex<Vec<(RelayId, RelayedMessage)>>,
    history: Mutex<Vec<(ChannelId, MessageId)>>,
    pub deny_purge: AtomicBool,
}

impl Default for FakePlatform {
    fn default() -> Self {
        Self {
            relays: Mutex::new(HashMap::new()),
            next_relay_id: AtomicU64::new(1000),
            relays_created: AtomicUsize::new(0),
            deny_relay_creation: AtomicBool::new(false),
            deleted: Mutex::new(Vec::new()),
            delete_behavior: Mutex::new(HashMap::new()),
            sent: Mutex::new(Vec::new()),
            history: Mutex::new(Vec::new()),
            deny_purge: AtomicBool::new(false),
        }
    }
}

impl FakePlatform {
    pub fn seed_relay(&self, channel_id: ChannelId, id: u64) -> RelayIdentity {
        let relay = RelayIdentity {
            id: RelayId::new(id),
            channel_id,
            name: "void".into(),
        };
        self.relays
            .lock()
            .unwrap()
            .insert(channel_id, relay.clone());
        relay
    }

    pub fn fail_delete(&self, message_id: MessageId, behavior: DeleteBehavior) {
        self.delete_behavior
            .lock()
            .unwrap()
            .insert(message_id, behavior);
    }

    /// Messages the channel already holds, oldest first.
    pub fn seed_history(&self, channel_id: ChannelId, ids: impl IntoIterator<Item = u64>) {
        self.history
            .lock()
            .unwrap()
            .extend(ids.into_iter().map(|id| (channel_id, MessageId::new(id))));
    }

    pub fn deleted_ids(&self) -> Vec<u64> {
        self.deleted
            .lock()
            .unwrap()
            .iter()
            .map(|(_, m)| m.get())
            .collect()
    }
}

#[async_trait]
impl MessageDeleter for FakePlatform {
    async fn delete_message(&self, channel_id: ChannelId, message_id: MessageId) -> ChannelResult<()> {
        let behavior = self.delete_behavior.lock().unwrap().get(&message_id).copied();
        match behavior {
            None => {
                self.deleted.lock().unwrap().push((channel_id, message_id));
                Ok(())
            },
            Some(DeleteBehavior::NotFound) => Err(ChannelError::not_found("Unknown Message")),
            Some(DeleteBehavior::Denied) => {
                Err(ChannelError::permission_denied("Missing Permissions"))
            },
            Some(DeleteBehavior::Broken) => Err(ChannelError::external(
                "delete message",
                std::io::Error::other("connection reset"),
            )),
        }
    }

    async fn purge(
        &self,
        channel_id: ChannelId,
        before: Option<MessageId>,
        limit: u8,
    ) -> ChannelResult<usize> {
        if self.deny_purge.load(Ordering::SeqCst) {
            return Err(ChannelError::permission_denied("Missing Permissions"));
        }
        let mut history = self.history.lock().unwrap();
        let mut victims: Vec<_> = history
            .iter()
            .filter(|(c, m)| *c == channel_id && before.is_none_or(|b| m.get() < b.get()))
            .copied()
            .collect();
        victims.sort_by_key(|(_, m)| std::cmp::Reverse(m.get()));
        victims.truncate(usize::from(limit));
        history.retain(|entry| !victims.contains(entry));
        self.deleted.lock().unwrap().extend(victims.iter().copied());
        Ok(victims.len())
    }
}

#[async_trait]
impl RelayDirectory for FakePlatform {
    async fn find_relay(&self, channel_id: ChannelId) -> ChannelResult<Option<RelayIdentity>> {
        Ok(self.relays.lock().unwrap().get(&channel_id).cloned())
    }

    async fn create_relay(&self, channel_id: ChannelId, name: &str) -> ChannelResult<RelayIdentity> {
        // Widen the window in which concurrent callers could race.
        tokio::time::sleep(Duration::from_millis(20)).await;
        if self.deny_relay_creation.load(Ordering::SeqCst) {
            return Err(ChannelError::permission_denied("Manage Webhooks"));
        }
        self.relays_created.fetch_add(1, Ordering::SeqCst);
        let relay = RelayIdentity {
            id: RelayId::new(self.next_relay_id.fetch_add(1, Ordering::SeqCst)),
            channel_id,
            name: name.to_string(),
        };
        self.relays
            .lock()
            .unwrap()
            .insert(channel_id, relay.clone());
        Ok(relay)
    }

    async fn send_via_relay(&self, relay: &RelayIdentity, message: &RelayedMessage) -> ChannelResult<()> {
        self.sent.lock().unwrap().push((relay.id, message.clone()));
        Ok(())
    }
}

/// Reporter that keeps every failure it receives.
#[derive(Default)]
pub struct RecordingReporter {
    pub failures: Mutex<Vec<PlatformFailure>>,
}

#[async_trait]
impl FailureReporter for RecordingReporter {
    async fn report(&self, failure: &PlatformFailure) {
        self.failures.lock().unwrap().push(failure.clone());
    }
}

/// Store whose backend is always unreachable.
pub struct UnavailableStore;

fn down() -> StoreError {
    StoreError::unavailable(std::io::Error::other("database is locked"))
}

#[async_trait]
impl VoidChannelStore for UnavailableStore {
    async fn add_void_channel(&self, _channel: &VoidChannel) -> StoreResult<()> {
        Err(down())
    }

    async fn remove_void_channel(&self, _: ServerId, _: ChannelId) -> StoreResult<()> {
        Err(down())
    }

    async fn get_void_channel(&self, _: ChannelId) -> StoreResult<Option<VoidChannel>> {
        Err(down())
    }

    async fn list_void_channels(&self, _: ServerId) -> StoreResult<Vec<VoidChannel>> {
        Err(down())
    }

    async fn list_all_void_channels(&self) -> StoreResult<Vec<VoidChannel>> {
        Err(down())
    }

    async fn set_enabled(&self, _: ServerId, _: ChannelId, _: bool) -> StoreResult<()> {
        Err(down())
    }

    async fn set_delete_after(&self, _: ServerId, _: ChannelId, _: f64) -> StoreResult<()> {
        Err(down())
    }
}

#[async_trait]
impl LogConfigStore for UnavailableStore {
    async fn user_overrides(&self, _: ServerId) -> StoreResult<Vec<UserOverride>> {
        Err(down())
    }

    async fn ignored_channels(&self, _: ServerId) -> StoreResult<HashSet<ChannelId>> {
        Err(down())
    }

    async fn ignored_categories(&self, _: ServerId) -> StoreResult<HashSet<CategoryId>> {
        Err(down())
    }

    async fn event_log_configs(&self, _: ServerId) -> StoreResult<HashMap<EventType, EventLogConfig>> {
        Err(down())
    }

    async fn default_log_channel(&self, _: ServerId) -> StoreResult<Option<ChannelId>> {
        Err(down())
    }

    async fn set_user_override(&self, _: &UserOverride) -> StoreResult<()> {
        Err(down())
    }

    async fn remove_user_override(&self, _: ServerId, _: UserId) -> StoreResult<()> {
        Err(down())
    }

    async fn set_channel_ignored(&self, _: ServerId, _: ChannelId, _: bool) -> StoreResult<()> {
        Err(down())
    }

    async fn set_category_ignored(&self, _: ServerId, _: CategoryId, _: bool) -> StoreResult<()> {
        Err(down())
    }

    async fn set_event_log_config(&self, _: ServerId, _: EventType, _: EventLogConfig) -> StoreResult<()> {
        Err(down())
    }

    async fn set_default_log_channel(&self, _: ServerId, _: Option<ChannelId>) -> StoreResult<()> {
        Err(down())
    }
}

pub const BOT: UserId = UserId::new(1);
pub const SERVER: ServerId = ServerId::new(500);

/// A plain user message in `channel`.
pub fn user_message(channel: u64, message: u64) -> InboundMessage {
    InboundMessage {
        message_id: MessageId::new(message),
        channel_id: ChannelId::new(channel),
        server_id: Some(SERVER),
        author_id: UserId::new(77),
        relay_id: None,
        content_markers: Vec::new(),
    }
}

/// A message posted through relay `relay` in `channel`.
pub fn relay_message(channel: u64, message: u64, relay: u64) -> InboundMessage {
    InboundMessage {
        relay_id: Some(RelayId::new(relay)),
        author_id: UserId::new(relay),
        ..user_message(channel, message)
    }
}
