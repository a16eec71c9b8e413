//! SQLite-backed store using sqlx.

use std::{
    collections::{HashMap, HashSet},
    future::Future,
    time::Instant,
};

use {
    async_trait::async_trait,
    sqlx::{SqlitePool, sqlite::SqlitePoolOptions},
    thevoid_common::{CategoryId, ChannelId, ServerId, UserId},
    tracing::{debug, warn},
};

use crate::{
    Error, Result,
    store::{LogConfigStore, VoidChannelStore},
    types::{EventLogConfig, EventType, UserOverride, VoidChannel, validate_delay},
};

/// Internal row type for sqlx mapping.
#[derive(sqlx::FromRow)]
struct VoidChannelRow {
    server_id: i64,
    channel_id: i64,
    enabled: bool,
    delete_after: f64,
}

impl From<VoidChannelRow> for VoidChannel {
    fn from(r: VoidChannelRow) -> Self {
        Self {
            server_id: ServerId::from_db(r.server_id),
            channel_id: ChannelId::from_db(r.channel_id),
            enabled: r.enabled,
            delete_after: r.delete_after,
        }
    }
}

#[derive(sqlx::FromRow)]
struct UserOverrideRow {
    server_id: i64,
    user_id: i64,
    log_channel_id: Option<i64>,
}

impl From<UserOverrideRow> for UserOverride {
    fn from(r: UserOverrideRow) -> Self {
        Self {
            server_id: ServerId::from_db(r.server_id),
            user_id: UserId::from_db(r.user_id),
            log_channel_id: r.log_channel_id.map(ChannelId::from_db),
        }
    }
}

#[derive(sqlx::FromRow)]
struct EventLogConfigRow {
    event_type: String,
    enabled: bool,
    log_channel_id: Option<i64>,
}

/// Run a query, logging its name and duration at debug level.
async fn timed<T>(
    query: &'static str,
    fut: impl Future<Output = std::result::Result<T, sqlx::Error>>,
) -> std::result::Result<T, sqlx::Error> {
    let started = Instant::now();
    let result = fut.await;
    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
    match &result {
        Ok(_) => debug!(query, elapsed_ms, "db query"),
        Err(e) => warn!(query, elapsed_ms, error = %e, "db query failed"),
    }
    result
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

const TABLES: &[&str] = &[
    "void_channels",
    "server_log_settings",
    "user_overrides",
    "ignored_channels",
    "ignored_categories",
    "event_log_configs",
];

/// SQLite-backed persistence for void channels and log overrides.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Connect with a new pool and run migrations.
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect(database_url)
            .await?;

        crate::run_migrations(&pool).await?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Delete every row but keep the schema. Returns the number of rows removed.
    pub async fn clear_all(&self) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        let mut removed = 0;
        for table in TABLES {
            let done = sqlx::query(&format!("DELETE FROM {table}"))
                .execute(&mut *tx)
                .await?;
            debug!(table, rows = done.rows_affected(), "cleared table");
            removed += done.rows_affected();
        }
        tx.commit().await?;
        Ok(removed)
    }
}

#[async_trait]
impl VoidChannelStore for SqliteStore {
    async fn add_void_channel(&self, channel: &VoidChannel) -> Result<()> {
        let delete_after = validate_delay(channel.delete_after)?;
        timed(
            "add_void_channel",
            sqlx::query(
                "INSERT INTO void_channels (server_id, channel_id, enabled, delete_after)
                 VALUES (?, ?, ?, ?)",
            )
            .bind(channel.server_id.to_db())
            .bind(channel.channel_id.to_db())
            .bind(channel.enabled)
            .bind(delete_after)
            .execute(&self.pool),
        )
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                Error::already_exists(channel.channel_id)
            } else {
                e.into()
            }
        })?;
        Ok(())
    }

    async fn remove_void_channel(&self, server_id: ServerId, channel_id: ChannelId) -> Result<()> {
        timed(
            "remove_void_channel",
            sqlx::query("DELETE FROM void_channels WHERE server_id = ? AND channel_id = ?")
                .bind(server_id.to_db())
                .bind(channel_id.to_db())
                .execute(&self.pool),
        )
        .await?;
        Ok(())
    }

    async fn get_void_channel(&self, channel_id: ChannelId) -> Result<Option<VoidChannel>> {
        let row = timed(
            "get_void_channel",
            sqlx::query_as::<_, VoidChannelRow>(
                "SELECT server_id, channel_id, enabled, delete_after
                 FROM void_channels WHERE channel_id = ?",
            )
            .bind(channel_id.to_db())
            .fetch_optional(&self.pool),
        )
        .await?;
        Ok(row.map(Into::into))
    }

    async fn list_void_channels(&self, server_id: ServerId) -> Result<Vec<VoidChannel>> {
        // rowid grows monotonically for new rows, which gives insertion order.
        let rows = timed(
            "list_void_channels",
            sqlx::query_as::<_, VoidChannelRow>(
                "SELECT server_id, channel_id, enabled, delete_after
                 FROM void_channels WHERE server_id = ? ORDER BY rowid",
            )
            .bind(server_id.to_db())
            .fetch_all(&self.pool),
        )
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn list_all_void_channels(&self) -> Result<Vec<VoidChannel>> {
        let rows = timed(
            "list_all_void_channels",
            sqlx::query_as::<_, VoidChannelRow>(
                "SELECT server_id, channel_id, enabled, delete_after
                 FROM void_channels ORDER BY rowid",
            )
            .fetch_all(&self.pool),
        )
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn set_enabled(
        &self,
        server_id: ServerId,
        channel_id: ChannelId,
        enabled: bool,
    ) -> Result<()> {
        timed(
            "set_enabled",
            sqlx::query("UPDATE void_channels SET enabled = ? WHERE server_id = ? AND channel_id = ?")
                .bind(enabled)
                .bind(server_id.to_db())
                .bind(channel_id.to_db())
                .execute(&self.pool),
        )
        .await?;
        Ok(())
    }

    async fn set_delete_after(
        &self,
        server_id: ServerId,
        channel_id: ChannelId,
        seconds: f64,
    ) -> Result<()> {
        let seconds = validate_delay(seconds)?;
        timed(
            "set_delete_after",
            sqlx::query(
                "UPDATE void_channels SET delete_after = ? WHERE server_id = ? AND channel_id = ?",
            )
            .bind(seconds)
            .bind(server_id.to_db())
            .bind(channel_id.to_db())
            .execute(&self.pool),
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl LogConfigStore for SqliteStore {
    async fn user_overrides(&self, server_id: ServerId) -> Result<Vec<UserOverride>> {
        let rows = timed(
            "user_overrides",
            sqlx::query_as::<_, UserOverrideRow>(
                "SELECT server_id, user_id, log_channel_id FROM user_overrides WHERE server_id = ?",
            )
            .bind(server_id.to_db())
            .fetch_all(&self.pool),
        )
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn ignored_channels(&self, server_id: ServerId) -> Result<HashSet<ChannelId>> {
        let ids: Vec<i64> = timed(
            "ignored_channels",
            sqlx::query_scalar("SELECT channel_id FROM ignored_channels WHERE server_id = ?")
                .bind(server_id.to_db())
                .fetch_all(&self.pool),
        )
        .await?;
        Ok(ids.into_iter().map(ChannelId::from_db).collect())
    }

    async fn ignored_categories(&self, server_id: ServerId) -> Result<HashSet<CategoryId>> {
        let ids: Vec<i64> = timed(
            "ignored_categories",
            sqlx::query_scalar("SELECT category_id FROM ignored_categories WHERE server_id = ?")
                .bind(server_id.to_db())
                .fetch_all(&self.pool),
        )
        .await?;
        Ok(ids.into_iter().map(CategoryId::from_db).collect())
    }

    async fn event_log_configs(
        &self,
        server_id: ServerId,
    ) -> Result<HashMap<EventType, EventLogConfig>> {
        let rows = timed(
            "event_log_configs",
            sqlx::query_as::<_, EventLogConfigRow>(
                "SELECT event_type, enabled, log_channel_id
                 FROM event_log_configs WHERE server_id = ?",
            )
            .bind(server_id.to_db())
            .fetch_all(&self.pool),
        )
        .await?;

        let mut configs = HashMap::with_capacity(rows.len());
        for row in rows {
            match row.event_type.parse::<EventType>() {
                Ok(event) => {
                    configs.insert(event, EventLogConfig {
                        enabled: row.enabled,
                        log_channel_id: row.log_channel_id.map(ChannelId::from_db),
                    });
                },
                Err(e) => warn!(%server_id, error = %e, "skipping stored event log config"),
            }
        }
        Ok(configs)
    }

    async fn default_log_channel(&self, server_id: ServerId) -> Result<Option<ChannelId>> {
        let id: Option<Option<i64>> = timed(
            "default_log_channel",
            sqlx::query_scalar("SELECT log_channel_id FROM server_log_settings WHERE server_id = ?")
                .bind(server_id.to_db())
                .fetch_optional(&self.pool),
        )
        .await?;
        Ok(id.flatten().map(ChannelId::from_db))
    }

    async fn set_user_override(&self, user_override: &UserOverride) -> Result<()> {
        timed(
            "set_user_override",
            sqlx::query(
                "INSERT INTO user_overrides (server_id, user_id, log_channel_id)
                 VALUES (?, ?, ?)
                 ON CONFLICT(server_id, user_id) DO UPDATE SET
                   log_channel_id = excluded.log_channel_id",
            )
            .bind(user_override.server_id.to_db())
            .bind(user_override.user_id.to_db())
            .bind(user_override.log_channel_id.map(ChannelId::to_db))
            .execute(&self.pool),
        )
        .await?;
        Ok(())
    }

    async fn remove_user_override(&self, server_id: ServerId, user_id: UserId) -> Result<()> {
        timed(
            "remove_user_override",
            sqlx::query("DELETE FROM user_overrides WHERE server_id = ? AND user_id = ?")
                .bind(server_id.to_db())
                .bind(user_id.to_db())
                .execute(&self.pool),
        )
        .await?;
        Ok(())
    }

    async fn set_channel_ignored(
        &self,
        server_id: ServerId,
        channel_id: ChannelId,
        ignored: bool,
    ) -> Result<()> {
        let sql = if ignored {
            "INSERT OR IGNORE INTO ignored_channels (server_id, channel_id) VALUES (?, ?)"
        } else {
            "DELETE FROM ignored_channels WHERE server_id = ? AND channel_id = ?"
        };
        timed(
            "set_channel_ignored",
            sqlx::query(sql)
                .bind(server_id.to_db())
                .bind(channel_id.to_db())
                .execute(&self.pool),
        )
        .await?;
        Ok(())
    }

    async fn set_category_ignored(
        &self,
        server_id: ServerId,
        category_id: CategoryId,
        ignored: bool,
    ) -> Result<()> {
        let sql = if ignored {
            "INSERT OR IGNORE INTO ignored_categories (server_id, category_id) VALUES (?, ?)"
        } else {
            "DELETE FROM ignored_categories WHERE server_id = ? AND category_id = ?"
        };
        timed(
            "set_category_ignored",
            sqlx::query(sql)
                .bind(server_id.to_db())
                .bind(category_id.to_db())
                .execute(&self.pool),
        )
        .await?;
        Ok(())
    }

    async fn set_event_log_config(
        &self,
        server_id: ServerId,
        event: EventType,
        config: EventLogConfig,
    ) -> Result<()> {
        timed(
            "set_event_log_config",
            sqlx::query(
                "INSERT INTO event_log_configs (server_id, event_type, enabled, log_channel_id)
                 VALUES (?, ?, ?, ?)
                 ON CONFLICT(server_id, event_type) DO UPDATE SET
                   enabled = excluded.enabled,
                   log_channel_id = excluded.log_channel_id",
            )
            .bind(server_id.to_db())
            .bind(event.as_str())
            .bind(config.enabled)
            .bind(config.log_channel_id.map(ChannelId::to_db))
            .execute(&self.pool),
        )
        .await?;
        Ok(())
    }

    async fn set_default_log_channel(
        &self,
        server_id: ServerId,
        channel_id: Option<ChannelId>,
    ) -> Result<()> {
        timed(
            "set_default_log_channel",
            sqlx::query(
                "INSERT INTO server_log_settings (server_id, log_channel_id) VALUES (?, ?)
                 ON CONFLICT(server_id) DO UPDATE SET log_channel_id = excluded.log_channel_id",
            )
            .bind(server_id.to_db())
            .bind(channel_id.map(ChannelId::to_db))
            .execute(&self.pool),
        )
        .await?;
        Ok(())
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    async fn make_store() -> SqliteStore {
        SqliteStore::new("sqlite::memory:", 1).await.unwrap()
    }

    fn sid(id: u64) -> ServerId {
        ServerId::new(id)
    }

    fn cid(id: u64) -> ChannelId {
        ChannelId::new(id)
    }

    #[tokio::test]
    async fn test_add_and_get() {
        let store = make_store().await;
        store
            .add_void_channel(&VoidChannel::new(sid(1), cid(10), 5.0))
            .await
            .unwrap();

        let got = store.get_void_channel(cid(10)).await.unwrap().unwrap();
        assert_eq!(got.server_id, sid(1));
        assert!(got.enabled);
        assert_eq!(got.delete_after, 5.0);
    }

    #[tokio::test]
    async fn test_set_delete_after_round_trip() {
        let store = make_store().await;
        store
            .add_void_channel(&VoidChannel::new(sid(1), cid(10), 5.0))
            .await
            .unwrap();
        store.set_delete_after(sid(1), cid(10), 0.0).await.unwrap();

        let got = store.get_void_channel(cid(10)).await.unwrap().unwrap();
        assert_eq!(got.delete_after, 0.0);
    }

    #[tokio::test]
    async fn test_add_twice_already_exists() {
        let store = make_store().await;
        let ch = VoidChannel::new(sid(1), cid(10), 5.0);
        store.add_void_channel(&ch).await.unwrap();

        let err = store.add_void_channel(&ch).await.unwrap_err();
        assert!(matches!(err, Error::AlreadyExists { channel_id } if channel_id == cid(10)));
    }

    #[tokio::test]
    async fn test_channel_unique_across_servers() {
        let store = make_store().await;
        store
            .add_void_channel(&VoidChannel::new(sid(1), cid(10), 5.0))
            .await
            .unwrap();

        let err = store
            .add_void_channel(&VoidChannel::new(sid(2), cid(10), 1.0))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::AlreadyExists { .. }));
    }

    #[tokio::test]
    async fn test_clear_all_keeps_schema() {
        let store = make_store().await;
        store
            .add_void_channel(&VoidChannel::new(sid(1), cid(10), 5.0))
            .await
            .unwrap();
        store.set_default_log_channel(sid(1), Some(cid(7))).await.unwrap();

        assert_eq!(store.clear_all().await.unwrap(), 2);
        assert!(store.list_all_void_channels().await.unwrap().is_empty());
        assert_eq!(store.default_log_channel(sid(1)).await.unwrap(), None);

        store
            .add_void_channel(&VoidChannel::new(sid(1), cid(10), 5.0))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_remove_missing_is_noop() {
        let store = make_store().await;
        store.remove_void_channel(sid(1), cid(99)).await.unwrap();
    }

    #[tokio::test]
    async fn test_remove() {
        let store = make_store().await;
        store
            .add_void_channel(&VoidChannel::new(sid(1), cid(10), 5.0))
            .await
            .unwrap();
        store.remove_void_channel(sid(1), cid(10)).await.unwrap();
        assert!(store.get_void_channel(cid(10)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_in_insertion_order() {
        let store = make_store().await;
        for channel in [30, 10, 20] {
            store
                .add_void_channel(&VoidChannel::new(sid(1), cid(channel), 5.0))
                .await
                .unwrap();
        }
        store
            .add_void_channel(&VoidChannel::new(sid(2), cid(40), 5.0))
            .await
            .unwrap();

        let ids: Vec<u64> = store
            .list_void_channels(sid(1))
            .await
            .unwrap()
            .iter()
            .map(|c| c.channel_id.get())
            .collect();
        assert_eq!(ids, vec![30, 10, 20]);
        assert_eq!(store.list_all_void_channels().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_set_enabled_and_missing_row() {
        let store = make_store().await;
        store
            .add_void_channel(&VoidChannel::new(sid(1), cid(10), 5.0))
            .await
            .unwrap();
        store.set_enabled(sid(1), cid(10), false).await.unwrap();
        assert!(!store.get_void_channel(cid(10)).await.unwrap().unwrap().enabled);

        // No row: no-op, no error.
        store.set_enabled(sid(1), cid(11), true).await.unwrap();
        assert!(store.get_void_channel(cid(11)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_negative_delay_rejected() {
        let store = make_store().await;
        store
            .add_void_channel(&VoidChannel::new(sid(1), cid(10), 5.0))
            .await
            .unwrap();
        let err = store.set_delete_after(sid(1), cid(10), -1.0).await.unwrap_err();
        assert!(matches!(err, Error::InvalidDelay { .. }));
    }

    #[tokio::test]
    async fn test_user_overrides() {
        let store = make_store().await;
        let ignored = UserOverride {
            server_id: sid(1),
            user_id: UserId::new(5),
            log_channel_id: None,
        };
        store.set_user_override(&ignored).await.unwrap();
        store
            .set_user_override(&UserOverride {
                log_channel_id: Some(cid(77)),
                ..ignored.clone()
            })
            .await
            .unwrap();

        let overrides = store.user_overrides(sid(1)).await.unwrap();
        assert_eq!(overrides.len(), 1);
        assert_eq!(overrides[0].log_channel_id, Some(cid(77)));

        store.remove_user_override(sid(1), UserId::new(5)).await.unwrap();
        assert!(store.user_overrides(sid(1)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ignored_scopes() {
        let store = make_store().await;
        store.set_channel_ignored(sid(1), cid(3), true).await.unwrap();
        store.set_channel_ignored(sid(1), cid(3), true).await.unwrap();
        store
            .set_category_ignored(sid(1), CategoryId::new(4), true)
            .await
            .unwrap();

        assert!(store.ignored_channels(sid(1)).await.unwrap().contains(&cid(3)));
        assert!(
            store
                .ignored_categories(sid(1))
                .await
                .unwrap()
                .contains(&CategoryId::new(4))
        );

        store.set_channel_ignored(sid(1), cid(3), false).await.unwrap();
        assert!(store.ignored_channels(sid(1)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_event_configs_and_default_channel() {
        let store = make_store().await;
        assert!(store.default_log_channel(sid(1)).await.unwrap().is_none());

        store
            .set_default_log_channel(sid(1), Some(cid(50)))
            .await
            .unwrap();
        assert_eq!(store.default_log_channel(sid(1)).await.unwrap(), Some(cid(50)));

        store
            .set_event_log_config(sid(1), EventType::MemberJoin, EventLogConfig {
                enabled: false,
                log_channel_id: None,
            })
            .await
            .unwrap();
        let configs = store.event_log_configs(sid(1)).await.unwrap();
        assert!(!configs[&EventType::MemberJoin].enabled);

        store.set_default_log_channel(sid(1), None).await.unwrap();
        assert!(store.default_log_channel(sid(1)).await.unwrap().is_none());
    }
}
