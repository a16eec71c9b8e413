//! Persistent configuration for void channels and log routing overrides.
//!
//! The SQLite backend shares its pool with nothing else, so
//! [`SqliteStore::new`] runs the embedded migrations itself. The in-memory
//! backend exists for tests of the crates built on top of this one.

pub mod error;
pub mod memory;
pub mod sqlite;
pub mod store;
pub mod types;

pub use {
    error::{Error, Result},
    memory::InMemoryStore,
    sqlite::SqliteStore,
    store::{LogConfigStore, VoidChannelStore},
    types::{EventLogConfig, EventType, UserOverride, VoidChannel, validate_delay},
};

/// Run database migrations for the store.
///
/// Creates the `void_channels` table and the log override tables.
pub async fn run_migrations(pool: &sqlx::SqlitePool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .set_ignore_missing(true)
        .run(pool)
        .await?;
    Ok(())
}
