use {clap::Subcommand, thevoid_config::VoidBotConfig};

#[derive(Subcommand)]
pub enum DbAction {
    /// Clear all data from tables but keep the schema intact.
    Clear,
    /// Run all pending database migrations.
    Migrate,
}

pub async fn handle_db(action: DbAction, config: &VoidBotConfig) -> anyhow::Result<()> {
    // Opening the store runs pending migrations.
    let store = crate::open_store(config).await?;
    match action {
        DbAction::Clear => {
            let removed = store.clear_all().await?;
            println!("Database cleared ({removed} row(s) removed).");
        },
        DbAction::Migrate => {
            println!("Database migrations complete: {}", config.database.url);
        },
    }
    store.pool().close().await;
    Ok(())
}
