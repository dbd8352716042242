use anyhow::Result;
use tracing::info;

use gnss_tracker::config::AppConfig;
use gnss_tracker::db;

pub async fn handle_migrate(config: &AppConfig) -> Result<()> {
    let pool = db::create_pool(config.require_database_url()?)?;

    let applied = db::run_migrations(&pool).await?;
    if applied == 0 {
        info!("Database schema is up to date");
    } else {
        info!("Applied {} migration(s)", applied);
    }
    Ok(())
}
