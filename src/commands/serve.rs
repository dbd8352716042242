use anyhow::Result;
use tracing::{info, warn};

use gnss_tracker::bootstrap::ensure_root_user;
use gnss_tracker::config::AppConfig;
use gnss_tracker::store::Stores;
use gnss_tracker::web::{AppState, start_web_server};
use gnss_tracker::{db, metrics};

pub async fn handle_serve(
    config: &AppConfig,
    interface: String,
    port: u16,
    ephemeral: bool,
    enable_metrics: bool,
) -> Result<()> {
    sentry::configure_scope(|scope| {
        scope.set_tag("operation", "serve");
    });

    let metrics_handle = if enable_metrics {
        let handle = metrics::init_metrics()?;
        metrics::initialize_api_metrics();
        tokio::spawn(metrics::uptime_task());
        Some(handle)
    } else {
        None
    };

    let stores = if ephemeral {
        warn!("Running with in-memory storage; nothing will be persisted");
        Stores::in_memory()
    } else {
        let pool = db::create_pool(config.require_database_url()?)?;
        let applied = db::run_migrations(&pool).await?;
        info!("Database ready ({} migration(s) applied)", applied);
        Stores::postgres(pool)
    };

    ensure_root_user(&stores, config.root_password.as_deref(), config.bcrypt_cost).await?;

    let app_state = AppState::new(stores, config);
    start_web_server(interface, port, app_state, metrics_handle).await
}
