use anyhow::Result;
use std::io::IsTerminal;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::AppConfig;
use crate::log_format::TargetFirstFormat;

/// Install the global tracing subscriber.
///
/// Filtering comes from `RUST_LOG` (default `info`). Error events are also
/// forwarded to Sentry when a client has been initialized.
pub fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_ansi(std::io::stderr().is_terminal())
                .with_writer(std::io::stderr)
                .event_format(TargetFirstFormat),
        )
        .with(sentry_tracing::layer())
        .try_init()?;

    Ok(())
}

/// Start the Sentry client if a DSN is configured. Keep the guard alive for
/// the lifetime of the process so pending events are flushed on exit.
pub fn init_sentry(config: &AppConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_deref()?;

    let guard = sentry::init((
        dsn,
        sentry::ClientOptions {
            release: Some(crate::version().into()),
            environment: Some(config.environment.clone().into()),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    if guard.is_enabled() {
        info!(environment = %config.environment, "Sentry error reporting enabled");
    }
    Some(guard)
}
