mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process::ExitCode;
use tracing::error;

use gnss_tracker::config::AppConfig;
use gnss_tracker::telemetry;

#[derive(Parser)]
#[command(name = "gnss-tracker", version = gnss_tracker::version())]
#[command(about = "Tracking backend for GNSS-reporting devices")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve {
        /// Interface to bind to
        #[arg(long, default_value = "0.0.0.0")]
        interface: String,

        /// Port to listen on
        #[arg(long, default_value_t = 8000)]
        port: u16,

        /// Keep everything in memory instead of Postgres
        #[arg(long, default_value_t = false)]
        ephemeral: bool,

        /// Expose Prometheus metrics at /metrics
        #[arg(long, default_value_t = false)]
        metrics: bool,
    },
    /// Apply pending database migrations and exit
    Migrate,
    /// Decode a raw GNSS sentence and print the coordinates
    Decode {
        /// e.g. "+CGPSINFO: 2237.7749,N,11422.4194,W,061125,063100.0,88.1,0.0,"
        sentence: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if let Err(e) = telemetry::init_tracing() {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    match cli.command {
        // Decoding is an offline tool and needs no configuration
        Commands::Decode { sentence } => commands::handle_decode(&sentence),
        Commands::Serve {
            interface,
            port,
            ephemeral,
            metrics,
        } => exit_code(
            async {
                let config = AppConfig::from_env()?;
                let _sentry_guard = telemetry::init_sentry(&config);
                commands::handle_serve(&config, interface, port, ephemeral, metrics).await
            }
            .await,
        ),
        Commands::Migrate => exit_code(
            async {
                let config = AppConfig::from_env()?;
                let _sentry_guard = telemetry::init_sentry(&config);
                commands::handle_migrate(&config).await
            }
            .await,
        ),
    }
}

fn exit_code(result: Result<()>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Exiting with error");
            ExitCode::FAILURE
        }
    }
}
