//! GNSS device tracking backend.
//!
//! Devices report their position as the raw answer of a cellular modem's GNSS
//! query. The service decodes those sentences into decimal degrees
//! ([`gnss::decode`]), stores them per device, and exposes users, devices and
//! readings over a JSON API.

pub mod actions;
pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod db;
pub mod devices;
pub mod devices_repo;
pub mod gnss;
pub mod ingest;
pub mod log_format;
pub mod memory_store;
pub mod metrics;
pub mod readings;
pub mod readings_repo;
pub mod roles;
pub mod roles_repo;
pub mod schema;
pub mod store;
pub mod telemetry;
pub mod users;
pub mod users_repo;
pub mod web;

pub use gnss::{DecodeError, DecodedCoordinate, decode};

/// Version string reported by `/health` and Sentry: `git describe` output
/// when available, otherwise the crate version.
pub fn version() -> &'static str {
    match option_env!("VERGEN_GIT_DESCRIBE") {
        Some(describe) if !describe.is_empty() && describe != "VERGEN_IDEMPOTENT_OUTPUT" => {
            describe
        }
        _ => env!("CARGO_PKG_VERSION"),
    }
}
