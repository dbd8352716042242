//! Connection pool and embedded schema migrations.

use anyhow::{Context, Result};
use diesel::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::info;

use crate::store::Conflict;
use crate::web::PgPool;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

pub fn create_pool(database_url: &str) -> Result<PgPool> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    Pool::builder()
        .max_size(10)
        .build(manager)
        .context("Failed to create database connection pool")
}

/// Apply any pending migrations, returning how many ran
pub async fn run_migrations(pool: &PgPool) -> Result<usize> {
    let pool = pool.clone();
    tokio::task::spawn_blocking(move || -> Result<usize> {
        let mut pooled = pool.get()?;
        let conn: &mut PgConnection = &mut pooled;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| anyhow::anyhow!("Failed to run migrations: {}", e))?;
        for version in &applied {
            info!("Applied migration {}", version);
        }
        Ok(applied.len())
    })
    .await?
}

/// Convert a unique violation on a keyed column into a typed [`Conflict`],
/// passing every other error through.
pub fn unique_violation(e: DieselError) -> anyhow::Error {
    if let DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) = &e {
        let conflict = match info.constraint_name() {
            Some("users_username_key") => Some(Conflict::Username),
            Some("users_email_key") => Some(Conflict::Email),
            Some("devices_mac_key") => Some(Conflict::Mac),
            _ => None,
        };
        if let Some(conflict) = conflict {
            return conflict.into();
        }
    }
    e.into()
}
