//! Embedded schema migrations.
//!
//! The SQL under `backend/migrations` is compiled into the binary. Startup
//! applies pending migrations over a blocking connection before the async
//! pool is built.

use diesel::Connection;
use diesel::pg::PgConnection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::info;

use super::pool::PoolError;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Apply every pending migration, returning how many ran.
///
/// Blocks the calling thread; run it on a blocking task from async code.
///
/// # Errors
/// Returns [`PoolError::Build`] when the database cannot be reached or a
/// migration fails.
pub fn run_pending_migrations(database_url: &str) -> Result<usize, PoolError> {
    let mut conn = PgConnection::establish(database_url)
        .map_err(|err| PoolError::build(format!("connect for migrations: {err}")))?;
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|err| PoolError::build(format!("run migrations: {err}")))?;
    for version in &applied {
        info!(%version, "applied migration");
    }
    Ok(applied.len())
}
