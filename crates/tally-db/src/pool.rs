//! Database connection pool

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Database connection pool type alias
pub type DbPool = PgPool;

/// How long to wait for a free connection before giving up.
///
/// Entitlement lookups sit on the app's cold-start path; failing fast and
/// letting the client fall back to last-known state beats queueing.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Create a new database connection pool.
///
/// Plan reads are cache-backed upstream, so the pool can stay small; size
/// it for the webhook/redemption write paths.
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect(database_url)
        .await
}
