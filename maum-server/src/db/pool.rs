//! PostgreSQL pool
//!
//! Every connection runs in UTC so `created_at::date` agrees with the
//! server's notion of "today".

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool};

const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// How long a handler waits for a free connection before failing.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// How long `ping` waits before calling the database unreachable.
pub const PING_TIMEOUT: Duration = Duration::from_secs(2);

/// Connect with the default connection cap.
///
/// ```ignore
/// let pool = create_pool("postgres://localhost/maum").await?;
/// ```
pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    create_pool_with_options(database_url, DEFAULT_MAX_CONNECTIONS).await
}

pub async fn create_pool_with_options(
    database_url: &str,
    max_connections: u32,
) -> Result<PgPool, sqlx::Error> {
    let pool = pool_options(max_connections).connect(database_url).await?;
    tracing::info!(max_connections, "Database pool ready");
    Ok(pool)
}

fn pool_options(max_connections: u32) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                conn.execute("SET TIME ZONE 'UTC'").await?;
                Ok(())
            })
        })
}

/// `true` when a trivial query succeeds within [`PING_TIMEOUT`].
pub async fn ping(pool: &PgPool) -> bool {
    match tokio::time::timeout(PING_TIMEOUT, sqlx::query("SELECT 1").execute(pool)).await {
        Ok(Ok(_)) => true,
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "Database ping failed");
            false
        }
        Err(_) => {
            tracing::warn!("Database ping timed out");
            false
        }
    }
}
