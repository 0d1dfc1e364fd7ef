//! # Database Persistence Layer
//!
//! Optional Postgres write-through via SQLx. When `DATABASE_URL` is set,
//! missions and acceptance rows are persisted and the durable-store guards
//! (conditional carrier-binding update, acceptance unique constraint) are
//! enforced there too; when absent, the API runs on the in-memory stores
//! alone.
//!
//! The in-memory stores stay authoritative within a process — handlers
//! mutate them first and mirror the result here.

pub mod acceptances;
pub mod missions;

use sqlx::postgres::{PgPool, PgPoolOptions};

/// Initialize the connection pool and run migrations.
///
/// Returns `None` if `DATABASE_URL` is not set (in-memory-only mode).
/// Returns `Err` if the URL is set but the connection or migration fails.
pub async fn init_pool(database_url: Option<&str>) -> Result<Option<PgPool>, sqlx::Error> {
    let url = match database_url {
        Some(url) => url,
        None => {
            tracing::warn!(
                "DATABASE_URL not set — running in-memory only mode. \
                 State will not survive restarts."
            );
            return Ok(None);
        }
    };

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .min_connections(2)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(url)
        .await?;

    tracing::info!("Connected to PostgreSQL");

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    Ok(Some(pool))
}
