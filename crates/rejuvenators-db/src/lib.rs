//! # Rejuvenators DB
//!
//! PostgreSQL pool setup and schema migrations.
//!
//! - `DATABASE_URL`: connection string (required for the postgres backend)
//! - `DATABASE_MAX_CONNECTIONS`: pool size (default 10)
//!
//! ```ignore
//! let pool = rejuvenators_db::init_db_pool().await?;
//! rejuvenators_db::run_migrations(&pool).await?;
//! ```

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use std::env;
use std::time::Duration;

pub use sqlx::PgPool;

const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// Connects a pool using `DATABASE_URL`.
pub async fn init_db_pool() -> anyhow::Result<PgPool> {
    let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_MAX_CONNECTIONS);

    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&database_url)
        .await
        .context("Failed to connect to database")?;

    tracing::info!(max_connections, "Database pool ready");
    Ok(pool)
}

/// Applies the migrations under `migrations/`.
pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("../../migrations")
        .run(pool)
        .await
        .context("Failed to run database migrations")?;
    Ok(())
}
