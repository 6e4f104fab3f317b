use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool};
use tracing::info;

const SCHEMA: &str = include_str!("../migrations/0001_cvs.sql");

/// Creates a PostgreSQL connection pool and makes sure the `cvs` table exists.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    // Plain string execution uses the simple protocol, so the file may hold
    // several statements.
    pool.execute(SCHEMA)
        .await
        .context("Failed to apply CV schema")?;

    info!("PostgreSQL connection pool established");
    Ok(pool)
}
