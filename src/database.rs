use sqlx::{postgres::{PgConnectOptions, PgPoolOptions}, PgPool};
use std::str::FromStr;

use crate::config::Config;

pub async fn create_pool(config: &Config) -> Result<PgPool, sqlx::Error> {
    let options = PgConnectOptions::from_str(&config.database_url)?
        .application_name("photofacet-backend")
        .statement_cache_capacity(500);

    // Facet fan-out issues up to one query per dimension per request
    PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .min_connections(8.min(config.db_max_connections))
        .acquire_timeout(config.query_timeout)
        .idle_timeout(std::time::Duration::from_secs(10))
        .test_before_acquire(false)
        .connect_with(options)
        .await
}

pub async fn run_migrations(pool: &PgPool) {
    match sqlx::migrate!("./migrations").run(pool).await {
        Ok(_) => tracing::info!("✅ Migrations completed successfully"),
        Err(sqlx::migrate::MigrateError::VersionMismatch(version)) => {
            tracing::warn!("⚠️  Migration version mismatch: {}", version);
            tracing::warn!("Database has different migration state than expected");
        }
        Err(e) => {
            tracing::warn!("❌ Failed to run migrations: {}", e);
            tracing::warn!("Continuing without migrations; facet counts fall back to per-value queries if the grouped-count function is missing");
        }
    }
}
