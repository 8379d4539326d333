use crate::config::DatabaseConfig;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{ConnectOptions, PgPool};
use std::str::FromStr;
use std::time::Duration;

/// Open the store pool. Writes are sequential, so a handful of connections is plenty.
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    let connect_options = PgConnectOptions::from_str(&config.url)?
        .log_slow_statements(tracing::log::LevelFilter::Warn, Duration::from_secs(2));

    let pool = PgPoolOptions::new()
        .max_connections(4)
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(connect_options)
        .await?;
    tracing::info!("Connected to invoice store");
    Ok(pool)
}
