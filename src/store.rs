//! Connection pool and the persisted access-token table.

use crate::config::is_plain_identifier;
use crate::error::{AppError, ConfigError};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool, AppError> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;
    tracing::info!(max_connections, "database pool ready");
    Ok(pool)
}

fn token_table_ddl(table: &str) -> Result<String, ConfigError> {
    if !is_plain_identifier(table) {
        return Err(ConfigError::Validation(format!(
            "token table '{}' is not a plain identifier",
            table
        )));
    }
    Ok(format!(
        r#"
        CREATE TABLE IF NOT EXISTS {} (
            id UUID PRIMARY KEY,
            token_key TEXT NOT NULL UNIQUE,
            role TEXT NOT NULL,
            comment TEXT,
            expiry TIMESTAMPTZ
        )
        "#,
        table
    ))
}

/// Create the access-token table if it does not exist. Columns match `tokens::StoredToken`.
pub async fn ensure_token_table(pool: &PgPool, table: &str) -> Result<(), AppError> {
    let ddl = token_table_ddl(table)?;
    if let Some((schema, _)) = table.split_once('.') {
        sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS {}", schema))
            .execute(pool)
            .await?;
    }
    tracing::debug!(sql = %ddl, "ensure token table");
    sqlx::query(&ddl).execute(pool).await?;
    Ok(())
}
