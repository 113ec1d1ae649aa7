//! Wire config, registry, token store and mapper together and serve HTTP.

use crate::config::Config;
use crate::error::AppError;
use crate::mapper::Mapper;
use crate::router::Registry;
use crate::routes::service_routes;
use crate::state::AppState;
use crate::store;
use crate::tokens::TokenStore;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Connect the mapper (when `database_url` is set), load static and persisted
/// tokens and mount `registry` under the configured site prefix.
pub async fn build_state(config: &Config, registry: Registry) -> Result<AppState, AppError> {
    let mapper = match &config.database_url {
        Some(url) => Mapper::new(store::connect(url, config.max_connections).await?),
        None => {
            tracing::warn!("no database_url configured, mapper runs disconnected");
            Mapper::disconnected()
        }
    };

    let tokens = Arc::new(TokenStore::from_config(&config.access_tokens));
    if let Some(table) = &config.token_table {
        match mapper.pool() {
            Ok(pool) => {
                store::ensure_token_table(pool, table).await?;
                tokens.load_persisted(&mapper, table).await?;
            }
            Err(_) => tracing::warn!(table = %table, "token_table set without a database, skipping persisted tokens"),
        }
    }

    let registry = if config.site_prefix.is_empty() {
        registry
    } else {
        registry.with_site_prefix(config.site_prefix.clone())
    };
    Ok(AppState::new(registry, tokens, mapper).with_max_body_bytes(config.max_body_bytes))
}

/// Serve `registry` on `config.listen_address` until the listener fails.
pub async fn serve(config: Config, registry: Registry) -> Result<(), AppError> {
    let state = build_state(&config, registry).await?;
    for (prefix, pattern, resource) in state.registry.routes() {
        tracing::info!(prefix = %prefix, pattern = %pattern, resource, "added receiver");
    }
    let listener = TcpListener::bind(&config.listen_address).await?;
    tracing::info!(
        listen_address = %listener.local_addr()?,
        site_prefix = %config.site_prefix,
        "server is listening"
    );
    axum::serve(listener, service_routes(state)).await?;
    Ok(())
}
