//! Load config from a JSON file, then let environment variables override it.

use crate::config::{validate, Config};
use crate::error::ConfigError;
use std::path::Path;

/// Environment variables that override file settings.
pub const ENV_DATABASE_URL: &str = "DATABASE_URL";
pub const ENV_LISTEN_ADDRESS: &str = "LISTEN_ADDRESS";
pub const ENV_SITE_PREFIX: &str = "SITE_PREFIX";

/// Read and parse a config file. Missing optional keys take their defaults.
pub async fn load_from_path(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
    parse(&raw)
}

pub fn parse(raw: &str) -> Result<Config, ConfigError> {
    serde_json::from_str(raw).map_err(|e| ConfigError::Load(e.to_string()))
}

/// Apply `DATABASE_URL`, `LISTEN_ADDRESS` and `SITE_PREFIX` when set and non-empty.
pub fn apply_env(config: &mut Config) {
    apply_overrides(config, |key| std::env::var(key).ok());
}

fn apply_overrides(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
    if let Some(url) = lookup(ENV_DATABASE_URL) {
        config.database_url = Some(url);
    }
    if let Some(addr) = lookup(ENV_LISTEN_ADDRESS) {
        config.listen_address = addr;
    }
    if let Some(prefix) = lookup(ENV_SITE_PREFIX) {
        config.site_prefix = prefix;
    }
}

/// Read the file, apply environment overrides, validate.
pub async fn load(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let mut config = load_from_path(path).await?;
    apply_env(&mut config);
    validate(&config)?;
    tracing::debug!(
        listen_address = %config.listen_address,
        site_prefix = %config.site_prefix,
        tokens = config.access_tokens.len(),
        "config loaded"
    );
    Ok(config)
}
