//! Process configuration, read from a JSON file.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Address the HTTP listener binds to.
    #[serde(default = "default_listen_address")]
    pub listen_address: String,
    /// PostgreSQL connection string. Without it the mapper runs disconnected.
    #[serde(default)]
    pub database_url: Option<String>,
    /// URL prefix prepended to every registered prefix, e.g. "/api".
    #[serde(default)]
    pub site_prefix: String,
    /// Enables trace-level logging for this crate.
    #[serde(default)]
    pub debug: bool,
    /// Static (non-persisted) access tokens keyed by token id.
    #[serde(default)]
    pub access_tokens: HashMap<Uuid, AccessTokenConfig>,
    /// Table holding persisted access tokens, loaded at startup when set.
    #[serde(default)]
    pub token_table: Option<String>,
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    /// Pool size for the PostgreSQL connection pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            listen_address: default_listen_address(),
            database_url: None,
            site_prefix: String::new(),
            debug: false,
            access_tokens: HashMap::new(),
            token_table: None,
            max_body_bytes: default_max_body_bytes(),
            max_connections: default_max_connections(),
        }
    }
}

/// One static access token.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AccessTokenConfig {
    pub key: String,
    pub role: String,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub expiry: Option<DateTime<Utc>>,
}

fn default_listen_address() -> String {
    "0.0.0.0:8080".into()
}

fn default_max_body_bytes() -> usize {
    1_048_576
}

fn default_max_connections() -> u32 {
    5
}
