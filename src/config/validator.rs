//! Config validation: prefix shape, token uniqueness, identifier safety.

use crate::config::Config;
use crate::error::ConfigError;
use std::collections::HashSet;

fn is_identifier_part(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// True for `name` or `schema.name` made of plain SQL identifier characters.
pub fn is_plain_identifier(s: &str) -> bool {
    match s.split_once('.') {
        Some((schema, name)) => is_identifier_part(schema) && is_identifier_part(name),
        None => is_identifier_part(s),
    }
}

pub fn validate(config: &Config) -> Result<(), ConfigError> {
    let prefix = config.site_prefix.as_str();
    if !prefix.is_empty() && (!prefix.starts_with('/') || prefix.ends_with('/')) {
        return Err(ConfigError::Validation(format!(
            "site_prefix must be empty or look like '/api', got '{}'",
            prefix
        )));
    }

    let mut keys = HashSet::new();
    for (id, token) in &config.access_tokens {
        if token.key.is_empty() {
            return Err(ConfigError::Validation(format!("access token {} has an empty key", id)));
        }
        if token.role.trim().is_empty() {
            return Err(ConfigError::Validation(format!("access token {} has an empty role", id)));
        }
        if !keys.insert(token.key.as_str()) {
            return Err(ConfigError::Validation(format!("access token {} reuses another token's key", id)));
        }
    }

    if let Some(table) = &config.token_table {
        if !is_plain_identifier(table) {
            return Err(ConfigError::Validation(format!("token_table '{}' is not a plain identifier", table)));
        }
    }

    if config.max_body_bytes == 0 {
        return Err(ConfigError::Validation("max_body_bytes must be positive".into()));
    }

    Ok(())
}
