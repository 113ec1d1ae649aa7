//! Access-token store: static and persisted tokens keyed by secret, lazily purged.

use crate::config::AccessTokenConfig;
use crate::error::MapperError;
use crate::mapper::Mapper;
use crate::sql::Selector;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

/// Role given to requests without a usable token.
pub const GUEST_ROLE: &str = "guest";

/// Identity attached to every request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AccessTokenEntry {
    pub id: Uuid,
    /// Secret, compared verbatim. Never serialized.
    #[serde(skip_serializing, default)]
    pub key: String,
    pub role: String,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub expiry: Option<DateTime<Utc>>,
}

impl AccessTokenEntry {
    pub fn new(id: Uuid, key: impl Into<String>, role: impl Into<String>) -> Self {
        AccessTokenEntry {
            id,
            key: key.into(),
            role: role.into(),
            comment: String::new(),
            expiry: None,
        }
    }

    /// Anonymous fallback identity.
    pub fn guest() -> Self {
        AccessTokenEntry {
            id: Uuid::nil(),
            key: String::new(),
            role: GUEST_ROLE.to_string(),
            comment: "guest".to_string(),
            expiry: None,
        }
    }

    pub fn is_guest(&self) -> bool {
        self.id.is_nil() && self.key.is_empty()
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiry.map_or(false, |expiry| expiry <= now)
    }

    fn from_config(id: Uuid, cfg: &AccessTokenConfig) -> Self {
        AccessTokenEntry {
            id,
            key: cfg.key.clone(),
            role: cfg.role.clone(),
            comment: cfg.comment.clone(),
            expiry: cfg.expiry,
        }
    }
}

/// Row shape of the persisted token table.
#[derive(Clone, Default)]
pub struct StoredToken {
    pub id: Uuid,
    pub key: String,
    pub role: String,
    pub comment: Option<String>,
    pub expiry: Option<DateTime<Utc>>,
}

crate::impl_record!(StoredToken {
    id,
    key => "token_key",
    role,
    comment,
    expiry,
});

impl From<StoredToken> for AccessTokenEntry {
    fn from(t: StoredToken) -> Self {
        AccessTokenEntry {
            id: t.id,
            key: t.key,
            role: t.role,
            comment: t.comment.unwrap_or_default(),
            expiry: t.expiry,
        }
    }
}

impl From<&AccessTokenEntry> for StoredToken {
    fn from(e: &AccessTokenEntry) -> Self {
        StoredToken {
            id: e.id,
            key: e.key.clone(),
            role: e.role.clone(),
            comment: Some(e.comment.clone()).filter(|c| !c.is_empty()),
            expiry: e.expiry,
        }
    }
}

/// Thread-safe token table shared by all requests. Expired entries stay in the
/// table until the next purge but are never returned by `lookup`.
#[derive(Debug, Default)]
pub struct TokenStore {
    by_key: RwLock<HashMap<String, AccessTokenEntry>>,
}

impl TokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(tokens: &HashMap<Uuid, AccessTokenConfig>) -> Self {
        let store = Self::new();
        for (id, cfg) in tokens {
            store.insert(AccessTokenEntry::from_config(*id, cfg));
        }
        store
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, AccessTokenEntry>> {
        self.by_key.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, AccessTokenEntry>> {
        self.by_key.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds or replaces the entry with the same key. Returns the replaced entry.
    pub fn insert(&self, entry: AccessTokenEntry) -> Option<AccessTokenEntry> {
        self.write().insert(entry.key.clone(), entry)
    }

    pub fn revoke(&self, key: &str) -> Option<AccessTokenEntry> {
        self.write().remove(key)
    }

    pub fn lookup(&self, key: &str) -> Option<AccessTokenEntry> {
        let now = Utc::now();
        self.read().get(key).filter(|e| !e.is_expired_at(now)).cloned()
    }

    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(Utc::now())
    }

    /// Drops every entry expired at `now`. Returns how many were dropped.
    pub fn purge_expired_at(&self, now: DateTime<Utc>) -> usize {
        let mut tokens = self.write();
        let before = tokens.len();
        tokens.retain(|_, e| !e.is_expired_at(now));
        let purged = before - tokens.len();
        if purged > 0 {
            tracing::debug!(purged, "purged expired access tokens");
        }
        purged
    }

    /// Purge, then look up `key`. Missing, unknown and expired keys all resolve to guest.
    pub fn resolve(&self, key: Option<&str>) -> AccessTokenEntry {
        self.purge_expired();
        key.and_then(|k| self.lookup(k))
            .unwrap_or_else(AccessTokenEntry::guest)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Load every unexpired token from `table`. Returns how many were added.
    pub async fn load_persisted(&self, mapper: &Mapper, table: &str) -> Result<usize, MapperError> {
        let mut stored: Vec<StoredToken> = Vec::new();
        mapper
            .find_many(&mut stored, table, &[Selector::null("token_key", "IS NOT")])
            .await?;
        let now = Utc::now();
        let mut added = 0;
        for token in stored {
            let entry = AccessTokenEntry::from(token);
            if entry.key.is_empty() || entry.is_expired_at(now) {
                continue;
            }
            self.insert(entry);
            added += 1;
        }
        tracing::info!(table, added, "loaded persisted access tokens");
        Ok(added)
    }

    /// Write `entry` to `table`, then make it usable.
    pub async fn persist(&self, mapper: &Mapper, table: &str, entry: AccessTokenEntry) -> Result<(), MapperError> {
        mapper.create(table, &StoredToken::from(&entry)).await?;
        self.insert(entry);
        Ok(())
    }
}

/// Key of an `Authorization: Bearer <key>` header value. Anything else is `None`.
pub fn parse_bearer(header: &str) -> Option<&str> {
    let mut fields = header.split_whitespace();
    match (fields.next(), fields.next(), fields.next()) {
        (Some(scheme), Some(key), None) if scheme.eq_ignore_ascii_case("bearer") => Some(key),
        _ => None,
    }
}
