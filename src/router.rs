//! Registrations grouped by path prefix. Prefixes are matched longest-first;
//! within a prefix, patterns are tried in registration order against the
//! rest of the path.

use crate::error::ConfigError;
use crate::resource::Handler;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;

pub struct Registration {
    pattern: Regex,
    handler: Arc<dyn Handler>,
}

impl Registration {
    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }

    pub fn handler(&self) -> &Arc<dyn Handler> {
        &self.handler
    }

    /// Named captures of `suffix`. Groups that did not participate map to "".
    fn captures(&self, suffix: &str) -> Option<HashMap<String, String>> {
        let caps = self.pattern.captures(suffix)?;
        let args = self
            .pattern
            .capture_names()
            .flatten()
            .map(|name| {
                let value = caps.name(name).map(|m| m.as_str()).unwrap_or_default();
                (name.to_string(), value.to_string())
            })
            .collect();
        Some(args)
    }
}

/// All registrations sharing one prefix, in registration order.
pub struct RegistrationSet {
    prefix: String,
    registrations: Vec<Registration>,
}

impl RegistrationSet {
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn registrations(&self) -> &[Registration] {
        &self.registrations
    }

    /// First registration whose pattern matches `suffix`, with its path arguments.
    pub fn find(&self, suffix: &str) -> Option<(&Registration, HashMap<String, String>)> {
        self.registrations
            .iter()
            .find_map(|r| r.captures(suffix).map(|args| (r, args)))
    }
}

#[derive(Default)]
pub struct Registry {
    site_prefix: String,
    sets: Vec<RegistrationSet>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mount every prefix under `site_prefix` (e.g. "/api"). Empty mounts at the root.
    pub fn with_site_prefix(mut self, site_prefix: impl Into<String>) -> Self {
        self.site_prefix = site_prefix.into();
        self
    }

    pub fn site_prefix(&self) -> &str {
        &self.site_prefix
    }

    /// Add `handler` under `prefix` (must start and end with "/"). `pattern` is
    /// compiled here; a bad pattern fails registration.
    pub fn register(
        &mut self,
        prefix: &str,
        pattern: &str,
        handler: impl Handler + 'static,
    ) -> Result<(), ConfigError> {
        if !prefix.starts_with('/') || !prefix.ends_with('/') {
            return Err(ConfigError::Validation(format!(
                "path prefix '{}' must start and end with '/'",
                prefix
            )));
        }
        let compiled = Regex::new(pattern).map_err(|source| {
            tracing::error!(pattern, error = %source, "failed to compile path pattern for handler");
            ConfigError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            }
        })?;
        let registration = Registration {
            pattern: compiled,
            handler: Arc::new(handler),
        };
        match self.sets.iter_mut().find(|s| s.prefix == prefix) {
            Some(set) => set.registrations.push(registration),
            None => self.sets.push(RegistrationSet {
                prefix: prefix.to_string(),
                registrations: vec![registration],
            }),
        }
        Ok(())
    }

    /// Set with the longest mounted prefix of `path`, and the remaining suffix.
    pub fn resolve<'p>(&self, path: &'p str) -> Option<(&RegistrationSet, &'p str)> {
        let rest = path.strip_prefix(self.site_prefix.as_str())?;
        self.sets
            .iter()
            .filter(|set| rest.starts_with(set.prefix.as_str()))
            .max_by_key(|set| set.prefix.len())
            .map(|set| (set, &rest[set.prefix.len()..]))
    }

    /// (mounted prefix, pattern, resource type) for every registration.
    pub fn routes(&self) -> Vec<(String, String, &'static str)> {
        self.sets
            .iter()
            .flat_map(|set| {
                set.registrations.iter().map(move |r| {
                    (
                        format!("{}{}", self.site_prefix, set.prefix),
                        r.pattern.as_str().to_string(),
                        r.handler.type_name(),
                    )
                })
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::mapper::Mapper;
    use crate::outcome::Outcome;
    use crate::request::Request;
    use crate::resource::{Endpoint, Readable};
    use async_trait::async_trait;
    use serde::{Deserialize, Serialize};

    #[derive(Default, Serialize, Deserialize)]
    struct Station;

    #[async_trait]
    impl Readable for Station {
        async fn read(&mut self, _: &Request, _: &Mapper) -> Result<Outcome, AppError> {
            Ok(Outcome::success())
        }
    }

    #[derive(Default, Serialize, Deserialize)]
    struct Stations;

    #[async_trait]
    impl Readable for Stations {
        async fn read(&mut self, _: &Request, _: &Mapper) -> Result<Outcome, AppError> {
            Ok(Outcome::success())
        }
    }

    fn registry() -> Registry {
        let mut registry = Registry::new();
        registry
            .register("/station/", r"^$", Endpoint::<Stations>::default_allocated().readable())
            .unwrap();
        registry
            .register(
                "/station/",
                r"^(?P<track>[^/]+)/(?P<id>\d+)/$",
                Endpoint::<Station>::default_allocated().readable(),
            )
            .unwrap();
        registry
            .register("/station/", r"^(?P<any>.*)$", Endpoint::<Stations>::default_allocated().readable())
            .unwrap();
        registry
            .register("/station/admin/", r"^$", Endpoint::<Station>::default_allocated().readable())
            .unwrap();
        registry
    }

    #[test]
    fn longest_prefix_wins() {
        let registry = registry();
        let (set, suffix) = registry.resolve("/station/admin/").unwrap();
        assert_eq!(set.prefix(), "/station/admin/");
        assert_eq!(suffix, "");
        let (set, suffix) = registry.resolve("/station/net/4/").unwrap();
        assert_eq!(set.prefix(), "/station/");
        assert_eq!(suffix, "net/4/");
        assert!(registry.resolve("/track/").is_none());
    }

    #[test]
    fn first_matching_pattern_wins() {
        let registry = registry();
        let (set, suffix) = registry.resolve("/station/net/4/").unwrap();
        let (reg, args) = set.find(suffix).unwrap();
        assert!(reg.handler().type_name().ends_with("Station"));
        assert_eq!(args.get("track").map(String::as_str), Some("net"));
        assert_eq!(args.get("id").map(String::as_str), Some("4"));

        let (reg, args) = set.find("").unwrap();
        assert!(reg.handler().type_name().ends_with("Stations"));
        assert!(args.is_empty());

        let (_, args) = set.find("net/x/").unwrap();
        assert_eq!(args.get("any").map(String::as_str), Some("net/x/"));
    }

    #[test]
    fn invalid_pattern_fails_at_registration() {
        let mut registry = Registry::new();
        let err = registry
            .register("/station/", r"^(?P<id>[^/]+$", Endpoint::<Station>::default_allocated())
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern { .. }));
        assert!(registry.is_empty());
    }

    #[test]
    fn prefix_must_be_slash_delimited() {
        let mut registry = Registry::new();
        for bad in ["station/", "/station", ""] {
            let err = registry
                .register(bad, r"^$", Endpoint::<Station>::default_allocated())
                .unwrap_err();
            assert!(matches!(err, ConfigError::Validation(_)));
        }
    }

    #[test]
    fn site_prefix_mounts_every_set() {
        let registry = registry().with_site_prefix("/api");
        assert!(registry.resolve("/station/net/4/").is_none());
        let (set, suffix) = registry.resolve("/api/station/net/4/").unwrap();
        assert_eq!(set.prefix(), "/station/");
        assert_eq!(suffix, "net/4/");
        assert!(registry.routes().iter().all(|(prefix, _, _)| prefix.starts_with("/api/station/")));
    }
}
