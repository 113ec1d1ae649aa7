//! Per-request input handed to capability methods.

use crate::resource::Capability;
use crate::tokens::AccessTokenEntry;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Delete,
    Options,
    Other,
}

impl Method {
    pub fn from_http(method: &axum::http::Method) -> Self {
        match method.as_str() {
            "GET" => Method::Get,
            "HEAD" => Method::Head,
            "POST" => Method::Post,
            "PUT" => Method::Put,
            "DELETE" => Method::Delete,
            "OPTIONS" => Method::Options,
            _ => Method::Other,
        }
    }

    /// Capability a verb needs. `None` for OPTIONS (always accepted) and unknown verbs.
    pub fn required_capability(self) -> Option<Capability> {
        match self {
            Method::Get | Method::Head => Some(Capability::Read),
            Method::Post => Some(Capability::Create),
            Method::Put => Some(Capability::Write),
            Method::Delete => Some(Capability::Delete),
            Method::Options | Method::Other => None,
        }
    }

    /// POST and PUT carry a resource body.
    pub fn decodes_body(self) -> bool {
        matches!(self, Method::Post | Method::Put)
    }

    /// GET and POST echo the resource instance back as response data.
    pub fn echoes_data(self) -> bool {
        matches!(self, Method::Get | Method::Post)
    }

    pub fn strips_body(self) -> bool {
        matches!(self, Method::Head | Method::Options)
    }
}

/// Built fresh for every request.
#[derive(Clone, Debug)]
pub struct Request {
    pub id: Uuid,
    pub method: Method,
    /// Named captures of the matched path pattern.
    pub path_args: HashMap<String, String>,
    /// First value per query key. Reserved keys stay in here too.
    pub query_args: HashMap<String, String>,
    pub list_limit: Option<u32>,
    pub list_brief: bool,
    pub identity: AccessTokenEntry,
}

impl Request {
    pub fn path_arg(&self, name: &str) -> Option<&str> {
        self.path_args.get(name).map(String::as_str)
    }

    pub fn query_arg(&self, name: &str) -> Option<&str> {
        self.query_args.get(name).map(String::as_str)
    }
}

/// Query string after normalization.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryArgs {
    pub args: HashMap<String, String>,
    pub limit: Option<u32>,
    pub brief: bool,
    pub pretty: bool,
}

impl QueryArgs {
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut args = HashMap::new();
        for (key, value) in pairs {
            args.entry(key).or_insert(value);
        }
        QueryArgs {
            limit: args.get("limit").and_then(|v| v.parse::<u32>().ok()),
            brief: args.contains_key("brief"),
            pretty: args.contains_key("pretty"),
            args,
        }
    }
}

/// Path with a trailing `/`, so patterns never special-case its absence.
pub fn normalize_path(path: &str) -> String {
    if path.ends_with('/') {
        path.to_string()
    } else {
        format!("{}/", path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn first_value_per_key_wins() {
        let q = QueryArgs::from_pairs(pairs(&[("track", "net"), ("track", "server"), ("x", "")]));
        assert_eq!(q.args.get("track").map(String::as_str), Some("net"));
        assert_eq!(q.args.get("x").map(String::as_str), Some(""));
    }

    #[test]
    fn reserved_keys() {
        let q = QueryArgs::from_pairs(pairs(&[("limit", "25"), ("brief", ""), ("pretty", "0")]));
        assert_eq!(q.limit, Some(25));
        assert!(q.brief);
        assert!(q.pretty);
        assert_eq!(q.args.len(), 3);
    }

    #[test]
    fn bad_limit_is_ignored() {
        assert_eq!(QueryArgs::from_pairs(pairs(&[("limit", "-3")])).limit, None);
        assert_eq!(QueryArgs::from_pairs(pairs(&[("limit", "ten")])).limit, None);
        assert!(!QueryArgs::from_pairs(Vec::new()).brief);
    }

    #[test]
    fn path_gets_trailing_slash() {
        assert_eq!(normalize_path("/widget/7"), "/widget/7/");
        assert_eq!(normalize_path("/widget/7/"), "/widget/7/");
    }

    #[test]
    fn verbs_map_to_capabilities() {
        assert_eq!(Method::Head.required_capability(), Some(Capability::Read));
        assert_eq!(Method::Put.required_capability(), Some(Capability::Write));
        assert_eq!(Method::Options.required_capability(), None);
        assert_eq!(Method::from_http(&axum::http::Method::PATCH), Method::Other);
        assert!(Method::Post.echoes_data() && !Method::Put.echoes_data());
    }
}
