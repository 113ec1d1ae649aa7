//! Result of a capability call, consumed only by the response encoder.

use crate::error::AppError;
use serde::Serialize;

/// What a capability reports back. `code` of `None` means 200. A set `error`
/// forces a 500 and is logged, never sent.
#[derive(Debug, Default, Serialize)]
pub struct Outcome {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub message: String,
    #[serde(skip)]
    pub error: Option<AppError>,
    #[serde(skip_serializing_if = "is_zero")]
    pub affected: u64,
    #[serde(skip_serializing_if = "is_zero")]
    pub ok: u64,
    #[serde(skip_serializing_if = "is_zero")]
    pub failed: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

fn is_zero(n: &u64) -> bool {
    *n == 0
}

impl Outcome {
    pub fn success() -> Self {
        Self::default()
    }

    pub fn status(code: u16, message: impl Into<String>) -> Self {
        Outcome {
            code: Some(code),
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::status(400, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::status(404, message)
    }

    pub fn method_not_allowed() -> Self {
        Self::status(405, "method not allowed for endpoint")
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::status(409, message)
    }

    /// 201 with a `Location` header.
    pub fn created(location: impl Into<String>) -> Self {
        Outcome {
            code: Some(201),
            location: Some(location.into()),
            ..Self::default()
        }
    }

    pub fn no_content() -> Self {
        Outcome {
            code: Some(204),
            ..Self::default()
        }
    }

    pub fn failed(error: impl Into<AppError>) -> Self {
        Outcome {
            error: Some(error.into()),
            ..Self::default()
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_counts(mut self, affected: u64, ok: u64, failed: u64) -> Self {
        self.affected = affected;
        self.ok = ok;
        self.failed = failed;
        self
    }

    /// Status before encoder shaping: 500 when an error is set, else `code` or 200.
    pub fn effective_code(&self) -> u16 {
        if self.error.is_some() {
            500
        } else {
            self.code.unwrap_or(200)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MapperError;

    #[test]
    fn error_forces_500() {
        let o = Outcome::conflict("exists").with_message("x");
        assert_eq!(o.effective_code(), 409);
        let o = Outcome::failed(MapperError::NoConnection);
        assert_eq!(o.effective_code(), 500);
        assert_eq!(Outcome::success().effective_code(), 200);
    }

    #[test]
    fn serializes_only_set_fields() {
        let json = serde_json::to_value(Outcome::created("/widget/7/")).unwrap();
        assert_eq!(json, serde_json::json!({"code": 201, "location": "/widget/7/"}));
        let json = serde_json::to_value(Outcome::success().with_counts(3, 2, 1)).unwrap();
        assert_eq!(json, serde_json::json!({"affected": 3, "ok": 2, "failed": 1}));
    }
}
