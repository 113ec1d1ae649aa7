//! Response encoder: status-class shaping, JSON body, ETag, CORS.

use crate::outcome::Outcome;
use axum::{
    body::{Body, Bytes},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Only message a client ever sees for a 500.
pub const GENERIC_FAILURE: &str = "internal server error";

#[derive(Serialize)]
struct Message<'a> {
    message: &'a str,
}

enum Payload<'a> {
    Outcome(&'a Outcome),
    Data(&'a serde_json::Value),
    Generic,
}

impl Payload<'_> {
    fn to_json(&self, pretty: bool) -> serde_json::Result<Vec<u8>> {
        fn write<T: Serialize + ?Sized>(v: &T, pretty: bool) -> serde_json::Result<Vec<u8>> {
            if pretty {
                serde_json::to_vec_pretty(v)
            } else {
                serde_json::to_vec(v)
            }
        }
        match self {
            Payload::Outcome(o) => write(o, pretty),
            Payload::Data(d) => write(d, pretty),
            Payload::Generic => write(&Message { message: GENERIC_FAILURE }, pretty),
        }
    }
}

/// Encoded response, before headers are attached.
#[derive(Clone, Debug, PartialEq)]
pub struct Encoded {
    pub status: StatusCode,
    pub body: Bytes,
    pub location: Option<String>,
}

/// Shape `outcome` and the optional echoed `data` into a response.
///
/// - An error on the outcome forces 500.
/// - 2xx echoes `data` when present, else the outcome; 204 never has a body; 201 sets the location.
/// - 3xx and 4xx always send the outcome, never `data`. 3xx sets the location.
/// - Anything else is a 500 with a fixed message.
///
/// `strip_body` (HEAD, OPTIONS) drops the body whatever the status.
pub fn encode(strip_body: bool, pretty: bool, outcome: &Outcome, data: Option<&serde_json::Value>) -> Encoded {
    if let Some(err) = &outcome.error {
        tracing::warn!(error = %err, "internal server error");
    }
    let mut code = outcome.effective_code();
    let mut location = None;
    let payload = match code {
        100..=199 => None,
        204 => None,
        200..=299 => {
            if code == 201 {
                location = outcome.location.clone();
            }
            Some(data.map_or(Payload::Outcome(outcome), Payload::Data))
        }
        300..=399 => {
            location = outcome.location.clone();
            Some(Payload::Outcome(outcome))
        }
        400..=499 => Some(Payload::Outcome(outcome)),
        _ => {
            code = 500;
            Some(Payload::Generic)
        }
    };

    let body = match payload.filter(|_| !strip_body) {
        None => Vec::new(),
        Some(payload) => match payload.to_json(pretty) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!(error = %e, "failed to encode response body");
                code = 500;
                Vec::new()
            }
        },
    };

    Encoded {
        status: StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        body: Bytes::from(body),
        location,
    }
}

/// Quoted lowercase hex SHA-256 of `body`.
pub fn etag(body: &[u8]) -> String {
    format!("\"{}\"", hex::encode(Sha256::digest(body)))
}

impl IntoResponse for Encoded {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::empty());
        *response.status_mut() = self.status;
        let headers = response.headers_mut();

        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
        headers.insert(header::ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static("*"));
        headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static("*"));
        headers.insert(header::ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static("300"));

        if let Some(location) = &self.location {
            match HeaderValue::from_str(location) {
                Ok(v) => {
                    headers.insert(header::LOCATION, v);
                }
                Err(_) => tracing::warn!(location = %location, "dropping invalid location header"),
            }
        }

        if !self.body.is_empty() {
            headers.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json; charset=utf-8"),
            );
            if let Ok(v) = HeaderValue::from_str(&etag(&self.body)) {
                headers.insert(header::ETAG, v);
            }
            *response.body_mut() = Body::from(self.body);
        }
        response
    }
}
