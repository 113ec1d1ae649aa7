//! Request dispatcher: read input, resolve identity, route, run the capability, encode.

use crate::extractors::BearerToken;
use crate::outcome::Outcome;
use crate::request::{normalize_path, Method, QueryArgs, Request};
use crate::response::encode;
use crate::state::AppState;
use axum::{
    body::{Body, Bytes, HttpBody},
    extract::{Query, State},
    http::header::CONTENT_LENGTH,
    response::{IntoResponse, Response},
};
use percent_encoding::percent_decode_str;
use std::pin::Pin;
use tracing::Instrument;
use uuid::Uuid;

/// Fallback handler serving every registered resource.
pub async fn dispatch(
    State(state): State<AppState>,
    BearerToken(key): BearerToken,
    req: axum::extract::Request,
) -> Response {
    let id = Uuid::new_v4();
    let span = tracing::info_span!("request", %id);
    run(state, key, req, id).instrument(span).await
}

fn respond(method: Method, pretty: bool, outcome: Outcome, data: Option<&serde_json::Value>) -> Response {
    let encoded = encode(method.strips_body(), pretty, &outcome, data);
    tracing::debug!(code = encoded.status.as_u16(), location = ?encoded.location, "request done");
    encoded.into_response()
}

enum BodyError {
    TooLarge,
    Read(axum::Error),
}

/// Collect the body, failing as soon as it grows past `limit` bytes.
async fn read_body(mut body: Body, limit: usize) -> Result<Bytes, BodyError> {
    let mut buf = Vec::new();
    while let Some(frame) = std::future::poll_fn(|cx| Pin::new(&mut body).poll_frame(cx)).await {
        let Ok(data) = frame.map_err(BodyError::Read)?.into_data() else {
            continue;
        };
        if buf.len() + data.len() > limit {
            return Err(BodyError::TooLarge);
        }
        buf.extend_from_slice(&data);
    }
    Ok(Bytes::from(buf))
}

fn too_large() -> Outcome {
    Outcome::status(413, "request body too large")
}

async fn run(state: AppState, key: Option<String>, req: axum::extract::Request, id: Uuid) -> Response {
    let method = Method::from_http(req.method());
    tracing::info!(method = %req.method(), uri = %req.uri(), "request");

    let query = match Query::<Vec<(String, String)>>::try_from_uri(req.uri()) {
        Ok(Query(pairs)) => QueryArgs::from_pairs(pairs),
        Err(e) => {
            tracing::warn!(error = %e, "failed to parse query string");
            return respond(method, false, Outcome::bad_request("malformed query string"), None);
        }
    };
    let pretty = query.pretty;
    let path = match percent_decode_str(req.uri().path()).decode_utf8() {
        Ok(decoded) => normalize_path(&decoded),
        Err(e) => {
            tracing::warn!(error = %e, "request path is not valid UTF-8");
            return respond(method, pretty, Outcome::bad_request("malformed request path"), None);
        }
    };
    let declared = req
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<usize>().ok());

    if let Some(declared) = declared.filter(|n| *n > state.max_body_bytes) {
        tracing::warn!(declared, limit = state.max_body_bytes, "request body too large");
        return respond(method, pretty, too_large(), None);
    }

    let body = match read_body(req.into_body(), state.max_body_bytes).await {
        Ok(body) => body,
        Err(BodyError::TooLarge) => {
            tracing::warn!(limit = state.max_body_bytes, "request body too large");
            return respond(method, pretty, too_large(), None);
        }
        Err(BodyError::Read(e)) => {
            tracing::warn!(error = %e, "failed to read request body");
            return respond(method, pretty, Outcome::bad_request("failed to read request body"), None);
        }
    };
    if let Some(expected) = declared.filter(|n| body.len() < *n) {
        tracing::warn!(expected, received = body.len(), "request body shorter than declared length");
        return respond(method, pretty, Outcome::bad_request("failed to read request body"), None);
    }

    let identity = state.tokens.resolve(key.as_deref());
    tracing::debug!(token = %identity.id, role = %identity.role, comment = %identity.comment, "using access token");

    let Some((set, suffix)) = state.registry.resolve(&path) else {
        return respond(method, pretty, Outcome::not_found("endpoint not found"), None);
    };
    if method == Method::Options {
        return respond(method, pretty, Outcome::success(), None);
    }
    let Some((registration, path_args)) = set.find(suffix) else {
        return respond(method, pretty, Outcome::not_found("endpoint not found"), None);
    };
    tracing::debug!(
        prefix = set.prefix(),
        pattern = registration.pattern().as_str(),
        resource = registration.handler().type_name(),
        "found receiver"
    );

    let request = Request {
        id,
        method,
        path_args,
        list_limit: query.limit,
        list_brief: query.brief,
        query_args: query.args,
        identity,
    };
    let handled = registration
        .handler()
        .handle(method, &body, &request, &state.mapper)
        .await;
    respond(method, pretty, handled.outcome, handled.data.as_ref())
}
