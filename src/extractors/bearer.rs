//! Extract the bearer token key from the `Authorization` header.

use crate::tokens::parse_bearer;
use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

/// Key from `Authorization: Bearer <key>`, or `None` when the header is absent,
/// not valid text, or not a two-field bearer credential. Never rejects.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BearerToken(pub Option<String>);

#[async_trait]
impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let key = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_bearer)
            .map(str::to_string);
        Ok(BearerToken(key))
    }
}
