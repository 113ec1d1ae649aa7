//! Resource routes: every path and method goes to the dispatcher.

use crate::dispatch::dispatch;
use crate::state::AppState;
use axum::Router;

/// Router with the dispatcher as fallback. Body size is enforced by the
/// dispatcher itself so that a 413 carries the same headers and JSON shape
/// as every other response.
pub fn service_routes(state: AppState) -> Router {
    Router::new().fallback(dispatch).with_state(state)
}
