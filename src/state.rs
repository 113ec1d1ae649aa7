//! Shared application state handed to the dispatcher.

use crate::mapper::Mapper;
use crate::router::Registry;
use crate::tokens::TokenStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Registry>,
    pub tokens: Arc<TokenStore>,
    pub mapper: Mapper,
    /// Upper bound for a request body, enforced by the body limit layer and the body read.
    pub max_body_bytes: usize,
}

impl AppState {
    pub fn new(registry: Registry, tokens: Arc<TokenStore>, mapper: Mapper) -> Self {
        AppState {
            registry: Arc::new(registry),
            tokens,
            mapper,
            max_body_bytes: 1_048_576,
        }
    }

    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }
}
