//! Typed errors. Client-facing status mapping lives in `response`; everything here is a 500 once it reaches a client.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid path pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("config load: {0}")]
    Load(String),
    #[error("validation: {0}")]
    Validation(String),
}

/// Failures of the record mapper. Query and decode failures keep the driver error as their source.
#[derive(Error, Debug)]
pub enum MapperError {
    /// The caller handed the mapper something it cannot map. Raised before the store is touched.
    #[error("mapper misuse: {0}")]
    Misuse(String),
    #[error("no database connection configured")]
    NoConnection,
    #[error("not found: {0}")]
    NotFound(String),
    #[error("{operation} failed: {source}")]
    Query {
        operation: &'static str,
        #[source]
        source: sqlx::Error,
    },
    #[error("failed to decode row from {table}: {source}")]
    Decode {
        table: String,
        #[source]
        source: sqlx::Error,
    },
}

impl MapperError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, MapperError::NotFound(_))
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Mapper(#[from] MapperError),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("internal: {0}")]
    Internal(String),
}
