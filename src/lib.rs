//! Resource SDK: one routing/dispatch engine and one record mapper shared by
//! many REST resource types backed by PostgreSQL.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod extractors;
pub mod mapper;
pub mod outcome;
pub mod request;
pub mod resource;
pub mod response;
pub mod router;
pub mod routes;
pub mod server;
pub mod sql;
pub mod state;
pub mod store;
pub mod telemetry;
pub mod tokens;

/// Re-exported for `impl_record!` expansions.
pub use sqlx;

pub use config::{load, Config};
pub use error::{AppError, ConfigError, MapperError};
pub use mapper::{Mapper, Record};
pub use outcome::Outcome;
pub use request::{Method, Request};
pub use resource::{Creatable, Deletable, Endpoint, Readable, Writable};
pub use router::Registry;
pub use routes::service_routes;
pub use server::{build_state, serve};
pub use sql::{Selector, SqlValue};
pub use state::AppState;
pub use telemetry::init_tracing;
pub use tokens::{AccessTokenEntry, TokenStore};
