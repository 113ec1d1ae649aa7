//! Process configuration: JSON file, environment overrides, validation.

mod loader;
mod types;
mod validator;

pub use loader::{apply_env, load, load_from_path, parse, ENV_DATABASE_URL, ENV_LISTEN_ADDRESS, ENV_SITE_PREFIX};
pub use types::{AccessTokenConfig, Config};
pub use validator::{is_plain_identifier, validate};
