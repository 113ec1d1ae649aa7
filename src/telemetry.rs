//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

/// Directive used when `RUST_LOG` is unset.
pub fn default_directive(debug: bool) -> &'static str {
    if debug {
        "resource_sdk=trace"
    } else {
        "resource_sdk=info"
    }
}

/// Install a fmt subscriber filtered by `RUST_LOG`, else by [`default_directive`].
/// A second call leaves the first subscriber in place.
pub fn init_tracing(debug: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive(debug)));
    if tracing_subscriber::fmt().with_env_filter(filter).try_init().is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_raises_level() {
        assert_eq!(default_directive(true), "resource_sdk=trace");
        assert_eq!(default_directive(false), "resource_sdk=info");
    }

    #[test]
    fn init_twice_is_harmless() {
        init_tracing(false);
        init_tracing(true);
    }
}
