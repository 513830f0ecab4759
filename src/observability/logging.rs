//! Structured logging.
//!
//! `RUST_LOG` wins when set. Otherwise the verbose switch decides whether
//! structural diagnostics (route registration, reload steps, watch
//! re-registration) are shown; they are all emitted at `debug`.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter directives for the given verbosity.
pub fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        "stub_server=debug,tower_http=debug"
    } else {
        "stub_server=info,tower_http=warn"
    }
}

/// Install the global tracing subscriber.
pub fn init(verbose: bool) {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_directives(verbose).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directives_parse() {
        for verbose in [true, false] {
            assert!(EnvFilter::try_new(default_directives(verbose)).is_ok());
        }
    }
}
