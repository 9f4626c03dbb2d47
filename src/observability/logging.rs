//! Structured logging.
//!
//! Both binaries install the same subscriber: an `EnvFilter` taken from
//! `RUST_LOG` when set, otherwise from the supplied directives, plus a plain
//! `fmt` layer writing to stderr.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global tracing subscriber.
///
/// Calling this twice is harmless; the second installation is ignored.
pub fn init(default_directives: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

/// Build filter directives for the crate from a configured log level.
pub fn directives_for(level: &str) -> String {
    format!("pool_janitor={level}")
}
