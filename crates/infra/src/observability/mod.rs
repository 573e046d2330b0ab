//! Tracing initialisation

use tracing_subscriber::{fmt, EnvFilter};

/// Initialise the global tracing subscriber.
///
/// Filtering follows `RUST_LOG`, defaulting to `info`. JSON output is for
/// deployments that ship logs to an aggregator; the pretty format is for
/// local development. Calling this twice is harmless: the second
/// initialisation is ignored.
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = fmt().with_env_filter(filter).with_target(true);

    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    if result.is_err() {
        tracing::debug!("tracing subscriber already initialised");
    }
}
