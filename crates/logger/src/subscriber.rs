use std::env::var;
use std::io;

use tracing::{level_filters::LevelFilter, warn};
use tracing_subscriber::{Layer, filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable selecting the log format (`json` or `compact`).
const LOG_FORMAT_VAR: &str = "UPTIME_LOG_FORMAT";

/// Initialize tracing at `WARN` unless `RUST_LOG` says otherwise.
///
/// The CLI prints its own results on stdout, so the default stays quiet.
pub fn init() {
    init_with_level(LevelFilter::WARN);
}

/// Initialize the tracing subscriber with `level` as the default directive.
///
/// Events are written to stderr. Calling this twice is harmless; the second
/// registration is ignored.
pub fn init_with_level(level: LevelFilter) {
    let env_filter = EnvFilter::builder().with_default_directive(level.into()).from_env_lossy();

    let log_format = var(LOG_FORMAT_VAR).unwrap_or_default();

    let log_layer = match log_format.as_str() {
        "json" => tracing_subscriber::fmt::layer()
            .json()
            .with_writer(io::stderr)
            .with_filter(env_filter)
            .boxed(),
        _ => tracing_subscriber::fmt::layer()
            .compact()
            .without_time()
            .with_writer(io::stderr)
            .with_filter(env_filter)
            .boxed(),
    };

    if let Err(error) = tracing_subscriber::registry().with(log_layer).try_init() {
        warn!("Tracing subscriber already installed: {error}");
    }
}
