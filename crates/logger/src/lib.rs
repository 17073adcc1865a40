//! Shared tracing setup for the uptime binaries.

mod subscriber;

pub use subscriber::{init, init_with_level};
pub use tracing::level_filters::LevelFilter;
