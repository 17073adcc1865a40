//! Uptime monitoring engine: probes, incident tracking, and availability metrics.

pub mod config;
pub mod database;
pub mod error;
pub mod metrics;
pub mod models;
pub mod monitoring;
pub mod pool;
pub mod runner;
pub mod tracker;

pub use error::{Error, Result};
