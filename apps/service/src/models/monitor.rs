use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::Error;

pub type MonitorId = String;

/// Kind of target a monitor observes.
///
/// Persisted tags outside the supported set are kept as `Unsupported` so the
/// dispatcher can flag them instead of guessing a probe.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MonitorType {
    Http,
    Tcp,
    Ping,
    Dns,
    Cert,
    Unsupported(String),
}

impl MonitorType {
    pub const SUPPORTED: [MonitorType; 5] =
        [MonitorType::Http, MonitorType::Tcp, MonitorType::Ping, MonitorType::Dns, MonitorType::Cert];

    /// Decode a persisted tag, keeping unknown tags verbatim.
    pub fn from_tag(tag: &str) -> Self {
        tag.parse().unwrap_or_else(|_| MonitorType::Unsupported(tag.to_string()))
    }

    pub fn as_str(&self) -> &str {
        match self {
            MonitorType::Http => "http",
            MonitorType::Tcp => "tcp",
            MonitorType::Ping => "ping",
            MonitorType::Dns => "dns",
            MonitorType::Cert => "cert",
            MonitorType::Unsupported(tag) => tag,
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, MonitorType::Unsupported(_))
    }
}

impl FromStr for MonitorType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http" | "https" => Ok(MonitorType::Http),
            "tcp" => Ok(MonitorType::Tcp),
            "ping" | "icmp" => Ok(MonitorType::Ping),
            "dns" => Ok(MonitorType::Dns),
            "cert" | "tls" => Ok(MonitorType::Cert),
            other => Err(Error::InvalidInput(format!(
                "Unsupported monitor type '{other}'. Must be one of http, tcp, ping, dns, cert"
            ))),
        }
    }
}

impl fmt::Display for MonitorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Liveness state of a monitor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MonitorStatus {
    #[default]
    Unknown,
    Up,
    Down,
    Paused,
    Maintenance,
}

impl MonitorStatus {
    /// Decode a persisted status; anything unrecognised counts as `Unknown`.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "up" => MonitorStatus::Up,
            "down" => MonitorStatus::Down,
            "paused" => MonitorStatus::Paused,
            "maintenance" => MonitorStatus::Maintenance,
            _ => MonitorStatus::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MonitorStatus::Unknown => "unknown",
            MonitorStatus::Up => "up",
            MonitorStatus::Down => "down",
            MonitorStatus::Paused => "paused",
            MonitorStatus::Maintenance => "maintenance",
        }
    }
}

impl fmt::Display for MonitorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Monitor model - a configured target under periodic observation
#[derive(Debug, Clone, PartialEq)]
pub struct Monitor {
    pub id: MonitorId,
    pub name: String,
    pub monitor_type: MonitorType,
    pub target: String,
    pub interval_seconds: u64,
    pub timeout_seconds: u64,
    /// Extra attempts allowed by the `confirm-down` retry policy.
    pub retries: u32,
    pub status: MonitorStatus,
    /// Set only while `status` is `Up`.
    pub up_since: Option<DateTime<Utc>>,
    pub last_check: Option<DateTime<Utc>>,
    pub response_time_ms: Option<f64>,
    pub cert_expiry_days: Option<i64>,
    pub tags: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
}

impl Monitor {
    pub const DEFAULT_INTERVAL_SECONDS: u64 = 60;
    pub const DEFAULT_TIMEOUT_SECONDS: u64 = 10;

    /// Create a new monitor in the `unknown` state
    pub fn new(name: impl Into<String>, monitor_type: MonitorType, target: impl Into<String>) -> Self {
        Self {
            id: super::generate_id(),
            name: name.into(),
            monitor_type,
            target: target.into(),
            interval_seconds: Self::DEFAULT_INTERVAL_SECONDS,
            timeout_seconds: Self::DEFAULT_TIMEOUT_SECONDS,
            retries: 0,
            status: MonitorStatus::Unknown,
            up_since: None,
            last_check: None,
            response_time_ms: None,
            cert_expiry_days: None,
            tags: BTreeSet::new(),
            created_at: Utc::now(),
        }
    }

    pub fn with_interval(mut self, seconds: u64) -> Self {
        self.interval_seconds = seconds;
        self
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Upper bound for a single probe attempt
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.max(1))
    }

    pub fn is_paused(&self) -> bool {
        self.status == MonitorStatus::Paused
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monitor_type_parsing() {
        assert_eq!("http".parse::<MonitorType>().unwrap(), MonitorType::Http);
        assert_eq!("HTTPS".parse::<MonitorType>().unwrap(), MonitorType::Http);
        assert_eq!("icmp".parse::<MonitorType>().unwrap(), MonitorType::Ping);
        assert!("push".parse::<MonitorType>().is_err());
    }

    #[test]
    fn test_unknown_tags_are_preserved() {
        let kind = MonitorType::from_tag("push");
        assert_eq!(kind, MonitorType::Unsupported("push".to_string()));
        assert_eq!(kind.as_str(), "push");
        assert!(!kind.is_supported());
    }

    #[test]
    fn test_unrecognised_status_is_unknown() {
        assert_eq!(MonitorStatus::from_tag("degraded"), MonitorStatus::Unknown);
        assert_eq!(MonitorStatus::from_tag(""), MonitorStatus::Unknown);
        assert_eq!(MonitorStatus::from_tag("paused"), MonitorStatus::Paused);
    }

    #[test]
    fn test_new_monitor_defaults() {
        let monitor = Monitor::new("site", MonitorType::Http, "https://example.com");
        assert_eq!(monitor.id.len(), 8);
        assert_eq!(monitor.status, MonitorStatus::Unknown);
        assert!(monitor.up_since.is_none());
        assert_eq!(monitor.interval_seconds, 60);
        assert_eq!(monitor.timeout(), Duration::from_secs(10));
    }
}
