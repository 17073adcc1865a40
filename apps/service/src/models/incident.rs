use chrono::{DateTime, TimeDelta, Utc};

use super::monitor::{MonitorId, MonitorStatus};

/// Fallback cause when a probe reported `down` without detail.
pub const DEFAULT_CAUSE: &str = "Monitor down";

/// A contiguous span during which a monitor was down
#[derive(Debug, Clone, PartialEq)]
pub struct Incident {
    pub id: String,
    pub monitor_id: MonitorId,
    pub started_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    /// `resolved_at - started_at`, present once resolved.
    pub duration: Option<TimeDelta>,
    pub cause: String,
    pub notified: bool,
}

impl Incident {
    /// Open a new incident starting at `started_at`
    pub fn open(monitor_id: impl Into<MonitorId>, started_at: DateTime<Utc>, cause: Option<String>) -> Self {
        Self {
            id: super::generate_id(),
            monitor_id: monitor_id.into(),
            started_at,
            resolved_at: None,
            duration: None,
            cause: cause.filter(|c| !c.trim().is_empty()).unwrap_or_else(|| DEFAULT_CAUSE.to_string()),
            notified: false,
        }
    }

    pub fn is_open(&self) -> bool {
        self.resolved_at.is_none()
    }

    /// Time between `started_at` and `at`, never negative.
    pub fn elapsed(&self, at: DateTime<Utc>) -> TimeDelta {
        (at - self.started_at).max(TimeDelta::zero())
    }

    /// Return a resolved copy, closed at `at`.
    pub fn resolved(mut self, at: DateTime<Utc>) -> Self {
        self.duration = Some(self.elapsed(at));
        self.resolved_at = Some(at);
        self
    }
}

/// One timestamped probe result recorded for a monitor
#[derive(Debug, Clone, PartialEq)]
pub struct Heartbeat {
    pub monitor_id: MonitorId,
    pub timestamp: DateTime<Utc>,
    pub status: MonitorStatus,
    pub response_time_ms: Option<f64>,
}
