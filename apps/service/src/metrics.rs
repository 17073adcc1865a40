//! Uptime and latency figures derived from stored history.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::database::Database;
use crate::error::{Error, Result};
use crate::models::{Heartbeat, Incident};

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Longest uptime window accepted by [`MetricsAggregator`]
pub const MAX_UPTIME_DAYS: u32 = 36_500;
/// Longest response-time window accepted by [`MetricsAggregator`]
pub const MAX_RESPONSE_HOURS: u32 = 876_000;

/// How still-open incidents count towards downtime
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OpenIncidentPolicy {
    /// Only resolved incidents contribute downtime.
    #[default]
    Exclude,
    /// Open incidents contribute the time elapsed since they started.
    IncludeElapsed,
}

impl fmt::Display for OpenIncidentPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpenIncidentPolicy::Exclude => write!(f, "exclude"),
            OpenIncidentPolicy::IncludeElapsed => write!(f, "include-elapsed"),
        }
    }
}

/// `now` minus `span`, saturating at the earliest representable instant.
fn window_start(now: DateTime<Utc>, span: Option<TimeDelta>) -> DateTime<Utc> {
    span.and_then(|span| now.checked_sub_signed(span)).unwrap_or(DateTime::<Utc>::MIN_UTC)
}

fn days_before(now: DateTime<Utc>, days: u32) -> DateTime<Utc> {
    window_start(now, TimeDelta::try_days(i64::from(days)))
}

fn hours_before(now: DateTime<Utc>, hours: u32) -> DateTime<Utc> {
    window_start(now, TimeDelta::try_hours(i64::from(hours)))
}

fn ensure_window(value: u32, max: u32, unit: &str) -> Result<()> {
    if value > max {
        return Err(Error::InvalidInput(format!("Window too long: {value} {unit} (maximum: {max})")));
    }
    Ok(())
}

/// Uptime percentage over the `days` before `now`.
///
/// Downtime is the summed duration of incidents that started strictly after
/// the window start. The result is clamped at 0; a zero-day window is 100.
pub fn uptime_percentage(
    incidents: &[Incident],
    days: u32,
    now: DateTime<Utc>,
    policy: OpenIncidentPolicy,
) -> f64 {
    if days == 0 {
        return 100.0;
    }

    let window_start = days_before(now, days);
    let down_ms: i64 = incidents
        .iter()
        .filter(|incident| incident.started_at > window_start)
        .map(|incident| match (incident.duration, policy) {
            (Some(duration), _) => duration.num_milliseconds(),
            (None, OpenIncidentPolicy::IncludeElapsed) => incident.elapsed(now).num_milliseconds(),
            (None, OpenIncidentPolicy::Exclude) => 0,
        })
        .sum();

    let window_ms = f64::from(days) * MILLIS_PER_DAY;
    ((1.0 - down_ms as f64 / window_ms) * 100.0).max(0.0)
}

/// Mean of the non-null response times, 0 when there are none
pub fn average_response_time(heartbeats: &[Heartbeat]) -> f64 {
    ResponseStats::from_heartbeats(heartbeats).mean
}

/// Summary of response times over a window
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ResponseStats {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

impl ResponseStats {
    pub fn from_heartbeats(heartbeats: &[Heartbeat]) -> Self {
        let samples: Vec<f64> = heartbeats.iter().filter_map(|h| h.response_time_ms).collect();
        if samples.is_empty() {
            return Self::default();
        }

        let (min, max, sum) = samples
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY, 0.0), |(min, max, sum), &v| (min.min(v), max.max(v), sum + v));

        Self { count: samples.len(), min, max, mean: sum / samples.len() as f64 }
    }
}

/// Read-side aggregation over a store
pub struct MetricsAggregator {
    store: Arc<dyn Database>,
    policy: OpenIncidentPolicy,
}

impl MetricsAggregator {
    pub fn new(store: Arc<dyn Database>, policy: OpenIncidentPolicy) -> Self {
        Self { store, policy }
    }

    async fn ensure_monitor(&self, monitor_id: &str) -> Result<()> {
        match self.store.get_monitor(monitor_id).await? {
            Some(_) => Ok(()),
            None => Err(Error::monitor_not_found(monitor_id)),
        }
    }

    pub async fn uptime(&self, monitor_id: &str, days: u32) -> Result<f64> {
        self.uptime_at(monitor_id, days, Utc::now()).await
    }

    pub async fn uptime_at(&self, monitor_id: &str, days: u32, now: DateTime<Utc>) -> Result<f64> {
        ensure_window(days, MAX_UPTIME_DAYS, "days")?;
        self.ensure_monitor(monitor_id).await?;
        let window_start = days_before(now, days);
        let incidents = self.store.incidents_since(monitor_id, window_start).await?;
        Ok(uptime_percentage(&incidents, days, now, self.policy))
    }

    pub async fn average_response_time(&self, monitor_id: &str, hours: u32) -> Result<f64> {
        Ok(self.response_stats(monitor_id, hours).await?.mean)
    }

    pub async fn response_stats(&self, monitor_id: &str, hours: u32) -> Result<ResponseStats> {
        self.response_stats_at(monitor_id, hours, Utc::now()).await
    }

    pub async fn response_stats_at(
        &self,
        monitor_id: &str,
        hours: u32,
        now: DateTime<Utc>,
    ) -> Result<ResponseStats> {
        ensure_window(hours, MAX_RESPONSE_HOURS, "hours")?;
        self.ensure_monitor(monitor_id).await?;
        let cutoff = hours_before(now, hours);
        let heartbeats = self.store.heartbeats_since(monitor_id, cutoff).await?;
        Ok(ResponseStats::from_heartbeats(&heartbeats))
    }

    /// Last `limit` heartbeats, oldest first
    pub async fn history(&self, monitor_id: &str, limit: usize) -> Result<Vec<Heartbeat>> {
        self.ensure_monitor(monitor_id).await?;
        self.store.heartbeat_history(monitor_id, limit).await
    }
}
