//! Check cycle orchestration: dispatch, advance, persist.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::database::Database;
use crate::error::{Error, Result};
use crate::models::{Incident, Monitor, MonitorId};
use crate::monitoring::{CheckDispatcher, ProbeOutcome};
use crate::tracker::{self, PriorState, Transition};

pub const DEFAULT_PARALLELISM: usize = 16;

/// What a monitor's retry budget means to a check cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RetryPolicy {
    /// One attempt per cycle; the budget is informational.
    #[default]
    Advisory,
    /// A `down` attempt is repeated up to `retries` more times before it counts.
    ConfirmDown,
}

impl fmt::Display for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryPolicy::Advisory => write!(f, "advisory"),
            RetryPolicy::ConfirmDown => write!(f, "confirm-down"),
        }
    }
}

/// Runs check cycles for stored monitors
pub struct Runner {
    store: Arc<dyn Database>,
    dispatcher: Arc<CheckDispatcher>,
    /// Per-monitor locks serializing read-modify-write of monitor state
    locks: DashMap<MonitorId, Arc<Mutex<()>>>,
    parallelism: usize,
    retry_policy: RetryPolicy,
}

impl Runner {
    pub fn new(store: Arc<dyn Database>, dispatcher: Arc<CheckDispatcher>) -> Self {
        Self {
            store,
            dispatcher,
            locks: DashMap::new(),
            parallelism: DEFAULT_PARALLELISM,
            retry_policy: RetryPolicy::default(),
        }
    }

    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism.max(1);
        self
    }

    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    fn lock_for(&self, monitor_id: &str) -> Arc<Mutex<()>> {
        self.locks.entry(monitor_id.to_string()).or_default().clone()
    }

    /// Check every monitor that is not paused; returns monitor id -> is up.
    ///
    /// Monitors whose check fails at the storage layer are logged and
    /// reported as not up. Monitors paused or removed mid-cycle are omitted.
    pub async fn check_all(&self) -> Result<BTreeMap<MonitorId, bool>> {
        let monitors = self.store.get_active_monitors().await?;
        debug!("Checking {} monitors with parallelism {}", monitors.len(), self.parallelism);

        let results: Vec<(MonitorId, Result<Option<Transition>>)> = stream::iter(monitors)
            .map(|monitor| async move {
                let result = self.check_monitor(&monitor.id).await;
                (monitor.id, result)
            })
            .buffer_unordered(self.parallelism)
            .collect()
            .await;

        let mut summary = BTreeMap::new();
        for (monitor_id, result) in results {
            match result {
                Ok(Some(transition)) => {
                    summary.insert(monitor_id, transition.is_up());
                }
                Ok(None) => debug!(monitor = %monitor_id, "Skipped paused monitor"),
                Err(e) if e.is_not_found() => debug!(monitor = %monitor_id, "Monitor removed during cycle"),
                Err(e) => {
                    error!(monitor = %monitor_id, "Check failed: {}", e);
                    summary.insert(monitor_id, false);
                }
            }
        }

        Ok(summary)
    }

    /// Check one monitor and persist the result.
    ///
    /// Returns `None` when the monitor is paused.
    pub async fn check_monitor(&self, monitor_id: &str) -> Result<Option<Transition>> {
        let lock = self.lock_for(monitor_id);
        let _guard = lock.lock().await;

        let monitor = self.store.get_monitor(monitor_id).await?.ok_or_else(|| Error::monitor_not_found(monitor_id))?;
        if monitor.is_paused() {
            return Ok(None);
        }

        let outcome = self.probe(&monitor).await;
        let now = Utc::now();
        let open_incident = self.store.get_open_incident(monitor_id).await?;
        let transition = tracker::advance(monitor_id, &PriorState::of(&monitor, open_incident), &outcome, now);

        self.store.apply_check(&transition).await?;

        let summary = outcome.detail.clone().unwrap_or_else(|| outcome.classification.to_string());
        info!(
            monitor = %monitor.id,
            status = %transition.status,
            response_time_ms = ?transition.response_time_ms,
            "{} ({}) checked: {}",
            monitor.name,
            monitor.monitor_type,
            summary
        );
        if let Some(incident) = transition.opened_incident() {
            info!(monitor = %monitor.id, incident = %incident.id, "Incident opened: {}", incident.cause);
        }
        if let Some(incident) = transition.closed_incident() {
            info!(monitor = %monitor.id, incident = %incident.id, "Incident resolved");
        }

        Ok(Some(transition))
    }

    async fn probe(&self, monitor: &Monitor) -> ProbeOutcome {
        let mut outcome = self.dispatcher.dispatch(monitor).await;
        if self.retry_policy == RetryPolicy::ConfirmDown {
            for attempt in 1..=monitor.retries {
                if !outcome.is_down() {
                    break;
                }
                debug!(monitor = %monitor.id, attempt, "Down, retrying");
                outcome = self.dispatcher.dispatch(monitor).await;
            }
        }
        outcome
    }

    async fn find_incident(&self, incident_id: &str) -> Result<Incident> {
        self.store.get_incident(incident_id).await?.ok_or_else(|| Error::incident_not_found(incident_id))
    }

    /// Resolve an incident by hand.
    ///
    /// Missing incidents are an error; already resolved ones come back unchanged.
    pub async fn resolve_incident(&self, incident_id: &str) -> Result<Incident> {
        let monitor_id = self.find_incident(incident_id).await?.monitor_id;
        let lock = self.lock_for(&monitor_id);
        let _guard = lock.lock().await;

        let incident = self.find_incident(incident_id).await?;
        if !incident.is_open() {
            return Ok(incident);
        }
        let resolved = tracker::resolve(incident, Utc::now());
        self.store.close_incident(&resolved).await?;
        info!(incident = %resolved.id, monitor = %resolved.monitor_id, "Incident resolved manually");
        Ok(resolved)
    }
}
