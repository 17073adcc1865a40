//! Incident lifecycle: turns a probe outcome into a status transition.
//!
//! Decisions depend only on the previously persisted state and the new
//! outcome, so a log of `(prior, outcome)` pairs replays deterministically.

use chrono::{DateTime, Utc};

use crate::models::{Heartbeat, Incident, Monitor, MonitorId, MonitorStatus};
use crate::monitoring::{Classification, ProbeOutcome};

/// Persisted state of a monitor before a check is applied
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriorState {
    pub status: MonitorStatus,
    pub up_since: Option<DateTime<Utc>>,
    pub open_incident: Option<Incident>,
}

impl PriorState {
    pub fn of(monitor: &Monitor, open_incident: Option<Incident>) -> Self {
        Self { status: monitor.status, up_since: monitor.up_since, open_incident }
    }
}

/// Incident change the storage collaborator must apply
#[derive(Debug, Clone, PartialEq)]
pub enum IncidentAction {
    /// Insert a new open incident
    Open(Incident),
    /// Mark an existing incident resolved; carries the resolved record
    Close(Incident),
}

/// Everything one check cycle writes for a monitor
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub monitor_id: MonitorId,
    pub previous_status: MonitorStatus,
    pub status: MonitorStatus,
    pub up_since: Option<DateTime<Utc>>,
    pub checked_at: DateTime<Utc>,
    pub response_time_ms: Option<f64>,
    pub cert_expiry_days: Option<i64>,
    /// Applied in order; a close always precedes an open.
    pub incident_actions: Vec<IncidentAction>,
    pub heartbeat: Heartbeat,
}

impl Transition {
    pub fn is_up(&self) -> bool {
        self.status == MonitorStatus::Up
    }

    pub fn opened_incident(&self) -> Option<&Incident> {
        self.incident_actions.iter().find_map(|action| match action {
            IncidentAction::Open(incident) => Some(incident),
            IncidentAction::Close(_) => None,
        })
    }

    pub fn closed_incident(&self) -> Option<&Incident> {
        self.incident_actions.iter().find_map(|action| match action {
            IncidentAction::Close(incident) => Some(incident),
            IncidentAction::Open(_) => None,
        })
    }
}

/// Advance a monitor's state machine by one probe outcome observed at `now`.
pub fn advance(
    monitor_id: &str,
    prior: &PriorState,
    outcome: &ProbeOutcome,
    now: DateTime<Utc>,
) -> Transition {
    let mut incident_actions = Vec::new();

    let (status, up_since) = match outcome.classification {
        Classification::Up => {
            let up_since = match (prior.status, prior.up_since) {
                (MonitorStatus::Up, Some(since)) => since,
                _ => now,
            };
            if let Some(open) = &prior.open_incident {
                incident_actions.push(IncidentAction::Close(open.clone().resolved(now)));
            }
            (MonitorStatus::Up, Some(up_since))
        }
        Classification::Down => {
            if prior.status == MonitorStatus::Up {
                if let Some(stale) = &prior.open_incident {
                    incident_actions.push(IncidentAction::Close(stale.clone().resolved(now)));
                }
                incident_actions.push(IncidentAction::Open(Incident::open(
                    monitor_id,
                    now,
                    outcome.detail.clone(),
                )));
            }
            (MonitorStatus::Down, None)
        }
        Classification::Unknown | Classification::Error => (MonitorStatus::Unknown, None),
    };

    Transition {
        monitor_id: monitor_id.to_string(),
        previous_status: prior.status,
        status,
        up_since,
        checked_at: now,
        response_time_ms: outcome.response_time_ms,
        cert_expiry_days: outcome.cert_expiry_days,
        incident_actions,
        heartbeat: Heartbeat {
            monitor_id: monitor_id.to_string(),
            timestamp: now,
            status,
            response_time_ms: outcome.response_time_ms,
        },
    }
}

/// Manual resolution of an incident at `now`; a resolved incident is returned unchanged.
pub fn resolve(incident: Incident, now: DateTime<Utc>) -> Incident {
    if incident.is_open() { incident.resolved(now) } else { incident }
}
