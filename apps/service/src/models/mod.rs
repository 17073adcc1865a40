//! Domain records shared by the engine and the storage collaborator.

pub mod incident;
pub mod monitor;
pub mod status_page;

pub use incident::{Heartbeat, Incident};
pub use monitor::{Monitor, MonitorId, MonitorStatus, MonitorType};
pub use status_page::StatusPage;

/// Short opaque identifier (8 hex characters) for monitors, incidents and pages.
pub fn generate_id() -> String {
    let mut id = uuid::Uuid::new_v4().simple().to_string();
    id.truncate(8);
    id
}
