use super::monitor::MonitorId;

/// Public status page: a read-only grouping of monitors.
///
/// The engine never mutates pages; they are managed externally.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusPage {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub monitors: Vec<MonitorId>,
    pub description: String,
    pub logo_url: String,
    pub theme: String,
}

impl StatusPage {
    pub fn new(name: impl Into<String>, slug: impl Into<String>, monitors: Vec<MonitorId>) -> Self {
        Self {
            id: super::generate_id(),
            name: name.into(),
            slug: slug.into(),
            monitors,
            description: String::new(),
            logo_url: String::new(),
            theme: "light".to_string(),
        }
    }
}
