use std::fmt;

/// Liveness verdict of a single probe attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Up,
    Down,
    /// No probe exists for the monitor's type.
    Unknown,
    /// The probe could not evaluate the target (e.g. unreadable certificate).
    Error,
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Classification::Up => write!(f, "up"),
            Classification::Down => write!(f, "down"),
            Classification::Unknown => write!(f, "unknown"),
            Classification::Error => write!(f, "error"),
        }
    }
}

/// Result of a probe attempt
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeOutcome {
    pub classification: Classification,

    /// Measured wall-clock time of the network operation, in milliseconds
    pub response_time_ms: Option<f64>,

    /// Failure description or other human-readable context
    pub detail: Option<String>,

    /// Whole days until the peer certificate expires (negative once expired)
    pub cert_expiry_days: Option<i64>,

    /// HTTP status code (if applicable)
    pub status_code: Option<u16>,
}

impl ProbeOutcome {
    fn with_classification(classification: Classification) -> Self {
        Self {
            classification,
            response_time_ms: None,
            detail: None,
            cert_expiry_days: None,
            status_code: None,
        }
    }

    /// Target answered within the timeout
    pub fn up(response_time_ms: f64) -> Self {
        Self::with_classification(Classification::Up).with_response_time(response_time_ms)
    }

    /// Target unreachable or unhealthy
    pub fn down(detail: impl Into<String>) -> Self {
        Self::with_classification(Classification::Down).with_detail(detail)
    }

    pub fn unknown(detail: impl Into<String>) -> Self {
        Self::with_classification(Classification::Unknown).with_detail(detail)
    }

    pub fn error(detail: impl Into<String>) -> Self {
        Self::with_classification(Classification::Error).with_detail(detail)
    }

    pub fn with_response_time(mut self, response_time_ms: f64) -> Self {
        self.response_time_ms = Some(response_time_ms);
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_status_code(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }

    pub fn with_cert_expiry(mut self, days: i64) -> Self {
        self.cert_expiry_days = Some(days);
        self
    }

    pub fn is_up(&self) -> bool {
        self.classification == Classification::Up
    }

    pub fn is_down(&self) -> bool {
        self.classification == Classification::Down
    }
}
