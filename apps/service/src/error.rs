use thiserror::Error;

/// Errors surfaced by the storage collaborator and the engine's read paths.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Database query failed: {0}")]
    Database(#[from] libsql::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A persisted row could not be decoded into a domain value.
    #[error("Corrupt {table} row: {reason}")]
    Corrupt { table: &'static str, reason: String },
}

impl Error {
    pub fn monitor_not_found(id: impl Into<String>) -> Self {
        Self::NotFound { kind: "monitor", id: id.into() }
    }

    pub fn incident_not_found(id: impl Into<String>) -> Self {
        Self::NotFound { kind: "incident", id: id.into() }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<deadpool::managed::PoolError<libsql::Error>> for Error {
    fn from(error: deadpool::managed::PoolError<libsql::Error>) -> Self {
        Self::Pool(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
