//! Storage collaborator backed by libsql (SQLite).
//!
//! The engine only talks to the [`Database`] trait; SQL stays in this module.

pub mod migrations;
pub mod repository;

use std::path::Path;

pub use repository::{Database, DatabaseImpl};

use crate::error::Result;
use crate::pool::open_pool;

/// Initialize database with schema
pub async fn initialize_database(conn: &libsql::Connection) -> Result<()> {
    // journal_mode reports the resulting mode as a row
    conn.query("PRAGMA journal_mode = WAL", ()).await?.next().await?;
    migrations::run_migrations(conn).await
}

/// Open the database file at `path`, migrate it, and return the repository.
pub async fn open_database(path: &Path, max_connections: usize) -> Result<DatabaseImpl> {
    let pool = open_pool(path, max_connections).await?;
    {
        let conn = pool.get().await?;
        initialize_database(&conn).await?;
    }
    tracing::debug!("Opened database at {}", path.display());
    Ok(DatabaseImpl::new_from_pool(pool))
}
