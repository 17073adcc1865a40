use chrono::Utc;
use libsql::Connection;

use crate::error::Result;

/// Schema version - increment when making schema changes
const SCHEMA_VERSION: i32 = 2;

/// Run database migrations
///
/// Migrations are additive and recorded in `schema_migrations`, so running
/// them against an up-to-date database is a no-op.
pub async fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL,
            description TEXT
        )",
        (),
    )
    .await?;

    let current_version = get_current_version(conn).await?;

    if current_version >= SCHEMA_VERSION {
        tracing::debug!("Database schema is up to date (version {})", current_version);
        return Ok(());
    }

    tracing::info!("Running migrations from version {} to {}", current_version, SCHEMA_VERSION);

    if current_version < 1 {
        run_migration_v1(conn).await?;
        record_migration(conn, 1, "Initial schema").await?;
    }

    if current_version < 2 {
        run_migration_v2(conn).await?;
        record_migration(conn, 2, "Enforce a single open incident per monitor").await?;
    }

    tracing::info!("Database migrations completed (now at version {})", SCHEMA_VERSION);
    Ok(())
}

/// Highest applied migration, 0 for a fresh database
pub async fn get_current_version(conn: &Connection) -> Result<i32> {
    let mut rows = conn.query("SELECT MAX(version) FROM schema_migrations", ()).await?;

    match rows.next().await? {
        Some(row) => Ok(row.get::<Option<i32>>(0)?.unwrap_or(0)),
        None => Ok(0),
    }
}

async fn record_migration(conn: &Connection, version: i32, description: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO schema_migrations (version, applied_at, description) VALUES (?, ?, ?)",
        libsql::params![version, Utc::now().timestamp_millis(), description],
    )
    .await?;

    tracing::info!("Applied migration v{}: {}", version, description);
    Ok(())
}

/// Migration v1: monitors, heartbeats, incidents and status pages.
/// Timestamps are Unix milliseconds.
async fn run_migration_v1(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS monitors (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            type TEXT NOT NULL,
            target TEXT NOT NULL,
            interval_s INTEGER NOT NULL DEFAULT 60,
            timeout_s INTEGER NOT NULL DEFAULT 10,
            retries INTEGER NOT NULL DEFAULT 0,
            status TEXT NOT NULL DEFAULT 'unknown',
            up_since INTEGER,
            last_check INTEGER,
            response_time_ms REAL,
            cert_expiry_days INTEGER,
            tags TEXT NOT NULL DEFAULT '[]',
            created_at INTEGER NOT NULL
        )",
        (),
    )
    .await?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS heartbeats (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            monitor_id TEXT NOT NULL,
            timestamp INTEGER NOT NULL,
            status TEXT NOT NULL,
            response_time_ms REAL,
            FOREIGN KEY (monitor_id) REFERENCES monitors(id) ON DELETE CASCADE
        )",
        (),
    )
    .await?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS incidents (
            id TEXT PRIMARY KEY,
            monitor_id TEXT NOT NULL,
            started_at INTEGER NOT NULL,
            resolved_at INTEGER,
            duration_ms INTEGER,
            cause TEXT NOT NULL DEFAULT '',
            notified INTEGER NOT NULL DEFAULT 0,
            FOREIGN KEY (monitor_id) REFERENCES monitors(id) ON DELETE CASCADE
        )",
        (),
    )
    .await?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS status_pages (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            slug TEXT NOT NULL UNIQUE,
            monitors TEXT NOT NULL DEFAULT '[]',
            description TEXT NOT NULL DEFAULT '',
            logo_url TEXT NOT NULL DEFAULT '',
            theme TEXT NOT NULL DEFAULT 'light'
        )",
        (),
    )
    .await?;

    conn.execute("CREATE INDEX IF NOT EXISTS idx_monitors_status ON monitors(status)", ()).await?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_heartbeats_monitor_timestamp ON heartbeats(monitor_id, timestamp DESC)",
        (),
    )
    .await?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_incidents_monitor_started ON incidents(monitor_id, started_at DESC)",
        (),
    )
    .await?;

    Ok(())
}

/// Migration v2: a partial unique index so storage itself rejects a second
/// open incident for the same monitor.
async fn run_migration_v2(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_incidents_one_open
            ON incidents(monitor_id) WHERE resolved_at IS NULL",
        (),
    )
    .await?;

    tracing::info!("Added open-incident uniqueness index");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_connection() -> Connection {
        let db = libsql::Builder::new_local(":memory:").build().await.unwrap();
        db.connect().unwrap()
    }

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let conn = memory_connection().await;

        run_migrations(&conn).await.unwrap();
        run_migrations(&conn).await.unwrap();

        assert_eq!(get_current_version(&conn).await.unwrap(), SCHEMA_VERSION);
        let mut rows = conn.query("SELECT COUNT(*) FROM schema_migrations", ()).await.unwrap();
        let count: i64 = rows.next().await.unwrap().unwrap().get(0).unwrap();
        assert_eq!(count, SCHEMA_VERSION as i64);
    }

    #[tokio::test]
    async fn test_second_open_incident_is_rejected() {
        let conn = memory_connection().await;
        run_migrations(&conn).await.unwrap();

        conn.execute(
            "INSERT INTO monitors (id, name, type, target, created_at) VALUES ('m1', 'api', 'http', 'https://x', 0)",
            (),
        )
        .await
        .unwrap();
        conn.execute("INSERT INTO incidents (id, monitor_id, started_at) VALUES ('i1', 'm1', 1)", ())
            .await
            .unwrap();

        let second =
            conn.execute("INSERT INTO incidents (id, monitor_id, started_at) VALUES ('i2', 'm1', 2)", ()).await;
        assert!(second.is_err());

        conn.execute("UPDATE incidents SET resolved_at = 3, duration_ms = 2 WHERE id = 'i1'", ())
            .await
            .unwrap();
        conn.execute("INSERT INTO incidents (id, monitor_id, started_at) VALUES ('i2', 'm1', 4)", ())
            .await
            .unwrap();
    }
}
