use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use libsql::{Connection, Row, params};

use crate::error::{Error, Result};
use crate::models::{Heartbeat, Incident, Monitor, MonitorStatus, MonitorType, StatusPage};
use crate::pool::{LibsqlManager, LibsqlPool};
use crate::tracker::{IncidentAction, Transition};

const MONITOR_COLUMNS: &str = "id, name, type, target, interval_s, timeout_s, retries, status, up_since, \
     last_check, response_time_ms, cert_expiry_days, tags, created_at";
const INCIDENT_COLUMNS: &str = "id, monitor_id, started_at, resolved_at, duration_ms, cause, notified";
const HEARTBEAT_COLUMNS: &str = "monitor_id, timestamp, status, response_time_ms";
const STATUS_PAGE_COLUMNS: &str = "id, name, slug, monitors, description, logo_url, theme";

/// Storage interface the engine writes check results through
#[async_trait]
pub trait Database: Send + Sync {
    /// Persist a newly created monitor
    async fn insert_monitor(&self, monitor: &Monitor) -> Result<()>;

    /// Get a monitor by id
    async fn get_monitor(&self, id: &str) -> Result<Option<Monitor>>;

    /// All monitors, oldest first
    async fn list_monitors(&self) -> Result<Vec<Monitor>>;

    /// Monitors that take part in check cycles (everything not paused)
    async fn get_active_monitors(&self) -> Result<Vec<Monitor>>;

    /// Management status change (pause, resume, maintenance)
    async fn set_monitor_status(&self, id: &str, status: MonitorStatus) -> Result<()>;

    /// The unresolved incident of a monitor, if any
    async fn get_open_incident(&self, monitor_id: &str) -> Result<Option<Incident>>;

    /// Apply one check cycle atomically: monitor row, incident actions, heartbeat
    async fn apply_check(&self, transition: &Transition) -> Result<()>;

    async fn get_incident(&self, id: &str) -> Result<Option<Incident>>;

    /// Incidents newest first, optionally restricted to one monitor or to open ones
    async fn get_incidents(&self, monitor_id: Option<&str>, open_only: bool) -> Result<Vec<Incident>>;

    /// Mark an open incident resolved with the given record's resolution fields
    async fn close_incident(&self, resolved: &Incident) -> Result<()>;

    /// Incidents of a monitor that started strictly after `cutoff`
    async fn incidents_since(&self, monitor_id: &str, cutoff: DateTime<Utc>) -> Result<Vec<Incident>>;

    /// Heartbeats of a monitor recorded strictly after `cutoff`, oldest first
    async fn heartbeats_since(&self, monitor_id: &str, cutoff: DateTime<Utc>) -> Result<Vec<Heartbeat>>;

    /// The most recent `limit` heartbeats, returned oldest first
    async fn heartbeat_history(&self, monitor_id: &str, limit: usize) -> Result<Vec<Heartbeat>>;

    async fn insert_status_page(&self, page: &StatusPage) -> Result<()>;

    async fn get_status_page(&self, slug: &str) -> Result<Option<StatusPage>>;
}

/// LibSQL database implementation
pub struct DatabaseImpl {
    pool: LibsqlPool,
}

impl DatabaseImpl {
    /// Create a new database instance from a pool
    pub fn new_from_pool(pool: LibsqlPool) -> Self {
        Self { pool }
    }

    async fn get_conn(&self) -> Result<deadpool::managed::Object<LibsqlManager>> {
        Ok(self.pool.get().await?)
    }

    async fn query_monitors(&self, sql: &str, args: impl libsql::params::IntoParams) -> Result<Vec<Monitor>> {
        let conn = self.get_conn().await?;
        let mut rows = conn.query(sql, args).await?;
        let mut monitors = Vec::new();
        while let Some(row) = rows.next().await? {
            monitors.push(monitor_from_row(&row)?);
        }
        Ok(monitors)
    }

    async fn query_incidents(&self, sql: &str, args: impl libsql::params::IntoParams) -> Result<Vec<Incident>> {
        let conn = self.get_conn().await?;
        let mut rows = conn.query(sql, args).await?;
        let mut incidents = Vec::new();
        while let Some(row) = rows.next().await? {
            incidents.push(incident_from_row(&row)?);
        }
        Ok(incidents)
    }

    async fn query_heartbeats(&self, sql: &str, args: impl libsql::params::IntoParams) -> Result<Vec<Heartbeat>> {
        let conn = self.get_conn().await?;
        let mut rows = conn.query(sql, args).await?;
        let mut heartbeats = Vec::new();
        while let Some(row) = rows.next().await? {
            heartbeats.push(heartbeat_from_row(&row)?);
        }
        Ok(heartbeats)
    }
}

#[async_trait]
impl Database for DatabaseImpl {
    async fn insert_monitor(&self, monitor: &Monitor) -> Result<()> {
        let conn = self.get_conn().await?;
        let tags = serde_json::to_string(&monitor.tags)?;

        conn.execute(
            &format!("INSERT INTO monitors ({MONITOR_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"),
            params![
                monitor.id.clone(),
                monitor.name.clone(),
                monitor.monitor_type.as_str(),
                monitor.target.clone(),
                monitor.interval_seconds as i64,
                monitor.timeout_seconds as i64,
                monitor.retries as i64,
                monitor.status.as_str(),
                monitor.up_since.map(|t| t.timestamp_millis()),
                monitor.last_check.map(|t| t.timestamp_millis()),
                monitor.response_time_ms,
                monitor.cert_expiry_days,
                tags,
                monitor.created_at.timestamp_millis()
            ],
        )
        .await?;

        tracing::debug!(monitor = %monitor.id, "Inserted monitor");
        Ok(())
    }

    async fn get_monitor(&self, id: &str) -> Result<Option<Monitor>> {
        let monitors =
            self.query_monitors(&format!("SELECT {MONITOR_COLUMNS} FROM monitors WHERE id = ?"), params![id]).await?;
        Ok(monitors.into_iter().next())
    }

    async fn list_monitors(&self) -> Result<Vec<Monitor>> {
        self.query_monitors(&format!("SELECT {MONITOR_COLUMNS} FROM monitors ORDER BY created_at, id"), ()).await
    }

    async fn get_active_monitors(&self) -> Result<Vec<Monitor>> {
        self.query_monitors(
            &format!("SELECT {MONITOR_COLUMNS} FROM monitors WHERE status != ? ORDER BY created_at, id"),
            params![MonitorStatus::Paused.as_str()],
        )
        .await
    }

    async fn set_monitor_status(&self, id: &str, status: MonitorStatus) -> Result<()> {
        if matches!(status, MonitorStatus::Up | MonitorStatus::Down) {
            return Err(Error::InvalidInput(format!("Status '{status}' is only set by checks")));
        }

        let conn = self.get_conn().await?;
        let changed = conn
            .execute("UPDATE monitors SET status = ?, up_since = NULL WHERE id = ?", params![status.as_str(), id])
            .await?;
        if changed == 0 {
            return Err(Error::monitor_not_found(id));
        }
        Ok(())
    }

    async fn get_open_incident(&self, monitor_id: &str) -> Result<Option<Incident>> {
        let incidents = self
            .query_incidents(
                &format!(
                    "SELECT {INCIDENT_COLUMNS} FROM incidents WHERE monitor_id = ? AND resolved_at IS NULL \
                     ORDER BY started_at DESC LIMIT 1"
                ),
                params![monitor_id],
            )
            .await?;
        Ok(incidents.into_iter().next())
    }

    async fn apply_check(&self, transition: &Transition) -> Result<()> {
        let conn = self.get_conn().await?;
        let tx = conn.transaction().await?;

        let written = write_transition(&tx, transition).await;
        match written {
            Ok(()) => {
                tx.commit().await?;
                Ok(())
            }
            Err(e) => {
                if let Err(rollback) = tx.rollback().await {
                    tracing::error!(monitor = %transition.monitor_id, "Rollback failed: {}", rollback);
                }
                Err(e)
            }
        }
    }

    async fn get_incident(&self, id: &str) -> Result<Option<Incident>> {
        let incidents = self
            .query_incidents(&format!("SELECT {INCIDENT_COLUMNS} FROM incidents WHERE id = ?"), params![id])
            .await?;
        Ok(incidents.into_iter().next())
    }

    async fn get_incidents(&self, monitor_id: Option<&str>, open_only: bool) -> Result<Vec<Incident>> {
        let open_filter = if open_only { " AND resolved_at IS NULL" } else { "" };
        match monitor_id {
            Some(monitor_id) => {
                self.query_incidents(
                    &format!(
                        "SELECT {INCIDENT_COLUMNS} FROM incidents WHERE monitor_id = ?{open_filter} \
                         ORDER BY started_at DESC"
                    ),
                    params![monitor_id],
                )
                .await
            }
            None => {
                self.query_incidents(
                    &format!(
                        "SELECT {INCIDENT_COLUMNS} FROM incidents WHERE 1 = 1{open_filter} ORDER BY started_at DESC"
                    ),
                    (),
                )
                .await
            }
        }
    }

    async fn close_incident(&self, resolved: &Incident) -> Result<()> {
        let conn = self.get_conn().await?;
        write_close(&conn, resolved).await
    }

    async fn incidents_since(&self, monitor_id: &str, cutoff: DateTime<Utc>) -> Result<Vec<Incident>> {
        self.query_incidents(
            &format!(
                "SELECT {INCIDENT_COLUMNS} FROM incidents WHERE monitor_id = ? AND started_at > ? ORDER BY started_at"
            ),
            params![monitor_id, cutoff.timestamp_millis()],
        )
        .await
    }

    async fn heartbeats_since(&self, monitor_id: &str, cutoff: DateTime<Utc>) -> Result<Vec<Heartbeat>> {
        self.query_heartbeats(
            &format!(
                "SELECT {HEARTBEAT_COLUMNS} FROM heartbeats WHERE monitor_id = ? AND timestamp > ? \
                 ORDER BY timestamp, id"
            ),
            params![monitor_id, cutoff.timestamp_millis()],
        )
        .await
    }

    async fn heartbeat_history(&self, monitor_id: &str, limit: usize) -> Result<Vec<Heartbeat>> {
        let mut heartbeats = self
            .query_heartbeats(
                &format!(
                    "SELECT {HEARTBEAT_COLUMNS} FROM heartbeats WHERE monitor_id = ? \
                     ORDER BY timestamp DESC, id DESC LIMIT ?"
                ),
                params![monitor_id, limit as i64],
            )
            .await?;
        heartbeats.reverse();
        Ok(heartbeats)
    }

    async fn insert_status_page(&self, page: &StatusPage) -> Result<()> {
        let conn = self.get_conn().await?;
        let monitors = serde_json::to_string(&page.monitors)?;

        conn.execute(
            &format!("INSERT INTO status_pages ({STATUS_PAGE_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?)"),
            params![
                page.id.clone(),
                page.name.clone(),
                page.slug.clone(),
                monitors,
                page.description.clone(),
                page.logo_url.clone(),
                page.theme.clone()
            ],
        )
        .await?;
        Ok(())
    }

    async fn get_status_page(&self, slug: &str) -> Result<Option<StatusPage>> {
        let conn = self.get_conn().await?;
        let mut rows = conn
            .query(&format!("SELECT {STATUS_PAGE_COLUMNS} FROM status_pages WHERE slug = ?"), params![slug])
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(status_page_from_row(&row)?)),
            None => Ok(None),
        }
    }
}

/// All writes of one check cycle, run inside the caller's transaction.
async fn write_transition(conn: &Connection, transition: &Transition) -> Result<()> {
    let changed = conn
        .execute(
            "UPDATE monitors SET status = ?, up_since = ?, last_check = ?, response_time_ms = ?, \
             cert_expiry_days = COALESCE(?, cert_expiry_days) WHERE id = ?",
            params![
                transition.status.as_str(),
                transition.up_since.map(|t| t.timestamp_millis()),
                transition.checked_at.timestamp_millis(),
                transition.response_time_ms,
                transition.cert_expiry_days,
                transition.monitor_id.clone()
            ],
        )
        .await?;
    if changed == 0 {
        return Err(Error::monitor_not_found(&transition.monitor_id));
    }

    for action in &transition.incident_actions {
        match action {
            IncidentAction::Close(resolved) => write_close(conn, resolved).await?,
            IncidentAction::Open(incident) => {
                conn.execute(
                    &format!("INSERT INTO incidents ({INCIDENT_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?)"),
                    params![
                        incident.id.clone(),
                        incident.monitor_id.clone(),
                        incident.started_at.timestamp_millis(),
                        incident.resolved_at.map(|t| t.timestamp_millis()),
                        incident.duration.map(|d| d.num_milliseconds()),
                        incident.cause.clone(),
                        incident.notified as i64
                    ],
                )
                .await?;
            }
        }
    }

    let heartbeat = &transition.heartbeat;
    conn.execute(
        "INSERT INTO heartbeats (monitor_id, timestamp, status, response_time_ms) VALUES (?, ?, ?, ?)",
        params![
            heartbeat.monitor_id.clone(),
            heartbeat.timestamp.timestamp_millis(),
            heartbeat.status.as_str(),
            heartbeat.response_time_ms
        ],
    )
    .await?;

    Ok(())
}

async fn write_close(conn: &Connection, resolved: &Incident) -> Result<()> {
    let resolved_at = resolved
        .resolved_at
        .ok_or_else(|| Error::InvalidInput(format!("Incident '{}' has no resolution time", resolved.id)))?;
    let duration = resolved.duration.unwrap_or_else(|| resolved.elapsed(resolved_at));

    conn.execute(
        "UPDATE incidents SET resolved_at = ?, duration_ms = ? WHERE id = ? AND resolved_at IS NULL",
        params![resolved_at.timestamp_millis(), duration.num_milliseconds(), resolved.id.clone()],
    )
    .await?;
    Ok(())
}

fn timestamp(table: &'static str, millis: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| Error::Corrupt { table, reason: format!("timestamp {millis} out of range") })
}

fn optional_timestamp(table: &'static str, millis: Option<i64>) -> Result<Option<DateTime<Utc>>> {
    millis.map(|millis| timestamp(table, millis)).transpose()
}

fn non_negative(table: &'static str, column: &str, value: i64) -> Result<u64> {
    u64::try_from(value).map_err(|_| Error::Corrupt { table, reason: format!("negative {column}: {value}") })
}

fn monitor_from_row(row: &Row) -> Result<Monitor> {
    const TABLE: &str = "monitors";
    let tags: String = row.get(12)?;

    Ok(Monitor {
        id: row.get(0)?,
        name: row.get(1)?,
        monitor_type: MonitorType::from_tag(&row.get::<String>(2)?),
        target: row.get(3)?,
        interval_seconds: non_negative(TABLE, "interval_s", row.get(4)?)?,
        timeout_seconds: non_negative(TABLE, "timeout_s", row.get(5)?)?,
        retries: u32::try_from(row.get::<i64>(6)?)
            .map_err(|e| Error::Corrupt { table: TABLE, reason: format!("retries: {e}") })?,
        status: MonitorStatus::from_tag(&row.get::<String>(7)?),
        up_since: optional_timestamp(TABLE, row.get(8)?)?,
        last_check: optional_timestamp(TABLE, row.get(9)?)?,
        response_time_ms: row.get(10)?,
        cert_expiry_days: row.get(11)?,
        tags: serde_json::from_str(&tags)
            .map_err(|e| Error::Corrupt { table: TABLE, reason: format!("tags: {e}") })?,
        created_at: timestamp(TABLE, row.get(13)?)?,
    })
}

fn incident_from_row(row: &Row) -> Result<Incident> {
    const TABLE: &str = "incidents";

    Ok(Incident {
        id: row.get(0)?,
        monitor_id: row.get(1)?,
        started_at: timestamp(TABLE, row.get(2)?)?,
        resolved_at: optional_timestamp(TABLE, row.get(3)?)?,
        duration: row.get::<Option<i64>>(4)?.map(TimeDelta::milliseconds),
        cause: row.get(5)?,
        notified: row.get::<i64>(6)? != 0,
    })
}

fn heartbeat_from_row(row: &Row) -> Result<Heartbeat> {
    Ok(Heartbeat {
        monitor_id: row.get(0)?,
        timestamp: timestamp("heartbeats", row.get(1)?)?,
        status: MonitorStatus::from_tag(&row.get::<String>(2)?),
        response_time_ms: row.get(3)?,
    })
}

fn status_page_from_row(row: &Row) -> Result<StatusPage> {
    let monitors: String = row.get(3)?;

    Ok(StatusPage {
        id: row.get(0)?,
        name: row.get(1)?,
        slug: row.get(2)?,
        monitors: serde_json::from_str(&monitors)
            .map_err(|e| Error::Corrupt { table: "status_pages", reason: format!("monitors: {e}") })?,
        description: row.get(4)?,
        logo_url: row.get(5)?,
        theme: row.get(6)?,
    })
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::monitoring::ProbeOutcome;
    use crate::tracker::{PriorState, advance};

    async fn create_test_database() -> (DatabaseImpl, TempDir) {
        let temp_dir = tempfile::tempdir().unwrap();
        let db = crate::database::open_database(&temp_dir.path().join("test.db"), 4).await.unwrap();
        (db, temp_dir)
    }

    async fn check(db: &DatabaseImpl, monitor_id: &str, outcome: ProbeOutcome, now: DateTime<Utc>) -> Transition {
        let monitor = db.get_monitor(monitor_id).await.unwrap().unwrap();
        let open = db.get_open_incident(monitor_id).await.unwrap();
        let transition = advance(monitor_id, &PriorState::of(&monitor, open), &outcome, now);
        db.apply_check(&transition).await.unwrap();
        transition
    }

    #[tokio::test]
    async fn test_monitor_round_trip() {
        let (db, _dir) = create_test_database().await;
        let monitor = Monitor::new("api", MonitorType::Http, "https://example.com")
            .with_interval(30)
            .with_retries(2)
            .with_tags(["prod", "edge"]);
        db.insert_monitor(&monitor).await.unwrap();

        let stored = db.get_monitor(&monitor.id).await.unwrap().unwrap();
        assert_eq!(stored.name, "api");
        assert_eq!(stored.monitor_type, MonitorType::Http);
        assert_eq!(stored.interval_seconds, 30);
        assert_eq!(stored.retries, 2);
        assert!(stored.tags.contains("edge"));
        assert_eq!(stored.created_at.timestamp_millis(), monitor.created_at.timestamp_millis());
        assert!(db.get_monitor("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unknown_type_and_status_decode_leniently() {
        let (db, _dir) = create_test_database().await;
        let conn = db.get_conn().await.unwrap();
        conn.execute(
            "INSERT INTO monitors (id, name, type, target, status, created_at) \
             VALUES ('legacy', 'old', 'push', 'token', 'degraded', 0)",
            (),
        )
        .await
        .unwrap();

        let monitor = db.get_monitor("legacy").await.unwrap().unwrap();
        assert_eq!(monitor.monitor_type, MonitorType::Unsupported("push".into()));
        assert_eq!(monitor.status, MonitorStatus::Unknown);
    }

    #[tokio::test]
    async fn test_paused_monitors_are_not_active() {
        let (db, _dir) = create_test_database().await;
        let a = Monitor::new("a", MonitorType::Tcp, "localhost:1");
        let b = Monitor::new("b", MonitorType::Tcp, "localhost:2");
        db.insert_monitor(&a).await.unwrap();
        db.insert_monitor(&b).await.unwrap();

        db.set_monitor_status(&b.id, MonitorStatus::Paused).await.unwrap();
        let active: Vec<_> = db.get_active_monitors().await.unwrap().into_iter().map(|m| m.id).collect();
        assert_eq!(active, vec![a.id.clone()]);

        assert!(db.set_monitor_status("missing", MonitorStatus::Paused).await.unwrap_err().is_not_found());
        assert!(db.set_monitor_status(&a.id, MonitorStatus::Up).await.is_err());
    }

    #[tokio::test]
    async fn test_apply_check_persists_incident_lifecycle() {
        let (db, _dir) = create_test_database().await;
        let monitor = Monitor::new("api", MonitorType::Http, "https://example.com");
        db.insert_monitor(&monitor).await.unwrap();
        let t0 = DateTime::from_timestamp(1_700_000_000, 0).unwrap();

        check(&db, &monitor.id, ProbeOutcome::up(50.0), t0).await;
        let stored = db.get_monitor(&monitor.id).await.unwrap().unwrap();
        assert_eq!(stored.status, MonitorStatus::Up);
        assert_eq!(stored.up_since, Some(t0));

        let down_at = t0 + TimeDelta::seconds(60);
        check(&db, &monitor.id, ProbeOutcome::down("timeout"), down_at).await;
        check(&db, &monitor.id, ProbeOutcome::down("timeout"), down_at + TimeDelta::seconds(60)).await;
        let open = db.get_open_incident(&monitor.id).await.unwrap().unwrap();
        assert_eq!(open.cause, "timeout");
        assert_eq!(db.get_incidents(Some(&monitor.id), false).await.unwrap().len(), 1);

        let up_at = down_at + TimeDelta::milliseconds(90_500);
        check(&db, &monitor.id, ProbeOutcome::up(40.0), up_at).await;
        let resolved = db.get_incident(&open.id).await.unwrap().unwrap();
        assert_eq!(resolved.resolved_at, Some(up_at));
        assert_eq!(resolved.duration, Some(TimeDelta::milliseconds(90_500)));
        assert!(db.get_incidents(None, true).await.unwrap().is_empty());

        let history = db.heartbeat_history(&monitor.id, 10).await.unwrap();
        let statuses: Vec<_> = history.iter().map(|h| h.status).collect();
        assert_eq!(
            statuses,
            vec![MonitorStatus::Up, MonitorStatus::Down, MonitorStatus::Down, MonitorStatus::Up]
        );
    }

    #[tokio::test]
    async fn test_cert_expiry_keeps_last_known_value() {
        let (db, _dir) = create_test_database().await;
        let monitor = Monitor::new("site", MonitorType::Http, "https://example.com");
        db.insert_monitor(&monitor).await.unwrap();
        let now = Utc::now();

        check(&db, &monitor.id, ProbeOutcome::up(10.0).with_cert_expiry(42), now).await;
        check(&db, &monitor.id, ProbeOutcome::up(12.0), now + TimeDelta::seconds(60)).await;

        let stored = db.get_monitor(&monitor.id).await.unwrap().unwrap();
        assert_eq!(stored.cert_expiry_days, Some(42));
        assert_eq!(stored.response_time_ms, Some(12.0));
    }

    #[tokio::test]
    async fn test_apply_check_for_missing_monitor_writes_nothing() {
        let (db, _dir) = create_test_database().await;
        let transition = advance("ghost", &PriorState::default(), &ProbeOutcome::up(1.0), Utc::now());

        let err = db.apply_check(&transition).await.unwrap_err();
        assert!(err.is_not_found());
        assert!(db.heartbeat_history("ghost", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_heartbeat_history_returns_latest_oldest_first() {
        let (db, _dir) = create_test_database().await;
        let monitor = Monitor::new("api", MonitorType::Tcp, "localhost:80");
        db.insert_monitor(&monitor).await.unwrap();
        let t0 = DateTime::from_timestamp(1_700_000_000, 0).unwrap();

        for i in 0..5 {
            check(&db, &monitor.id, ProbeOutcome::up(i as f64), t0 + TimeDelta::seconds(i)).await;
        }

        let history = db.heartbeat_history(&monitor.id, 3).await.unwrap();
        let times: Vec<_> = history.iter().map(|h| h.response_time_ms).collect();
        assert_eq!(times, vec![Some(2.0), Some(3.0), Some(4.0)]);

        let since = db.heartbeats_since(&monitor.id, t0 + TimeDelta::seconds(3)).await.unwrap();
        assert_eq!(since.len(), 1);
    }

    #[tokio::test]
    async fn test_status_page_round_trip() {
        let (db, _dir) = create_test_database().await;
        let page = StatusPage::new("Public", "public", vec!["a1".into(), "b2".into()]);
        db.insert_status_page(&page).await.unwrap();

        let stored = db.get_status_page("public").await.unwrap().unwrap();
        assert_eq!(stored, page);
        assert!(db.get_status_page("nope").await.unwrap().is_none());

        let duplicate = StatusPage::new("Other", "public", vec![]);
        assert!(db.insert_status_page(&duplicate).await.is_err());
    }
}
