//! End-to-end check cycles against a real libsql file and local sockets.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use futures::future::join_all;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use uptime_service::database::{Database, open_database};
use uptime_service::metrics::{MetricsAggregator, OpenIncidentPolicy};
use uptime_service::models::{Monitor, MonitorStatus, MonitorType};
use uptime_service::monitoring::checker::{HttpProbe, TcpProbe, attach_certificate};
use uptime_service::monitoring::{CheckDispatcher, Classification, Probe, ProbeOutcome};
use uptime_service::runner::Runner;

async fn open_store(dir: &TempDir) -> Arc<dyn Database> {
    Arc::new(open_database(&dir.path().join("uptime.db"), 4).await.unwrap())
}

/// Answer every connection with `200 OK` until the task is dropped.
async fn http_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = [0u8; 1024];
                let _ = socket.read(&mut buf).await;
                let _ = socket
                    .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 0\r\nconnection: close\r\n\r\n")
                    .await;
            });
        }
    });
    format!("http://{addr}/")
}

#[tokio::test]
async fn tcp_outage_opens_and_recovery_closes_incident() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir).await;

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let target = listener.local_addr().unwrap().to_string();
    let monitor = Monitor::new("db", MonitorType::Tcp, target.clone()).with_timeout(2);
    store.insert_monitor(&monitor).await.unwrap();

    let dispatcher = CheckDispatcher::empty().with_probe(MonitorType::Tcp, Arc::new(TcpProbe));
    let runner = Runner::new(store.clone(), Arc::new(dispatcher));

    let first = runner.check_all().await.unwrap();
    assert_eq!(first.get(&monitor.id), Some(&true));

    drop(listener);
    let second = runner.check_all().await.unwrap();
    assert_eq!(second.get(&monitor.id), Some(&false));

    let open = store.get_open_incident(&monitor.id).await.unwrap().unwrap();
    assert!(open.cause.starts_with("TCP connection failed"));

    let aggregator = MetricsAggregator::new(store.clone(), OpenIncidentPolicy::Exclude);
    assert_eq!(aggregator.uptime(&monitor.id, 30).await.unwrap(), 100.0);
    let strict = MetricsAggregator::new(store.clone(), OpenIncidentPolicy::IncludeElapsed);
    assert!(strict.uptime_at(&monitor.id, 1, Utc::now() + chrono::TimeDelta::hours(1)).await.unwrap() < 100.0);

    // Rebinding the same port is not guaranteed, so recovery is resolved by hand.
    let resolved = runner.resolve_incident(&open.id).await.unwrap();
    assert!(resolved.duration.unwrap() >= chrono::TimeDelta::zero());
    assert!(store.get_incidents(None, true).await.unwrap().is_empty());

    let stats = aggregator.response_stats(&monitor.id, 1).await.unwrap();
    assert_eq!(stats.count, 1);
    let history = aggregator.history(&monitor.id, 10).await.unwrap();
    assert_eq!(history.iter().map(|h| h.status).collect::<Vec<_>>(), vec![MonitorStatus::Up, MonitorStatus::Down]);
}

#[tokio::test]
async fn http_recovery_tracks_up_since() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir).await;
    let url = http_server().await;
    let monitor = Monitor::new("web", MonitorType::Http, url);
    store.insert_monitor(&monitor).await.unwrap();

    let dispatcher = CheckDispatcher::empty().with_probe(MonitorType::Http, Arc::new(HttpProbe::new().unwrap()));
    let runner = Runner::new(store.clone(), Arc::new(dispatcher));

    let first = runner.check_monitor(&monitor.id).await.unwrap().unwrap();
    let second = runner.check_monitor(&monitor.id).await.unwrap().unwrap();
    assert!(first.is_up() && second.is_up());
    let millis = |t: Option<chrono::DateTime<Utc>>| t.map(|t| t.timestamp_millis());
    assert_eq!(millis(second.up_since), millis(first.up_since));

    let stored = store.get_monitor(&monitor.id).await.unwrap().unwrap();
    assert_eq!(stored.status, MonitorStatus::Up);
    assert!(stored.response_time_ms.is_some());
    assert!(store.get_incidents(Some(&monitor.id), false).await.unwrap().is_empty());
}

/// HTTP liveness from one server, certificate from a peer that never completes a handshake.
struct HttpsWithStalledCertificate {
    http: HttpProbe,
    url: String,
}

#[async_trait]
impl Probe for HttpsWithStalledCertificate {
    async fn probe(&self, _target: &str, timeout: Duration) -> ProbeOutcome {
        let started = Instant::now();
        let outcome = self.http.probe(&self.url, timeout).await;
        let expiry = self.http.read_certificate("127.0.0.1", started, timeout).await;
        attach_certificate(outcome, expiry)
    }
}

#[tokio::test]
async fn failed_certificate_read_leaves_monitor_up() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir).await;

    let url = http_server().await;
    let stalled = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let probe = HttpsWithStalledCertificate {
        http: HttpProbe::new().unwrap().with_certificate_port(stalled.local_addr().unwrap().port()),
        url,
    };

    let monitor = Monitor::new("shop", MonitorType::Http, "https://shop.example").with_timeout(1);
    store.insert_monitor(&monitor).await.unwrap();
    let dispatcher = Arc::new(CheckDispatcher::empty().with_probe(MonitorType::Http, Arc::new(probe)));

    // Every attempt must finish inside the dispatcher deadline, not race it.
    let outcomes = join_all((0..50).map(|_| dispatcher.dispatch(&monitor))).await;
    let down: Vec<_> = outcomes.iter().filter(|o| o.classification != Classification::Up).collect();
    assert!(down.is_empty(), "healthy target reported {down:?}");
    assert!(outcomes.iter().all(|o| o.cert_expiry_days.is_none()));

    let runner = Runner::new(store.clone(), dispatcher);
    let transition = runner.check_monitor(&monitor.id).await.unwrap().unwrap();
    assert!(transition.is_up());
    assert_eq!(transition.cert_expiry_days, None);
    assert!(store.get_incidents(Some(&monitor.id), false).await.unwrap().is_empty());

    let stored = store.get_monitor(&monitor.id).await.unwrap().unwrap();
    assert_eq!(stored.cert_expiry_days, None);
    drop(stalled);
}
