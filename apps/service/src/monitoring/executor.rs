use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use tokio::time::timeout;
use tracing::{debug, warn};

use super::checker::{CertProbe, DnsProbe, HttpProbe, PingProbe, Probe, TcpProbe};
use super::types::ProbeOutcome;
use crate::models::{Monitor, MonitorType};

/// Check dispatcher - routes a monitor to the probe registered for its type
///
/// Holds no per-monitor state. Types without a registered probe are reported
/// as `unknown` rather than being routed to some other probe.
pub struct CheckDispatcher {
    probes: HashMap<MonitorType, Arc<dyn Probe>>,
}

impl CheckDispatcher {
    /// Create a dispatcher with the built-in probe for every supported type
    pub fn new() -> Result<Self> {
        let http: Arc<dyn Probe> = Arc::new(HttpProbe::new()?);
        Ok(Self::empty()
            .with_probe(MonitorType::Http, http)
            .with_probe(MonitorType::Tcp, Arc::new(TcpProbe))
            .with_probe(MonitorType::Ping, Arc::new(PingProbe))
            .with_probe(MonitorType::Dns, Arc::new(DnsProbe))
            .with_probe(MonitorType::Cert, Arc::new(CertProbe)))
    }

    /// Create a dispatcher with no probes registered
    pub fn empty() -> Self {
        Self { probes: HashMap::new() }
    }

    /// Register (or replace) the probe for a supported monitor type.
    ///
    /// Unsupported tags cannot be given a probe and are ignored.
    pub fn with_probe(mut self, monitor_type: MonitorType, probe: Arc<dyn Probe>) -> Self {
        if monitor_type.is_supported() {
            self.probes.insert(monitor_type, probe);
        } else {
            warn!("Refusing to register a probe for unsupported type '{monitor_type}'");
        }
        self
    }

    pub fn supports(&self, monitor_type: &MonitorType) -> bool {
        self.probes.contains_key(monitor_type)
    }

    /// Execute one probe attempt for `monitor`, bounded by its timeout.
    ///
    /// An attempt still running at the deadline is dropped and reported as
    /// `down`.
    pub async fn dispatch(&self, monitor: &Monitor) -> ProbeOutcome {
        let Some(probe) = self.probes.get(&monitor.monitor_type) else {
            warn!(
                monitor_id = %monitor.id,
                "No probe for monitor type '{}'", monitor.monitor_type
            );
            return ProbeOutcome::unknown(format!(
                "Unsupported monitor type '{}'",
                monitor.monitor_type
            ));
        };

        let limit = monitor.timeout();
        debug!(monitor_id = %monitor.id, target = %monitor.target, "Dispatching {} probe", monitor.monitor_type);

        match timeout(limit, probe.probe(&monitor.target, limit)).await {
            Ok(outcome) => outcome,
            Err(_) => ProbeOutcome::down(format!("timed out after {}s", limit.as_secs())),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::monitoring::types::Classification;

    struct FixedProbe(ProbeOutcome);

    #[async_trait::async_trait]
    impl Probe for FixedProbe {
        async fn probe(&self, _target: &str, _timeout: Duration) -> ProbeOutcome {
            self.0.clone()
        }
    }

    struct HangingProbe;

    #[async_trait::async_trait]
    impl Probe for HangingProbe {
        async fn probe(&self, _target: &str, _timeout: Duration) -> ProbeOutcome {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_unsupported_type_is_unknown() {
        let dispatcher = CheckDispatcher::empty()
            .with_probe(MonitorType::Ping, Arc::new(FixedProbe(ProbeOutcome::up(1.0))));
        let monitor = Monitor::new("push", MonitorType::from_tag("push"), "example.com");

        let outcome = dispatcher.dispatch(&monitor).await;
        assert_eq!(outcome.classification, Classification::Unknown);
        assert!(outcome.detail.unwrap().contains("push"));
    }

    #[tokio::test]
    async fn test_unregistered_supported_type_is_unknown() {
        let dispatcher = CheckDispatcher::empty()
            .with_probe(MonitorType::Ping, Arc::new(FixedProbe(ProbeOutcome::up(1.0))));
        let monitor = Monitor::new("dns", MonitorType::Dns, "example.com");

        let outcome = dispatcher.dispatch(&monitor).await;
        assert_eq!(outcome.classification, Classification::Unknown);
    }

    #[tokio::test]
    async fn test_routes_by_type() {
        let dispatcher = CheckDispatcher::empty()
            .with_probe(MonitorType::Tcp, Arc::new(FixedProbe(ProbeOutcome::up(3.0))))
            .with_probe(MonitorType::Dns, Arc::new(FixedProbe(ProbeOutcome::down("nxdomain"))));

        let tcp = Monitor::new("tcp", MonitorType::Tcp, "example.com:80");
        let dns = Monitor::new("dns", MonitorType::Dns, "example.com");

        assert!(dispatcher.dispatch(&tcp).await.is_up());
        assert_eq!(dispatcher.dispatch(&dns).await.detail.as_deref(), Some("nxdomain"));
    }

    #[tokio::test]
    async fn test_hanging_probe_times_out_as_down() {
        let dispatcher =
            CheckDispatcher::empty().with_probe(MonitorType::Http, Arc::new(HangingProbe));
        let monitor = Monitor::new("slow", MonitorType::Http, "http://example.com").with_timeout(1);

        let outcome = tokio::time::timeout(Duration::from_secs(5), dispatcher.dispatch(&monitor))
            .await
            .expect("dispatch must resolve at the probe timeout");
        assert!(outcome.is_down());
        assert_eq!(outcome.detail.as_deref(), Some("timed out after 1s"));
    }

    #[test]
    fn test_default_table_covers_supported_types() {
        let dispatcher = CheckDispatcher::new().unwrap();
        for kind in MonitorType::SUPPORTED {
            assert!(dispatcher.supports(&kind), "missing probe for {kind}");
        }
        assert!(!dispatcher.supports(&MonitorType::from_tag("push")));
    }
}
