use std::net::IpAddr;
use std::time::{Duration, Instant};

use anyhow::{Result, anyhow};
use surge_ping::{Client, Config, ICMP, PingIdentifier, PingSequence};
use tokio::net::{TcpStream, lookup_host};
use tokio::time::timeout;
use tracing::{debug, warn};

use super::cert;
use super::target::{host_of, is_secure_url, parse_host_port};
use super::types::ProbeOutcome;

const USER_AGENT: &str = concat!("uptime/", env!("CARGO_PKG_VERSION"));
const DEFAULT_TCP_PORT: u16 = 80;
const PING_PAYLOAD: [u8; 56] = [0; 56];
/// Time left unused by the certificate read so it ends before the dispatcher's deadline.
const CERTIFICATE_DEADLINE_MARGIN: Duration = Duration::from_millis(250);

/// A liveness probe for one kind of target.
///
/// Implementations never fail: every problem is folded into the returned
/// outcome.
#[async_trait::async_trait]
pub trait Probe: Send + Sync {
    /// Probe `target`, waiting at most `timeout`.
    async fn probe(&self, target: &str, timeout: Duration) -> ProbeOutcome;
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

/// HTTP/HTTPS checker
pub struct HttpProbe {
    client: reqwest::Client,
    certificate_port: u16,
}

impl HttpProbe {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { client, certificate_port: cert::TLS_PORT })
    }

    /// Read HTTPS certificates from `port` instead of 443.
    pub fn with_certificate_port(mut self, port: u16) -> Self {
        self.certificate_port = port;
        self
    }

    /// Days until the certificate of `host` expires, using what is left of
    /// an attempt that began at `started` with deadline `limit`.
    pub async fn read_certificate(&self, host: &str, started: Instant, limit: Duration) -> Result<i64> {
        let budget = certificate_budget(limit, started.elapsed())
            .ok_or_else(|| anyhow!("No time left to read the certificate of {host}"))?;
        let not_after = cert::fetch_not_after(host, self.certificate_port, budget).await?;
        Ok(cert::days_until(not_after, chrono::Utc::now()))
    }
}

/// Time the certificate read may take once `elapsed` of `limit` is spent.
///
/// Always ends at least [`CERTIFICATE_DEADLINE_MARGIN`] before `limit`;
/// `None` when that leaves nothing.
pub fn certificate_budget(limit: Duration, elapsed: Duration) -> Option<Duration> {
    limit
        .checked_sub(elapsed)?
        .checked_sub(CERTIFICATE_DEADLINE_MARGIN)
        .filter(|budget| !budget.is_zero())
}

/// Fold a certificate lookup into an HTTP outcome without touching liveness.
pub fn attach_certificate(outcome: ProbeOutcome, expiry: Result<i64>) -> ProbeOutcome {
    match expiry {
        Ok(days) => outcome.with_cert_expiry(days),
        Err(e) => {
            warn!("Certificate expiry unavailable: {e:#}");
            outcome
        }
    }
}

#[async_trait::async_trait]
impl Probe for HttpProbe {
    async fn probe(&self, target: &str, timeout: Duration) -> ProbeOutcome {
        let start = Instant::now();

        let response = match self.client.get(target).timeout(timeout).send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                return ProbeOutcome::down(format!("HTTP request timed out after {}s", timeout.as_secs()));
            }
            Err(e) => return ProbeOutcome::down(format!("HTTP request failed: {e}")),
        };

        let response_time = elapsed_ms(start);
        let status_code = response.status().as_u16();

        let outcome = if status_code < 400 {
            ProbeOutcome::up(response_time)
        } else {
            ProbeOutcome::down(format!("HTTP status {status_code}")).with_response_time(response_time)
        }
        .with_status_code(status_code);

        if !is_secure_url(target) {
            return outcome;
        }

        let expiry = match host_of(target) {
            Ok(host) => self.read_certificate(&host, start, timeout).await,
            Err(e) => Err(e),
        };
        attach_certificate(outcome, expiry)
    }
}

/// TCP port checker
pub struct TcpProbe;

#[async_trait::async_trait]
impl Probe for TcpProbe {
    async fn probe(&self, target: &str, limit: Duration) -> ProbeOutcome {
        let (host, port) = match parse_host_port(target, DEFAULT_TCP_PORT) {
            Ok(parts) => parts,
            Err(e) => return ProbeOutcome::down(format!("Invalid TCP target: {e}")),
        };

        let start = Instant::now();
        match timeout(limit, TcpStream::connect((host.as_str(), port))).await {
            Ok(Ok(_stream)) => ProbeOutcome::up(elapsed_ms(start)),
            Ok(Err(e)) => ProbeOutcome::down(format!("TCP connection failed: {e}")),
            Err(_) => ProbeOutcome::down(format!("TCP connection timed out after {}s", limit.as_secs())),
        }
    }
}

/// Resolve a host to its first address, accepting IP literals directly.
async fn resolve_first(host: &str) -> Result<IpAddr> {
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(ip);
    }
    lookup_host((host, 0))
        .await?
        .next()
        .map(|addr| addr.ip())
        .ok_or_else(|| anyhow!("DNS resolution returned no addresses for {host}"))
}

/// ICMP echo checker
///
/// Needs raw-socket privileges (or unprivileged ICMP sockets enabled by the
/// kernel); without them the probe reports `down` with the socket error.
pub struct PingProbe;

#[async_trait::async_trait]
impl Probe for PingProbe {
    async fn probe(&self, target: &str, limit: Duration) -> ProbeOutcome {
        let host = match host_of(target) {
            Ok(host) => host,
            Err(e) => return ProbeOutcome::down(format!("Invalid ping target: {e}")),
        };
        let ip = match timeout(limit, resolve_first(&host)).await {
            Ok(Ok(ip)) => ip,
            Ok(Err(e)) => return ProbeOutcome::down(format!("Failed to resolve {host}: {e}")),
            Err(_) => return ProbeOutcome::down(format!("Resolving {host} timed out")),
        };

        let config = match ip {
            IpAddr::V4(_) => Config::default(),
            IpAddr::V6(_) => Config::builder().kind(ICMP::V6).build(),
        };
        let client = match Client::new(&config) {
            Ok(client) => client,
            Err(e) => return ProbeOutcome::down(format!("ICMP socket unavailable: {e}")),
        };

        let mut pinger = client.pinger(ip, PingIdentifier(rand::random())).await;
        pinger.timeout(limit);

        match pinger.ping(PingSequence(0), &PING_PAYLOAD).await {
            Ok((_reply, rtt)) => {
                debug!(%ip, rtt_ms = rtt.as_secs_f64() * 1000.0, "Echo reply");
                ProbeOutcome::up(rtt.as_secs_f64() * 1000.0)
            }
            Err(e) => ProbeOutcome::down(format!("No echo reply from {ip}: {e}")),
        }
    }
}

/// Name-resolution checker
pub struct DnsProbe;

#[async_trait::async_trait]
impl Probe for DnsProbe {
    async fn probe(&self, target: &str, limit: Duration) -> ProbeOutcome {
        let host = match host_of(target) {
            Ok(host) => host,
            Err(e) => return ProbeOutcome::down(format!("Invalid DNS target: {e}")),
        };

        let start = Instant::now();
        match timeout(limit, lookup_host((host.as_str(), 0))).await {
            Ok(Ok(addrs)) => match addrs.count() {
                0 => ProbeOutcome::down(format!("No addresses found for {host}")),
                count => ProbeOutcome::up(elapsed_ms(start))
                    .with_detail(format!("Resolved {count} address(es)")),
            },
            Ok(Err(e)) => ProbeOutcome::down(format!("DNS resolution failed: {e}")),
            Err(_) => ProbeOutcome::down(format!("DNS resolution timed out after {}s", limit.as_secs())),
        }
    }
}

/// TLS certificate expiry checker
///
/// Failing to read the certificate is an `error`, not a `down`.
pub struct CertProbe;

#[async_trait::async_trait]
impl Probe for CertProbe {
    async fn probe(&self, target: &str, limit: Duration) -> ProbeOutcome {
        let host = match host_of(target) {
            Ok(host) => host,
            Err(e) => return ProbeOutcome::error(format!("Invalid certificate target: {e}")),
        };

        let start = Instant::now();
        let budget = certificate_budget(limit, Duration::ZERO).unwrap_or(limit);
        match cert::certificate_expiry_days(&host, budget).await {
            Ok(days) => ProbeOutcome::up(elapsed_ms(start)).with_cert_expiry(days),
            Err(e) => ProbeOutcome::error(format!("Certificate check failed: {e:#}")),
        }
    }
}
