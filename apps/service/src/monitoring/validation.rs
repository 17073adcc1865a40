//! Monitor-type specific validation applied when monitors are created.

use url::Url;

use super::target::{host_of, parse_host_port};
use crate::error::{Error, Result};
use crate::models::{Monitor, MonitorType};

const MIN_INTERVAL: u64 = 10; // 10 seconds
const MAX_INTERVAL: u64 = 86_400; // 24 hours
const MIN_TIMEOUT: u64 = 1;
const MAX_TIMEOUT: u64 = 300; // 5 minutes

fn invalid(msg: impl Into<String>) -> Error {
    Error::InvalidInput(msg.into())
}

/// Validate a monitor before it is handed to storage
pub fn validate_monitor(monitor: &Monitor) -> Result<()> {
    if monitor.name.trim().is_empty() {
        return Err(invalid("Monitor name cannot be empty"));
    }
    validate_monitor_target(&monitor.target, &monitor.monitor_type)?;
    validate_check_interval(monitor.interval_seconds)?;
    validate_timeout(monitor.timeout_seconds)
}

/// Validates a monitor target based on its type
pub fn validate_monitor_target(target: &str, monitor_type: &MonitorType) -> Result<()> {
    if target.trim().is_empty() {
        return Err(invalid("Target cannot be empty"));
    }

    match monitor_type {
        MonitorType::Http => validate_http_target(target),
        MonitorType::Tcp => parse_host_port(target, 80)
            .map(|_| ())
            .map_err(|e| invalid(format!("TCP target must be host[:port]: {e}"))),
        MonitorType::Ping | MonitorType::Dns => validate_host_target(target),
        MonitorType::Cert => {
            host_of(target).map(|_| ()).map_err(|e| invalid(format!("Invalid certificate target: {e}")))
        }
        MonitorType::Unsupported(tag) => Err(invalid(format!("Unsupported check type: {tag}"))),
    }
}

/// Validate HTTP/HTTPS target
fn validate_http_target(target: &str) -> Result<()> {
    let url = Url::parse(target).map_err(|e| {
        if target.contains("://") {
            invalid(format!("Invalid URL: {e}"))
        } else {
            invalid("URL must include scheme (http:// or https://)")
        }
    })?;

    match url.scheme() {
        "http" | "https" => {}
        other => return Err(invalid(format!("Invalid scheme '{other}'. Must be http or https"))),
    }

    if url.host_str().is_none() {
        return Err(invalid("URL must have a valid host"));
    }

    Ok(())
}

/// Validate a bare hostname or IP literal
fn validate_host_target(target: &str) -> Result<()> {
    if target.contains("://") || target.contains('/') {
        return Err(invalid("Expected a hostname or IP address, not a URL"));
    }
    if target.chars().any(char::is_whitespace) {
        return Err(invalid("Hostname cannot contain whitespace"));
    }
    Ok(())
}

/// Validate check interval bounds
pub fn validate_check_interval(interval_seconds: u64) -> Result<()> {
    if interval_seconds < MIN_INTERVAL {
        return Err(invalid(format!(
            "Check interval too short: {interval_seconds} seconds (minimum: {MIN_INTERVAL})"
        )));
    }

    if interval_seconds > MAX_INTERVAL {
        return Err(invalid(format!(
            "Check interval too long: {interval_seconds} seconds (maximum: {MAX_INTERVAL})"
        )));
    }

    Ok(())
}

/// Validate timeout is reasonable
pub fn validate_timeout(timeout_seconds: u64) -> Result<()> {
    if timeout_seconds < MIN_TIMEOUT {
        return Err(invalid(format!(
            "Timeout too short: {timeout_seconds} seconds (minimum: {MIN_TIMEOUT})"
        )));
    }

    if timeout_seconds > MAX_TIMEOUT {
        return Err(invalid(format!(
            "Timeout too long: {timeout_seconds} seconds (maximum: {MAX_TIMEOUT})"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_http_target() {
        assert!(validate_http_target("https://example.com").is_ok());
        assert!(validate_http_target("http://example.com:8080/health").is_ok());

        assert!(validate_http_target("example.com").is_err());
        assert!(validate_http_target("ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_targets_per_type() {
        assert!(validate_monitor_target("example.com:5432", &MonitorType::Tcp).is_ok());
        assert!(validate_monitor_target("example.com", &MonitorType::Tcp).is_ok());
        assert!(validate_monitor_target("example.com:", &MonitorType::Tcp).is_err());

        assert!(validate_monitor_target("1.1.1.1", &MonitorType::Ping).is_ok());
        assert!(validate_monitor_target("https://example.com", &MonitorType::Dns).is_err());

        assert!(validate_monitor_target("https://example.com", &MonitorType::Cert).is_ok());
        assert!(validate_monitor_target("example.com", &MonitorType::Cert).is_ok());

        assert!(validate_monitor_target("x", &MonitorType::from_tag("push")).is_err());
        assert!(validate_monitor_target("  ", &MonitorType::Http).is_err());
    }

    #[test]
    fn test_validate_check_interval() {
        assert!(validate_check_interval(10).is_ok());
        assert!(validate_check_interval(60).is_ok());
        assert!(validate_check_interval(86400).is_ok());

        assert!(validate_check_interval(5).is_err());
        assert!(validate_check_interval(100000).is_err());
    }

    #[test]
    fn test_validate_timeout() {
        assert!(validate_timeout(10).is_ok());
        assert!(validate_timeout(0).is_err());
        assert!(validate_timeout(301).is_err());
    }

    #[test]
    fn test_validate_monitor_rejects_blank_name() {
        let monitor = Monitor::new(" ", MonitorType::Http, "https://example.com");
        assert!(validate_monitor(&monitor).is_err());
    }
}
