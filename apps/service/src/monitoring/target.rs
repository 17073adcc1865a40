//! Parsing of monitor targets into hosts and ports.

use anyhow::{Result, anyhow};
use url::Url;

/// Split `host[:port]` into its parts, using `default_port` when absent.
///
/// Bracketed IPv6 (`[::1]:8080`) is accepted; a bare IPv6 literal is taken
/// as a host without port.
pub fn parse_host_port(target: &str, default_port: u16) -> Result<(String, u16)> {
    let target = target.trim();
    if target.is_empty() {
        return Err(anyhow!("Target cannot be empty"));
    }

    if let Some(rest) = target.strip_prefix('[') {
        let (host, after) =
            rest.split_once(']').ok_or_else(|| anyhow!("Unterminated IPv6 literal in '{target}'"))?;
        let port = match after.strip_prefix(':') {
            Some(port) => parse_port(port)?,
            None if after.is_empty() => default_port,
            None => return Err(anyhow!("Unexpected characters after IPv6 literal in '{target}'")),
        };
        return Ok((host.to_string(), port));
    }

    match target.split_once(':') {
        // More than one colon without brackets: an IPv6 literal.
        Some((_, rest)) if rest.contains(':') => Ok((target.to_string(), default_port)),
        Some((host, port)) if !host.is_empty() => Ok((host.to_string(), parse_port(port)?)),
        Some(_) => Err(anyhow!("Missing host in '{target}'")),
        None => Ok((target.to_string(), default_port)),
    }
}

fn parse_port(port: &str) -> Result<u16> {
    match port.parse::<u16>() {
        Ok(0) => Err(anyhow!("Port 0 is not valid")),
        Ok(port) => Ok(port),
        Err(_) => Err(anyhow!("Invalid port number '{port}'")),
    }
}

/// Host name of a target given either as a URL or as `host[:port]`.
pub fn host_of(target: &str) -> Result<String> {
    if target.contains("://") {
        let url = Url::parse(target).map_err(|e| anyhow!("Invalid URL: {e}"))?;
        let host = url.host_str().ok_or_else(|| anyhow!("URL must have a valid host"))?;
        return Ok(host.trim_start_matches('[').trim_end_matches(']').to_string());
    }
    parse_host_port(target, 0).map(|(host, _)| host)
}

/// Whether the target is an `https://` URL
pub fn is_secure_url(target: &str) -> bool {
    Url::parse(target).map(|url| url.scheme() == "https").unwrap_or(false)
}
