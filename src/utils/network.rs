// Network utilities - Target parsing and DNS resolution

use crate::error::TlsError;
use crate::Result;
use hickory_resolver::config::*;
use hickory_resolver::Resolver;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

/// Default port when neither the input nor the caller names one
pub const DEFAULT_PORT: u16 = 443;

/// Target information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub hostname: String,
    pub port: u16,
    pub ip_addresses: Vec<IpAddr>,
}

impl Target {
    /// Parse target from a host, `host:port` or URL and resolve it
    pub fn parse(input: &str) -> Result<Self> {
        let (hostname, port) = normalize_host(input)?;
        Self::resolve(&hostname, port.unwrap_or(DEFAULT_PORT))
    }

    /// Resolve `hostname` and build a target on `port`
    pub fn resolve(hostname: &str, port: u16) -> Result<Self> {
        let ip_addresses = resolve_hostname(hostname)?;
        Ok(Self {
            hostname: hostname.to_string(),
            port,
            ip_addresses,
        })
    }

    /// Target with already-known addresses
    pub fn with_addresses(hostname: &str, port: u16, ip_addresses: Vec<IpAddr>) -> Self {
        Self {
            hostname: hostname.to_string(),
            port,
            ip_addresses,
        }
    }

    /// Same host on another port
    pub fn on_port(&self, port: u16) -> Self {
        Self {
            port,
            ..self.clone()
        }
    }

    /// Get all socket addresses
    pub fn socket_addrs(&self) -> Vec<SocketAddr> {
        self.ip_addresses
            .iter()
            .map(|ip| SocketAddr::new(*ip, self.port))
            .collect()
    }

    /// Get primary IP (first one)
    pub fn primary_ip(&self) -> Option<IpAddr> {
        self.ip_addresses.first().copied()
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.hostname, self.port)
    }
}

/// Reduce user input to a bare hostname and an optional explicit port.
///
/// Accepts `example.com`, `example.com:8443`, `https://example.com/path`,
/// IPv4/IPv6 literals and `[::1]:443`.
pub fn normalize_host(input: &str) -> Result<(String, Option<u16>)> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(TlsError::InvalidInput {
            message: "empty target".to_string(),
        });
    }

    if let Ok(ip) = trimmed.parse::<IpAddr>() {
        return Ok((ip.to_string(), None));
    }

    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("tls://{}", trimmed)
    };

    let url = url::Url::parse(&with_scheme)?;
    let host = url
        .host_str()
        .map(|h| h.trim_start_matches('[').trim_end_matches(']').to_string())
        .filter(|h| !h.is_empty())
        .ok_or_else(|| TlsError::InvalidInput {
            message: format!("no hostname in {:?}", input),
        })?;

    Ok((host.to_lowercase(), url.port()))
}

/// Resolve hostname to IP addresses
pub fn resolve_hostname(hostname: &str) -> Result<Vec<IpAddr>> {
    // Check if it's already an IP address
    if let Ok(ip) = hostname.parse::<IpAddr>() {
        return Ok(vec![ip]);
    }

    let dns_error = |details: String| TlsError::DnsResolutionFailed {
        hostname: hostname.to_string(),
        details,
    };

    let resolver = Resolver::new(ResolverConfig::default(), ResolverOpts::default())
        .map_err(|e| dns_error(e.to_string()))?;

    let response = resolver
        .lookup_ip(hostname)
        .map_err(|e| dns_error(e.to_string()))?;

    let ips: Vec<IpAddr> = response.iter().collect();
    if ips.is_empty() {
        return Err(dns_error("no IP addresses found".to_string()));
    }

    tracing::debug!("Resolved {} to {:?}", hostname, ips);
    Ok(ips)
}

/// Parse port from string
pub fn parse_port(port_str: &str) -> Result<u16> {
    port_str
        .trim()
        .parse::<u16>()
        .ok()
        .filter(|p| *p != 0)
        .ok_or_else(|| TlsError::InvalidInput {
            message: format!("invalid port number {:?}", port_str),
        })
}
