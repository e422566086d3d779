//! Scan configuration extracted from CLI Args.
//!
//! Everything a scan needs is resolved here once, so the scanner never
//! reaches back into `Args` and no call site shares mutable defaults.

use crate::cli::Args;
use crate::protocols::Protocol;
use crate::transport::ConnectionPolicy;
use crate::utils::network::{normalize_host, DEFAULT_PORT};
use crate::vulnerabilities::VulnerabilityType;
use crate::Result;
use openssl::x509::X509;
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Hostname or IP literal, without scheme, path or port
    pub hostname: String,
    /// At least one port
    pub ports: Vec<u16>,
    /// Specific protocols to test (None = test all)
    pub protocols: Option<Vec<Protocol>>,
    pub probes: Vec<VulnerabilityType>,
    pub run_baseline: bool,
    pub run_vulns: bool,
    /// Used by the protocol sweep and by every probe
    pub probe_policy: ConnectionPolicy,
    /// Used by the baseline handshakes
    pub baseline_policy: ConnectionPolicy,
    /// DER trust anchors added to the system store
    pub trust_anchors: Vec<Vec<u8>>,
}

impl ScanConfig {
    /// Create configuration from CLI Args
    pub fn from_args(args: &Args) -> Result<Self> {
        let (hostname, target_port) = normalize_host(&args.target)?;

        // first-seen order, each port once
        let mut seen = HashSet::new();
        let mut ports: Vec<u16> = args
            .ports
            .iter()
            .copied()
            .filter(|port| seen.insert(*port))
            .collect();
        if ports.is_empty() {
            ports.push(target_port.unwrap_or(DEFAULT_PORT));
        }

        let trust_anchors = match &args.scan.ca_file {
            Some(path) => load_pem_anchors(path)?,
            None => Vec::new(),
        };

        let policy = args.connection.connection_policy();

        Ok(Self {
            hostname,
            ports,
            protocols: args.scan.protocols.clone(),
            probes: args.scan.probes(),
            run_baseline: !args.scan.no_baseline,
            run_vulns: !args.scan.no_vulns,
            probe_policy: policy.clone(),
            baseline_policy: policy,
            trust_anchors,
        })
    }
}

/// Every certificate in a PEM bundle, as DER
pub fn load_pem_anchors(path: &Path) -> Result<Vec<Vec<u8>>> {
    let pem = std::fs::read(path)?;
    let certs = X509::stack_from_pem(&pem)?;
    if certs.is_empty() {
        return Err(crate::TlsError::InvalidInput {
            message: format!("no certificates in {}", path.display()),
        });
    }
    certs
        .iter()
        .map(|cert| cert.to_der().map_err(Into::into))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn config(argv: &[&str]) -> ScanConfig {
        let args = Args::try_parse_from(argv).unwrap();
        ScanConfig::from_args(&args).unwrap()
    }

    #[test]
    fn test_url_target_normalized() {
        let config = config(&["tlsprobe", "https://Example.COM:8443/path?q=1"]);
        assert_eq!(config.hostname, "example.com");
        assert_eq!(config.ports, vec![8443]);
    }

    #[test]
    fn test_explicit_ports_override_target_port() {
        let config = config(&["tlsprobe", "example.com:8443", "-p", "443,993"]);
        assert_eq!(config.ports, vec![443, 993]);
    }

    #[test]
    fn test_repeated_ports_scanned_once() {
        let config = config(&["tlsprobe", "example.com", "-p", "443,8443,443"]);
        assert_eq!(config.ports, vec![443, 8443]);

        let config = self::config(&["tlsprobe", "example.com", "-p", "8443", "-p", "443", "-p", "8443"]);
        assert_eq!(config.ports, vec![8443, 443]);
    }

    #[test]
    fn test_default_port_and_single_policy() {
        let config = config(&["tlsprobe", "example.com", "--socket-timeout", "3"]);
        assert_eq!(config.ports, vec![DEFAULT_PORT]);
        assert_eq!(config.probe_policy, config.baseline_policy);
        assert_eq!(config.probe_policy.socket_timeout.as_secs(), 3);
        assert!(config.run_baseline && config.run_vulns);
    }

    #[test]
    fn test_phase_switches() {
        let config = config(&["tlsprobe", "example.com", "--no-baseline", "--vuln", "logjam"]);
        assert!(!config.run_baseline);
        assert_eq!(config.probes, vec![VulnerabilityType::LOGJAM]);
    }

    #[test]
    fn test_missing_ca_file() {
        let args = Args::try_parse_from(["tlsprobe", "example.com", "--ca-file", "/nonexistent.pem"])
            .unwrap();
        assert!(ScanConfig::from_args(&args).is_err());
    }
}
