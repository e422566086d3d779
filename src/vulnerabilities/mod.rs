// Vulnerabilities module - Crafted-hello probes and the driver that runs them

use crate::protocols::response::{classify, ServerResponse};
use crate::protocols::Protocol;
use crate::transport::Transport;
use crate::utils::network::Target;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

pub mod crime;
pub mod logjam;
pub mod rc4;
pub mod tester;

/// Vulnerability types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VulnerabilityType {
    RC4,
    CRIME,
    LOGJAM,
}

impl VulnerabilityType {
    pub fn all() -> &'static [VulnerabilityType] {
        &[
            VulnerabilityType::RC4,
            VulnerabilityType::CRIME,
            VulnerabilityType::LOGJAM,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            VulnerabilityType::RC4 => "RC4 Support",
            VulnerabilityType::CRIME => "CRIME",
            VulnerabilityType::LOGJAM => "LOGJAM",
        }
    }

    pub fn cve(&self) -> Option<&'static str> {
        match self {
            VulnerabilityType::RC4 => Some("CVE-2013-2566"),
            VulnerabilityType::CRIME => Some("CVE-2012-4929"),
            VulnerabilityType::LOGJAM => Some("CVE-2015-4000"),
        }
    }

    /// Registration entry for this probe
    pub fn spec(&self) -> &'static ProbeSpec {
        match self {
            VulnerabilityType::RC4 => &rc4::PROBE,
            VulnerabilityType::CRIME => &crime::PROBE,
            VulnerabilityType::LOGJAM => &logjam::PROBE,
        }
    }
}

impl fmt::Display for VulnerabilityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProbeVerdict {
    Vulnerable,
    NotVulnerable,
    /// Nothing to test: no applicable version or no matching suites
    NotApplicable,
    /// The exchange for this version failed; nothing is known
    Failed,
}

/// Outcome of one probe against one version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub probe: VulnerabilityType,
    /// `None` when no version was applicable
    pub protocol: Option<Protocol>,
    pub verdict: ProbeVerdict,
    /// Why the version could not be tested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProbeResult {
    pub fn new(probe: VulnerabilityType, protocol: Option<Protocol>, verdict: ProbeVerdict) -> Self {
        Self {
            probe,
            protocol,
            verdict,
            error: None,
        }
    }

    pub fn failed(probe: VulnerabilityType, protocol: Protocol, error: String) -> Self {
        Self {
            probe,
            protocol: Some(protocol),
            verdict: ProbeVerdict::Failed,
            error: Some(error),
        }
    }

    pub fn vulnerable(&self) -> bool {
        self.verdict == ProbeVerdict::Vulnerable
    }
}

/// Everything the driver needs to know about one probe
pub struct ProbeSpec {
    pub probe: VulnerabilityType,
    /// Highest first
    pub valid_protocols: &'static [Protocol],
    /// Test only the first applicable version
    pub scan_once: bool,
    /// Versions to test given what the server supports
    pub applicable: fn(&ProbeSpec, &[Protocol]) -> Vec<Protocol>,
    /// Hello for a version; `None` when no suite qualifies
    pub client_hello: fn(Protocol) -> Result<Option<Vec<u8>>>,
    pub is_vulnerable: fn(&ServerResponse) -> bool,
    /// Overrides the transport's read timeout
    pub socket_timeout: Option<Duration>,
}

impl ProbeSpec {
    pub fn applicable_protocols(&self, supported: &[Protocol]) -> Vec<Protocol> {
        let mut protocols = (self.applicable)(self, supported);
        if self.scan_once {
            protocols.truncate(1);
        }
        protocols
    }
}

/// `valid_protocols` that the server supports, in `valid_protocols` order
pub fn supported_valid_protocols(spec: &ProbeSpec, supported: &[Protocol]) -> Vec<Protocol> {
    spec.valid_protocols
        .iter()
        .copied()
        .filter(|p| supported.contains(p))
        .collect()
}

/// Run one probe against every applicable version.
///
/// A version whose exchange fails is logged and reported as `Failed`; the
/// other versions still run.
pub fn run_probe<T: Transport>(
    probe: VulnerabilityType,
    supported: &[Protocol],
    target: &Target,
    transport: &T,
) -> Vec<ProbeResult> {
    let spec = probe.spec();
    let protocols = spec.applicable_protocols(supported);

    if protocols.is_empty() {
        tracing::info!("{}: no applicable protocol version", probe);
        return vec![ProbeResult::new(probe, None, ProbeVerdict::NotApplicable)];
    }

    tracing::info!("Scanning {} on {} ({:?})", probe, target, protocols);

    let mut results = Vec::new();
    for protocol in protocols {
        match test_version(spec, protocol, target, transport) {
            Ok(verdict) => {
                tracing::debug!("{} {}: {:?}", probe, protocol, verdict);
                results.push(ProbeResult::new(probe, Some(protocol), verdict));
            }
            Err(e) => {
                tracing::warn!("{} test for {} failed: {}", probe, protocol, e);
                results.push(ProbeResult::failed(probe, protocol, e.to_string()));
            }
        }
    }

    tracing::info!("{} scan done", probe);
    results
}

fn test_version<T: Transport>(
    spec: &ProbeSpec,
    protocol: Protocol,
    target: &Target,
    transport: &T,
) -> Result<ProbeVerdict> {
    let hello = match (spec.client_hello)(protocol)? {
        Some(hello) => hello,
        None => return Ok(ProbeVerdict::NotApplicable),
    };

    let response = match spec.socket_timeout {
        Some(timeout) => transport.send_and_receive_within(target, &hello, timeout)?,
        None => transport.send_and_receive(target, &hello)?,
    };

    if (spec.is_vulnerable)(&classify(&response)) {
        Ok(ProbeVerdict::Vulnerable)
    } else {
        Ok(ProbeVerdict::NotVulnerable)
    }
}


#[cfg(test)]
mod tests {
    use super::fakes::CannedTransport;
    use super::*;
    use crate::error::TlsError;
    use crate::protocols::fixtures::{handshake_failure_alert, server_hello_record};
    use crate::transport::mock::loopback_target;

    const ALL: &[Protocol] = &[
        Protocol::TLS12,
        Protocol::TLS11,
        Protocol::TLS10,
        Protocol::SSLv3,
    ];

    #[test]
    fn test_no_applicable_version() {
        let transport = CannedTransport::default();
        let results = run_probe(
            VulnerabilityType::LOGJAM,
            &[Protocol::SSLv2],
            &loopback_target(),
            &transport,
        );

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].verdict, ProbeVerdict::NotApplicable);
        assert_eq!(results[0].protocol, None);
        assert!(transport.sent.borrow().is_empty());
    }

    #[test]
    fn test_versions_run_highest_first() {
        let transport = CannedTransport::new(vec![
            Ok(handshake_failure_alert()),
            Ok(server_hello_record(0x0300, 0x0014, 0x00)),
        ]);
        let results = run_probe(
            VulnerabilityType::LOGJAM,
            &[Protocol::SSLv3, Protocol::TLS12],
            &loopback_target(),
            &transport,
        );

        let seen: Vec<_> = results.iter().map(|r| r.protocol).collect();
        assert_eq!(seen, vec![Some(Protocol::TLS12), Some(Protocol::SSLv3)]);
        assert!(!results[0].vulnerable());
        assert!(results[1].vulnerable());

        // record versions of the two hellos
        let sent = transport.sent.borrow();
        assert_eq!(&sent[0][1..3], &[0x03, 0x03]);
        assert_eq!(&sent[1][1..3], &[0x03, 0x00]);
    }

    #[test]
    fn test_failed_version_is_isolated() {
        let transport = CannedTransport::new(vec![
            Err(TlsError::ConnectionTimeout {
                duration: Duration::from_secs(5),
                addr: "127.0.0.1:443".to_string(),
            }),
            Ok(handshake_failure_alert()),
        ]);
        let results = run_probe(
            VulnerabilityType::LOGJAM,
            &[Protocol::TLS12, Protocol::TLS10],
            &loopback_target(),
            &transport,
        );

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].protocol, Some(Protocol::TLS12));
        assert_eq!(results[0].verdict, ProbeVerdict::Failed);
        assert!(results[0].error.as_deref().unwrap().contains("timeout"));
        assert_eq!(results[1].protocol, Some(Protocol::TLS10));
        assert_eq!(results[1].verdict, ProbeVerdict::NotVulnerable);
        assert!(results[1].error.is_none());
    }

    #[test]
    fn test_all_versions_failed_are_reported() {
        let transport = CannedTransport::new(vec![Err(TlsError::Other("reset".to_string()))]);
        let results = run_probe(
            VulnerabilityType::LOGJAM,
            &[Protocol::TLS12],
            &loopback_target(),
            &transport,
        );
        assert_eq!(
            results,
            vec![ProbeResult::failed(
                VulnerabilityType::LOGJAM,
                Protocol::TLS12,
                "reset".to_string()
            )]
        );
    }

    #[test]
    fn test_scan_once_truncates() {
        let spec = VulnerabilityType::CRIME.spec();
        assert_eq!(spec.applicable_protocols(ALL), vec![Protocol::TLS12]);
        assert_eq!(
            VulnerabilityType::LOGJAM.spec().applicable_protocols(ALL).len(),
            4
        );
    }

    #[test]
    fn test_every_type_registered() {
        for probe in VulnerabilityType::all() {
            assert_eq!(probe.spec().probe, *probe);
            assert!(!probe.spec().valid_protocols.is_empty());
        }
    }
}
