// Integration tests for full scans against loopback servers
// Run with: cargo test --test integration_scan

mod common;

use common::{closed_port, loopback, spawn_canned_server, spawn_tls12_server, sslv3_flight, Pki};
use std::time::Duration;
use tlsprobe::certificates::ChainVerifier;
use tlsprobe::protocols::Protocol;
use tlsprobe::scanner::{scan_target, ScanConfig, Scanner};
use tlsprobe::session::{LegacySessionHandshake, OpenSslHandshake, SessionNegotiator, SessionPath};
use tlsprobe::transport::{ConnectionPolicy, TcpTransport};
use tlsprobe::utils::retry::RetryConfig;
use tlsprobe::vulnerabilities::{ProbeVerdict, VulnerabilityType};

fn config(anchors: Vec<Vec<u8>>) -> ScanConfig {
    let policy = ConnectionPolicy::default()
        .with_socket_timeout(Duration::from_secs(3))
        .with_retry(RetryConfig::no_retry());
    ScanConfig {
        hostname: "127.0.0.1".to_string(),
        ports: vec![443],
        protocols: None,
        probes: VulnerabilityType::all().to_vec(),
        run_baseline: true,
        run_vulns: true,
        probe_policy: policy.clone(),
        baseline_policy: policy,
        trust_anchors: anchors,
    }
}

fn scan(config: &ScanConfig, port: u16) -> tlsprobe::scanner::ScanResults {
    let transport = TcpTransport::new(config.probe_policy.clone());
    let negotiator = SessionNegotiator::new(
        OpenSslHandshake::new(TcpTransport::new(config.baseline_policy.clone()))
            .with_anchors(config.trust_anchors.clone()),
        LegacySessionHandshake::new(
            TcpTransport::new(config.baseline_policy.clone()),
            ChainVerifier::with_anchors(&config.trust_anchors).unwrap(),
        ),
    );
    scan_target(config, &loopback(port), &transport, &negotiator).unwrap()
}

#[test]
fn test_modern_server_is_clean() {
    let pki = Pki::generate();
    let port = spawn_tls12_server(&pki);

    let results = scan(&config(vec![pki.ca_der()]), port);

    assert_eq!(results.supported_protocols, vec![Protocol::TLS12]);

    let baseline = results.baseline.expect("baseline session");
    assert_eq!(baseline.path, SessionPath::Standard);
    assert_eq!(baseline.protocol, Protocol::TLS12);
    assert!(baseline.verified);
    assert_eq!(baseline.certificate_chain.len(), 2);

    assert_eq!(results.vulnerabilities.len(), 3);
    assert!(results.vulnerabilities.iter().all(|r| r.verdict == ProbeVerdict::NotVulnerable));
    assert!(results.summary.is_clean());
}

#[test]
fn test_modern_server_untrusted_chain() {
    let pki = Pki::generate();
    let port = spawn_tls12_server(&pki);

    let config = ScanConfig {
        run_vulns: false,
        ..config(Vec::new())
    };
    let results = scan(&config, port);

    let baseline = results.baseline.expect("baseline session");
    assert_eq!(baseline.path, SessionPath::Standard);
    assert!(!baseline.verified);
}

#[test]
fn test_sslv3_only_server_uses_legacy_path() {
    let pki = Pki::generate();
    let port = spawn_canned_server(sslv3_flight(&pki, 0x0005));

    let results = scan(&config(vec![pki.ca_der()]), port);

    assert_eq!(results.supported_protocols, vec![Protocol::SSLv3]);

    let baseline = results.baseline.expect("legacy session");
    assert_eq!(baseline.path, SessionPath::Legacy);
    assert_eq!(baseline.protocol, Protocol::SSLv3);
    assert_eq!(baseline.cipher_suite_id, Some(0x0005));
    assert!(baseline.verified);

    // a server that accepts any offer is flagged by every probe except CRIME
    let verdict = |probe: VulnerabilityType| {
        results
            .vulnerabilities
            .iter()
            .find(|r| r.probe == probe)
            .map(|r| r.verdict)
    };
    assert_eq!(verdict(VulnerabilityType::RC4), Some(ProbeVerdict::Vulnerable));
    assert_eq!(verdict(VulnerabilityType::LOGJAM), Some(ProbeVerdict::Vulnerable));
    assert_eq!(verdict(VulnerabilityType::CRIME), Some(ProbeVerdict::NotVulnerable));
}

#[test]
fn test_protocol_filter_limits_sweep() {
    let pki = Pki::generate();
    let port = spawn_tls12_server(&pki);

    let config = ScanConfig {
        protocols: Some(vec![Protocol::TLS11, Protocol::TLS10]),
        run_baseline: false,
        ..config(Vec::new())
    };
    let results = scan(&config, port);

    assert_eq!(results.protocols.len(), 2);
    assert!(results.supported_protocols.is_empty());
    assert!(results
        .vulnerabilities
        .iter()
        .all(|r| r.verdict == ProbeVerdict::NotApplicable));
}

#[test]
fn test_closed_port_recorded_not_fatal() {
    let pki = Pki::generate();
    let open = spawn_tls12_server(&pki);
    let closed = closed_port();

    let scanner = Scanner::with_config(ScanConfig {
        ports: vec![closed, open],
        run_baseline: false,
        run_vulns: false,
        ..config(Vec::new())
    });
    let results = scanner.run().unwrap();

    assert_eq!(results.len(), 2);
    assert!(results[0].error.is_some());
    assert!(results[1].error.is_none());
    assert_eq!(results[1].supported_protocols, vec![Protocol::TLS12]);
}

#[test]
#[ignore] // Requires network access
fn test_real_host() {
    let scanner = Scanner::with_config(ScanConfig {
        hostname: "example.com".to_string(),
        ..config(Vec::new())
    });
    let results = scanner.run().unwrap();
    assert!(results[0].supported_protocols.contains(&Protocol::TLS12));
}
