// Scanner module - Main scanning engine

pub mod config;

pub use config::ScanConfig;

use crate::certificates::ChainVerifier;
use crate::protocols::tester::{supported_protocols, ProtocolTester};
use crate::protocols::{Protocol, ProtocolTestResult};
use crate::session::{
    BaselineSessionInfo, LegacyHandshake, LegacySessionHandshake, OpenSslHandshake,
    SessionNegotiator, StandardHandshake,
};
use crate::transport::{TcpTransport, Transport};
use crate::utils::network::{resolve_hostname, Target};
use crate::vulnerabilities::tester::{VulnerabilityScanner, VulnerabilitySummary};
use crate::vulnerabilities::ProbeResult;
use crate::{Args, Result};
use serde::Serialize;
use std::time::Instant;

/// Results for one port
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanResults {
    /// host:port
    pub target: String,
    pub ip: Option<String>,
    pub protocols: Vec<ProtocolTestResult>,
    pub supported_protocols: Vec<Protocol>,
    pub baseline: Option<BaselineSessionInfo>,
    /// Why no baseline session could be established
    pub baseline_error: Option<String>,
    pub vulnerabilities: Vec<ProbeResult>,
    pub summary: VulnerabilitySummary,
    pub scan_time_ms: u64,
    /// Set when the port could not be scanned at all
    pub error: Option<String>,
}

/// Main scanner struct
pub struct Scanner {
    config: ScanConfig,
}

impl Scanner {
    pub fn new(args: Args) -> Result<Self> {
        Ok(Self::with_config(ScanConfig::from_args(&args)?))
    }

    pub fn with_config(config: ScanConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Scan every configured port, one after another.
    ///
    /// DNS failure aborts the run; a failure on one port is logged and
    /// recorded in that port's results.
    pub fn run(&self) -> Result<Vec<ScanResults>> {
        let ip_addresses = resolve_hostname(&self.config.hostname)?;
        let host = Target::with_addresses(&self.config.hostname, 0, ip_addresses);

        let mut all = Vec::new();
        for port in &self.config.ports {
            let target = host.on_port(*port);
            let start = Instant::now();

            let mut results = match self.scan_port(&target) {
                Ok(results) => results,
                Err(e) => {
                    tracing::warn!("Scan of {} failed: {}", target, e);
                    ScanResults {
                        target: target.to_string(),
                        ip: target.primary_ip().map(|ip| ip.to_string()),
                        error: Some(e.to_string()),
                        ..Default::default()
                    }
                }
            };
            results.scan_time_ms = start.elapsed().as_millis() as u64;
            all.push(results);
        }
        Ok(all)
    }

    /// Scan one resolved target over real sockets
    pub fn scan_port(&self, target: &Target) -> Result<ScanResults> {
        let probe_transport = TcpTransport::new(self.config.probe_policy.clone());
        let negotiator = SessionNegotiator::new(
            OpenSslHandshake::new(TcpTransport::new(self.config.baseline_policy.clone()))
                .with_anchors(self.config.trust_anchors.clone()),
            LegacySessionHandshake::new(
                TcpTransport::new(self.config.baseline_policy.clone()),
                ChainVerifier::with_anchors(&self.config.trust_anchors)?,
            ),
        );

        scan_target(&self.config, target, &probe_transport, &negotiator)
    }
}

/// Protocol sweep, baseline session and probes for one target
pub fn scan_target<T, S, L>(
    config: &ScanConfig,
    target: &Target,
    transport: &T,
    negotiator: &SessionNegotiator<S, L>,
) -> Result<ScanResults>
where
    T: Transport,
    S: StandardHandshake,
    L: LegacyHandshake,
{
    tracing::info!("Starting scan of {}", target);

    let protocols = ProtocolTester::new(target, transport)
        .with_protocol_filter(config.protocols.clone())
        .test_all_protocols()?;
    let supported = supported_protocols(&protocols);
    tracing::info!("{} supports {:?}", target, supported);

    let mut results = ScanResults {
        target: target.to_string(),
        ip: target.primary_ip().map(|ip| ip.to_string()),
        protocols,
        supported_protocols: supported.clone(),
        ..Default::default()
    };

    if config.run_baseline {
        match negotiator.establish(target, &supported) {
            Ok(info) => results.baseline = Some(info),
            Err(e) => {
                tracing::warn!("No baseline session with {}: {}", target, e);
                results.baseline_error = Some(e.to_string());
            }
        }
    }

    if config.run_vulns {
        let scanner = VulnerabilityScanner::new(target, transport, supported)
            .with_probes(config.probes.clone());
        results.vulnerabilities = scanner.test_all();
        results.summary = VulnerabilityScanner::<T>::summarize_results(&results.vulnerabilities);
    }

    tracing::info!("Scan of {} done", target);
    Ok(results)
}
