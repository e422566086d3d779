// Vulnerability Tester - Runs the selected probes one after another

use super::{run_probe, ProbeResult, ProbeVerdict, VulnerabilityType};
use crate::protocols::Protocol;
use crate::transport::Transport;
use crate::utils::network::Target;
use serde::Serialize;

/// Main vulnerability scanner
pub struct VulnerabilityScanner<'a, T> {
    target: &'a Target,
    transport: &'a T,
    supported_protocols: Vec<Protocol>,
    probes: Vec<VulnerabilityType>,
}

impl<'a, T: Transport> VulnerabilityScanner<'a, T> {
    pub fn new(target: &'a Target, transport: &'a T, supported_protocols: Vec<Protocol>) -> Self {
        Self {
            target,
            transport,
            supported_protocols,
            probes: VulnerabilityType::all().to_vec(),
        }
    }

    /// Restrict the run to `probes`, in that order
    pub fn with_probes(mut self, probes: Vec<VulnerabilityType>) -> Self {
        self.probes = probes;
        self
    }

    /// Run every selected probe sequentially.
    ///
    /// Versions that could not be tested stay in the results as `Failed`.
    pub fn test_all(&self) -> Vec<ProbeResult> {
        let mut results = Vec::new();
        for probe in &self.probes {
            results.extend(run_probe(
                *probe,
                &self.supported_protocols,
                self.target,
                self.transport,
            ));
        }
        results
    }

    pub fn summarize_results(results: &[ProbeResult]) -> VulnerabilitySummary {
        let mut summary = VulnerabilitySummary::default();
        for result in results {
            match result.verdict {
                ProbeVerdict::Vulnerable => {
                    summary.vulnerable += 1;
                    if !summary.vulnerable_probes.contains(&result.probe) {
                        summary.vulnerable_probes.push(result.probe);
                    }
                }
                ProbeVerdict::NotVulnerable => summary.not_vulnerable += 1,
                ProbeVerdict::NotApplicable => summary.not_applicable += 1,
                ProbeVerdict::Failed => {
                    summary.failed += 1;
                    if !summary.failed_probes.contains(&result.probe) {
                        summary.failed_probes.push(result.probe);
                    }
                }
            }
        }
        summary
    }
}

/// Counts over (probe, version) results
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VulnerabilitySummary {
    pub vulnerable: usize,
    pub not_vulnerable: usize,
    pub not_applicable: usize,
    pub failed: usize,
    pub vulnerable_probes: Vec<VulnerabilityType>,
    pub failed_probes: Vec<VulnerabilityType>,
}

impl VulnerabilitySummary {
    /// Nothing vulnerable and every version answered
    pub fn is_clean(&self) -> bool {
        self.vulnerable == 0 && self.failed == 0
    }

    pub fn is_incomplete(&self) -> bool {
        self.failed > 0
    }
}

impl std::fmt::Display for VulnerabilitySummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} vulnerable, {} not vulnerable, {} not applicable",
            self.vulnerable, self.not_vulnerable, self.not_applicable
        )?;
        if self.failed > 0 {
            write!(f, ", {} failed", self.failed)?;
        }
        Ok(())
    }
}
