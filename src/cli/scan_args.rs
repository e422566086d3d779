// Core scanning arguments
// Licensed under GPL-3.0

use crate::protocols::Protocol;
use crate::vulnerabilities::VulnerabilityType;
use clap::{Args, ValueEnum};
use std::path::PathBuf;

/// Probe names accepted on the command line
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeArg {
    Rc4,
    Crime,
    Logjam,
}

impl From<ProbeArg> for VulnerabilityType {
    fn from(arg: ProbeArg) -> Self {
        match arg {
            ProbeArg::Rc4 => VulnerabilityType::RC4,
            ProbeArg::Crime => VulnerabilityType::CRIME,
            ProbeArg::Logjam => VulnerabilityType::LOGJAM,
        }
    }
}

/// Which phases run and what they test
#[derive(Args, Debug, Clone, Default)]
pub struct ScanArgs {
    /// Only test these protocol versions (e.g. "TLSv1.2,SSLv3")
    #[arg(long = "protocols", value_name = "LIST", value_delimiter = ',')]
    pub protocols: Option<Vec<Protocol>>,

    /// Only run these probes
    #[arg(long = "vuln", value_name = "PROBE", value_delimiter = ',')]
    pub vulns: Option<Vec<ProbeArg>>,

    /// Skip the baseline session (certificate, cipher, protocol)
    #[arg(long = "no-baseline")]
    pub no_baseline: bool,

    /// Skip vulnerability probes
    #[arg(long = "no-vulns")]
    pub no_vulns: bool,

    /// Extra trust anchors (PEM) for certificate verification
    #[arg(long = "ca-file", value_name = "FILE")]
    pub ca_file: Option<PathBuf>,
}

impl ScanArgs {
    /// Probes to run, in the order given or all of them
    pub fn probes(&self) -> Vec<VulnerabilityType> {
        match &self.vulns {
            Some(vulns) => vulns.iter().map(|v| (*v).into()).collect(),
            None => VulnerabilityType::all().to_vec(),
        }
    }
}
