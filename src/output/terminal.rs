// Terminal output - Colored report for one scanned port

use crate::certificates::Certificate;
use crate::protocols::ProtocolTestResult;
use crate::scanner::ScanResults;
use crate::session::{BaselineSessionInfo, SessionPath};
use crate::vulnerabilities::tester::VulnerabilitySummary;
use crate::vulnerabilities::{ProbeResult, ProbeVerdict};
use colored::*;

/// Format a status indicator (Y/X) with color based on boolean value
fn format_status_indicator(value: bool) -> ColoredString {
    if value { "Y".green() } else { "X".red() }
}

fn section_header(out: &mut Vec<String>, title: &str) {
    out.push(String::new());
    out.push(title.cyan().bold().to_string());
    out.push("=".repeat(50));
}

/// Print the report for every port
pub fn display_results(results: &[ScanResults]) {
    for result in results {
        println!("{}", render_results(result));
    }
}

/// Full report for one port
pub fn render_results(results: &ScanResults) -> String {
    let mut out = Vec::new();

    out.push(format!("{} {}", "Target:".bold(), results.target));
    if let Some(ip) = &results.ip {
        out.push(format!("{} {}", "IP:    ".bold(), ip));
    }

    if let Some(error) = &results.error {
        out.push(format!("{} {}", "X Scan failed:".red().bold(), error));
        return out.join("\n");
    }

    render_protocols(&mut out, &results.protocols);

    if let Some(baseline) = &results.baseline {
        render_baseline(&mut out, baseline);
    } else if let Some(error) = &results.baseline_error {
        section_header(&mut out, "Session:");
        out.push(format!("  {} {}", "X".red(), error));
    }

    if !results.vulnerabilities.is_empty() {
        render_vulnerabilities(&mut out, &results.vulnerabilities, &results.summary);
    }

    out.push(String::new());
    out.push(format!("Scan time: {}ms", results.scan_time_ms).dimmed().to_string());
    out.join("\n")
}

fn render_protocols(out: &mut Vec<String>, results: &[ProtocolTestResult]) {
    section_header(out, "Protocol Support:");

    for result in results {
        let status = if result.supported {
            "Supported".green()
        } else {
            "Not supported".normal()
        };
        let legacy = if result.supported && result.protocol.is_legacy() {
            " (INSECURE)".red()
        } else {
            "".normal()
        };
        let timing = result
            .handshake_time_ms
            .map(|ms| format!(" ({}ms)", ms).dimmed().to_string())
            .unwrap_or_default();

        out.push(format!(
            "  {:<15} {} {}{}{}",
            result.protocol.to_string(),
            format_status_indicator(result.supported),
            status,
            legacy,
            timing
        ));
    }
}

fn render_baseline(out: &mut Vec<String>, baseline: &BaselineSessionInfo) {
    section_header(out, "Session:");

    let path = match baseline.path {
        SessionPath::Standard => "library handshake",
        SessionPath::Legacy => "legacy handshake",
    };
    out.push(format!("  Protocol:   {} ({})", baseline.protocol, path));
    match baseline.cipher_suite_id {
        Some(id) => out.push(format!("  Cipher:     {} (0x{:04x})", baseline.cipher_suite, id)),
        None => out.push(format!("  Cipher:     {}", baseline.cipher_suite)),
    }

    let trust = if baseline.verified {
        "Trusted".green()
    } else {
        "Not trusted".red()
    };
    out.push(format!(
        "  Chain:      {} {} ({} certs)",
        format_status_indicator(baseline.verified),
        trust,
        baseline.certificate_chain.len()
    ));

    render_certificate(out, &baseline.certificate);
}

fn render_certificate(out: &mut Vec<String>, cert: &Certificate) {
    out.push(String::new());
    out.push("Certificate Information:".cyan().to_string());
    out.push(format!("  Subject:    {}", cert.subject));
    out.push(format!("  Issuer:     {}", cert.issuer));
    out.push(format!("  Valid From: {}", cert.not_before));

    let expired = !cert.is_valid_at(chrono::Utc::now());
    if expired {
        out.push(format!("  Valid To:   {}", cert.not_after.to_string().red()));
    } else {
        out.push(format!("  Valid To:   {}", cert.not_after));
    }

    out.push(format!("  Serial:     {}", cert.serial_number));
    match cert.public_key_size {
        Some(bits) => out.push(format!(
            "  Key:        {} bits ({})",
            bits, cert.public_key_algorithm
        )),
        None => out.push(format!("  Key:        {}", cert.public_key_algorithm)),
    }
    out.push(format!("  Signature:  {}", cert.signature_algorithm));
    out.push(format!("  Fingerprint SHA256: {}", cert.fingerprint_sha256));

    if !cert.san.is_empty() {
        out.push(String::new());
        out.push("  Subject Alternative Names:".to_string());
        for san in &cert.san {
            out.push(format!("    - {}", san));
        }
    }
}

fn render_vulnerabilities(
    out: &mut Vec<String>,
    results: &[ProbeResult],
    summary: &VulnerabilitySummary,
) {
    section_header(out, "Vulnerability Assessment:");

    for result in results {
        let version = result
            .protocol
            .map(|p| p.to_string())
            .unwrap_or_else(|| "-".to_string());
        let verdict = match result.verdict {
            ProbeVerdict::Vulnerable => "VULNERABLE".red().bold(),
            ProbeVerdict::NotVulnerable => "not vulnerable".green(),
            ProbeVerdict::NotApplicable => "not applicable".dimmed(),
            ProbeVerdict::Failed => "FAILED".yellow().bold(),
        };
        let cve = result
            .probe
            .cve()
            .map(|cve| format!(" ({})", cve).dimmed().to_string())
            .unwrap_or_default();

        out.push(format!(
            "  {:<14} {:<10} {}{}",
            result.probe.name(),
            version,
            verdict,
            cve
        ));
        if let Some(error) = &result.error {
            out.push(format!("    {}", error).dimmed().to_string());
        }
    }

    out.push(String::new());
    out.push("=".repeat(50));
    if summary.is_clean() {
        out.push("Y No vulnerabilities found!".green().bold().to_string());
    } else if summary.vulnerable > 0 {
        let names: Vec<&str> = summary.vulnerable_probes.iter().map(|p| p.name()).collect();
        out.push(format!(
            "{} {} ({})",
            "!".red().bold(),
            summary.to_string().red().bold(),
            names.join(", ")
        ));
    } else {
        out.push(format!("{} {}", "!".yellow().bold(), summary.to_string().yellow()));
    }

    if summary.is_incomplete() {
        let names: Vec<&str> = summary.failed_probes.iter().map(|p| p.name()).collect();
        out.push(format!(
            "{} {}",
            "Assessment incomplete, could not test:".yellow().bold(),
            names.join(", ")
        ));
    }
}
