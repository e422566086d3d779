// JSON Output Module

use crate::scanner::ScanResults;
use crate::Result;
use std::path::Path;

/// Generate JSON output from scan results
pub fn generate_json(results: &[ScanResults], pretty: bool) -> Result<String> {
    if pretty {
        Ok(serde_json::to_string_pretty(results)?)
    } else {
        Ok(serde_json::to_string(results)?)
    }
}

/// Write JSON to file
pub fn write_json_file(results: &[ScanResults], path: &Path, pretty: bool) -> Result<()> {
    let json = generate_json(results, pretty)?;
    std::fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocols::Protocol;
    use crate::vulnerabilities::{ProbeResult, ProbeVerdict, VulnerabilityType};

    #[test]
    fn test_json_generation() {
        let results = vec![ScanResults {
            target: "example.com:443".to_string(),
            scan_time_ms: 1000,
            vulnerabilities: vec![
                ProbeResult::new(
                    VulnerabilityType::RC4,
                    Some(Protocol::SSLv3),
                    ProbeVerdict::Vulnerable,
                ),
                ProbeResult::failed(
                    VulnerabilityType::CRIME,
                    Protocol::TLS12,
                    "Connection timeout".to_string(),
                ),
            ],
            ..Default::default()
        }];

        let json = generate_json(&results, false).unwrap();
        assert!(json.contains("example.com"));
        assert!(json.contains("\"verdict\":\"Vulnerable\""));
        assert!(json.contains("\"verdict\":\"Failed\",\"error\":\"Connection timeout\""));
        // tested versions carry no error key
        assert_eq!(json.matches("\"error\"").count(), 1);

        let pretty_json = generate_json(&results, true).unwrap();
        assert!(pretty_json.contains("example.com"));
        assert!(pretty_json.contains("\n")); // Check for pretty printing
    }

    #[test]
    fn test_write_json_file() {
        let path = std::env::temp_dir().join(format!("tlsprobe-{}.json", std::process::id()));
        write_json_file(&[ScanResults::default()], &path, false).unwrap();

        let parsed: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(parsed.is_array());
        std::fs::remove_file(&path).unwrap();
    }
}
