// RC4 Support Test
// CVE-2013-2566, CVE-2015-2808
//
// RC4 keystream biases make plaintext recovery practical with enough
// ciphertext. Any server that still picks an RC4 suite is flagged.

use super::{supported_valid_protocols, ProbeSpec, VulnerabilityType};
use crate::ciphers::{self, catalog, CipherFilter};
use crate::protocols::handshake::ClientHelloBuilder;
use crate::protocols::response::ServerResponse;
use crate::protocols::Protocol;
use crate::Result;

pub static PROBE: ProbeSpec = ProbeSpec {
    probe: VulnerabilityType::RC4,
    valid_protocols: &[
        Protocol::TLS12,
        Protocol::TLS11,
        Protocol::TLS10,
        Protocol::SSLv3,
    ],
    scan_once: false,
    applicable,
    client_hello,
    is_vulnerable,
    socket_timeout: None,
};

/// TLS 1.0 and 1.1 share a suite list, so 1.1 is skipped when 1.0 is tested
fn applicable(spec: &ProbeSpec, supported: &[Protocol]) -> Vec<Protocol> {
    let mut protocols = supported_valid_protocols(spec, supported);
    if supported.contains(&Protocol::TLS10) && supported.contains(&Protocol::TLS11) {
        protocols.retain(|p| *p != Protocol::TLS11);
    }
    protocols
}

/// Every RC4 suite the catalog has for `protocol`, and nothing else
pub fn client_hello(protocol: Protocol) -> Result<Option<Vec<u8>>> {
    let rc4 = ciphers::filter(catalog::suites_for(protocol), &CipherFilter::Contains("RC4"));
    if rc4.is_empty() {
        return Ok(None);
    }

    let mut builder = ClientHelloBuilder::new(protocol);
    builder
        .add_ciphers(&ciphers::hexcodes(&rc4))
        .fill_default_ciphers(false);
    Ok(Some(builder.build()))
}

/// The server picked one of the offered RC4 suites
fn is_vulnerable(response: &ServerResponse) -> bool {
    response.is_server_hello()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocols::fixtures::{handshake_failure_alert, server_hello_record};
    use crate::protocols::response::classify;
    use crate::transport::mock::loopback_target;
    use crate::vulnerabilities::fakes::CannedTransport;
    use crate::vulnerabilities::{run_probe, ProbeVerdict};

    fn offered_suites(hello: &[u8]) -> Vec<u16> {
        // record (5) + handshake header (4) + version (2) + random (32) + sid len (1)
        let offset = 44;
        let len = u16::from_be_bytes([hello[offset], hello[offset + 1]]) as usize;
        hello[offset + 2..offset + 2 + len]
            .chunks(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect()
    }

    #[test]
    fn test_hello_offers_only_rc4() {
        let hello = client_hello(Protocol::TLS12).unwrap().unwrap();
        let suites = offered_suites(&hello);

        assert!(!suites.is_empty());
        for code in suites {
            assert!(catalog::lookup(code).unwrap().contains("RC4"), "0x{:04x}", code);
        }
    }

    #[test]
    fn test_verdicts() {
        assert!(is_vulnerable(&classify(&server_hello_record(0x0303, 0x0005, 0))));
        assert!(!is_vulnerable(&classify(&handshake_failure_alert())));
        assert!(!is_vulnerable(&classify(&[])));
        assert!(!is_vulnerable(&classify(b"HTTP/1.1 400 Bad Request\r\n")));
    }

    #[test]
    fn test_tls11_dropped_when_tls10_supported() {
        let both = [Protocol::TLS12, Protocol::TLS11, Protocol::TLS10];
        assert_eq!(
            PROBE.applicable_protocols(&both),
            vec![Protocol::TLS12, Protocol::TLS10]
        );

        let only_11 = [Protocol::TLS12, Protocol::TLS11];
        assert_eq!(
            PROBE.applicable_protocols(&only_11),
            vec![Protocol::TLS12, Protocol::TLS11]
        );
    }

    #[test]
    fn test_sslv2_not_probed() {
        assert!(PROBE.applicable_protocols(&[Protocol::SSLv2]).is_empty());
    }

    #[test]
    fn test_probe_against_rc4_server() {
        let transport = CannedTransport::new(vec![
            Ok(server_hello_record(0x0303, 0xc011, 0)),
            Ok(handshake_failure_alert()),
        ]);
        let results = run_probe(
            VulnerabilityType::RC4,
            &[Protocol::TLS12, Protocol::SSLv3],
            &loopback_target(),
            &transport,
        );

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].verdict, ProbeVerdict::Vulnerable);
        assert_eq!(results[1].verdict, ProbeVerdict::NotVulnerable);
        assert!(transport.timeouts.borrow().iter().all(Option::is_none));
    }

    #[test]
    fn test_probe_against_hardened_server() {
        let transport = CannedTransport::new(vec![Ok(handshake_failure_alert())]);
        let results = run_probe(
            VulnerabilityType::RC4,
            &[Protocol::TLS12],
            &loopback_target(),
            &transport,
        );

        assert!(results.iter().all(|r| !r.vulnerable()));
    }
}
