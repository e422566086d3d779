// LOGJAM Vulnerability Test
// CVE-2015-4000
//
// LOGJAM downgrades a connection to 512-bit export Diffie-Hellman. Offering
// only DH export suites tells whether the server still accepts them.

use super::{supported_valid_protocols, ProbeSpec, VulnerabilityType};
use crate::ciphers::{self, catalog, CipherFilter};
use crate::protocols::handshake::ClientHelloBuilder;
use crate::protocols::response::ServerResponse;
use crate::protocols::Protocol;
use crate::Result;

const DH_EXPORT_PATTERN: &str = "DH.*EXPORT";

pub static PROBE: ProbeSpec = ProbeSpec {
    probe: VulnerabilityType::LOGJAM,
    valid_protocols: &[
        Protocol::TLS12,
        Protocol::TLS11,
        Protocol::TLS10,
        Protocol::SSLv3,
    ],
    scan_once: false,
    applicable: supported_valid_protocols,
    client_hello,
    is_vulnerable,
    socket_timeout: None,
};

pub fn client_hello(protocol: Protocol) -> Result<Option<Vec<u8>>> {
    let filter = CipherFilter::pattern(DH_EXPORT_PATTERN)?;
    let export_dh = ciphers::filter(catalog::suites_for(protocol), &filter);
    if export_dh.is_empty() {
        return Ok(None);
    }

    let mut builder = ClientHelloBuilder::new(protocol);
    builder
        .add_ciphers(&ciphers::hexcodes(&export_dh))
        .fill_default_ciphers(false);
    Ok(Some(builder.build()))
}

fn is_vulnerable(response: &ServerResponse) -> bool {
    response.is_server_hello()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocols::fixtures::{handshake_failure_alert, server_hello_record};
    use crate::protocols::response::classify;

    #[test]
    fn test_hello_offers_dh_export_only() {
        let hello = client_hello(Protocol::TLS10).unwrap().unwrap();
        let expected = ciphers::hexcodes(&ciphers::filter(
            catalog::suites_for(Protocol::TLS10),
            &CipherFilter::pattern(DH_EXPORT_PATTERN).unwrap(),
        ));

        assert!(!expected.is_empty());
        assert!(expected.contains(&0x0014));
        // cipher block length right after the empty session id
        let len = u16::from_be_bytes([hello[44], hello[45]]) as usize;
        assert_eq!(len, expected.len() * 2);
    }

    #[test]
    fn test_rsa_export_not_offered() {
        let filter = CipherFilter::pattern(DH_EXPORT_PATTERN).unwrap();
        let suites = ciphers::filter(catalog::suites_for(Protocol::TLS12), &filter);
        assert!(suites.iter().all(|s| s.iana_name.contains("DH")));
        assert!(!suites.iter().any(|s| s.hexcode == 0x0003));
    }

    #[test]
    fn test_verdicts() {
        assert!(is_vulnerable(&classify(&server_hello_record(0x0301, 0x0014, 0))));
        assert!(!is_vulnerable(&classify(&handshake_failure_alert())));
        assert!(!is_vulnerable(&classify(&[0x16, 0x03])));
    }
}
