// CRIME (Compression Ratio Info-leak Made Easy) Vulnerability Test
// CVE-2012-4929
//
// CRIME exploits TLS-level compression to recover secrets from compressed
// ciphertext lengths. The probe offers DEFLATE as the only compression method
// and a browser-like suite list, so any ServerHello that keeps DEFLATE means
// compression is on.

use super::{supported_valid_protocols, ProbeSpec, VulnerabilityType};
use crate::protocols::handshake::{ClientHelloBuilder, Compression};
use crate::protocols::response::ServerResponse;
use crate::protocols::Protocol;
use crate::Result;
use std::time::Duration;

/// TLS 1.3 suites, the TLS 1.2 AEAD/CBC set, then the renegotiation SCSV
const CRIME_SUITES: &[u16] = &[
    0x1302, 0x1303, 0x1301, 0xc02c, 0xc030, 0x009f, 0xcca9, 0xcca8,
    0xccaa, 0xc02b, 0xc02f, 0x009e, 0xc024, 0xc028, 0x006b, 0xc023,
    0xc027, 0x0067, 0xc00a, 0xc014, 0x0039, 0xc009, 0xc013, 0x0033,
    0x009d, 0x009c, 0x003d, 0x003c, 0x0035, 0x002f, 0x00ff,
];

pub static PROBE: ProbeSpec = ProbeSpec {
    probe: VulnerabilityType::CRIME,
    valid_protocols: &[
        Protocol::TLS12,
        Protocol::TLS11,
        Protocol::TLS10,
        Protocol::SSLv3,
    ],
    scan_once: true,
    applicable: supported_valid_protocols,
    client_hello,
    is_vulnerable,
    socket_timeout: Some(Duration::from_secs(2)),
};

pub fn client_hello(protocol: Protocol) -> Result<Option<Vec<u8>>> {
    let mut builder = ClientHelloBuilder::new(protocol);
    builder
        .add_ciphers(CRIME_SUITES)
        .fill_default_ciphers(false)
        .with_compression(Compression::Deflate);
    Ok(Some(builder.build()))
}

/// A ServerHello that selected a compression method other than null
fn is_vulnerable(response: &ServerResponse) -> bool {
    response
        .server_hello()
        .is_some_and(|hello| hello.compression_enabled())
}
