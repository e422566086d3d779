// Protocol Tester - Tests which TLS/SSL protocols are supported

use super::handshake::{ClientHelloBuilder, Sslv2ClientHello};
use super::response::{classify, ServerResponse};
use super::{Protocol, ProtocolTestResult};
use crate::transport::Transport;
use crate::utils::network::Target;
use crate::Result;
use std::time::Instant;

/// Sends one default hello per version and records which ones are accepted
pub struct ProtocolTester<'a, T> {
    target: &'a Target,
    transport: &'a T,
    protocol_filter: Option<Vec<Protocol>>,
}

impl<'a, T: Transport> ProtocolTester<'a, T> {
    pub fn new(target: &'a Target, transport: &'a T) -> Self {
        Self {
            target,
            transport,
            protocol_filter: None,
        }
    }

    /// Set protocol filter
    pub fn with_protocol_filter(mut self, protocols: Option<Vec<Protocol>>) -> Self {
        self.protocol_filter = protocols;
        self
    }

    /// Test every version, newest first.
    ///
    /// A version whose exchange fails is logged and reported as unsupported;
    /// the error is returned only when every version failed.
    pub fn test_all_protocols(&self) -> Result<Vec<ProtocolTestResult>> {
        let protocols = self
            .protocol_filter
            .clone()
            .unwrap_or_else(Protocol::all_descending);

        let mut results = Vec::new();
        let mut failures = 0;
        let mut last_error = None;

        for protocol in &protocols {
            match self.test_protocol(*protocol) {
                Ok(result) => results.push(result),
                Err(e) => {
                    tracing::warn!("{} test on {} failed: {}", protocol, self.target, e);
                    failures += 1;
                    results.push(ProtocolTestResult {
                        protocol: *protocol,
                        supported: false,
                        cipher_suite: None,
                        handshake_time_ms: None,
                    });
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if failures == protocols.len() => Err(e),
            _ => Ok(results),
        }
    }

    /// Test specific protocol
    pub fn test_protocol(&self, protocol: Protocol) -> Result<ProtocolTestResult> {
        let hello = match protocol {
            Protocol::SSLv2 => Sslv2ClientHello::new().build(),
            _ => ClientHelloBuilder::new(protocol).build(),
        };

        let start = Instant::now();
        let response = self.transport.send_and_receive(self.target, &hello)?;
        let elapsed = start.elapsed();

        // a server may answer a higher offer with its own lower version
        let (supported, cipher_suite) = match classify(&response) {
            ServerResponse::ServerHello(hello) => {
                (hello.protocol() == Some(protocol), hello.cipher_suite)
            }
            _ => (false, None),
        };
        tracing::debug!("{} on {}: supported={}", protocol, self.target, supported);

        Ok(ProtocolTestResult {
            protocol,
            supported,
            cipher_suite: cipher_suite.filter(|_| supported),
            handshake_time_ms: supported.then(|| elapsed.as_millis() as u64),
        })
    }
}

/// Supported versions from a sweep, newest first
pub fn supported_protocols(results: &[ProtocolTestResult]) -> Vec<Protocol> {
    let mut supported: Vec<Protocol> = results
        .iter()
        .filter(|r| r.supported)
        .map(|r| r.protocol)
        .collect();
    supported.sort_by(|a, b| b.cmp(a));
    supported
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TlsError;
    use crate::protocols::fixtures::{handshake_failure_alert, server_hello_record};
    use crate::transport::mock::loopback_target;
    use crate::vulnerabilities::fakes::CannedTransport;

    fn sslv2_server_hello() -> Vec<u8> {
        vec![0x80, 0x0b, 0x04, 0x00, 0x01, 0x00, 0x02, 0x00, 0x00, 0x00, 0x03, 0x00, 0x10]
    }

    #[test]
    fn test_sweep_newest_first() {
        let transport = CannedTransport::new(vec![
            Ok(server_hello_record(0x0303, 0xc02f, 0)),
            Ok(handshake_failure_alert()),
            Ok(server_hello_record(0x0301, 0x002f, 0)),
            Ok(Vec::new()),
            Ok(sslv2_server_hello()),
        ]);
        let target = loopback_target();
        let results = ProtocolTester::new(&target, &transport)
            .test_all_protocols()
            .unwrap();

        assert_eq!(results.len(), 5);
        assert_eq!(
            supported_protocols(&results),
            vec![Protocol::TLS12, Protocol::TLS10, Protocol::SSLv2]
        );
        assert_eq!(results[0].cipher_suite, Some(0xc02f));
        assert!(results[0].handshake_time_ms.is_some());

        // the last hello is the SSLv2 CLIENT-HELLO
        let sent = transport.sent.borrow();
        assert_eq!(sent[4][2], 0x01);
        assert_eq!(&sent[4][3..5], &[0x00, 0x02]);
    }

    #[test]
    fn test_lower_version_answer_is_not_support() {
        let transport = CannedTransport::new(vec![Ok(server_hello_record(0x0301, 0x002f, 0))]);
        let target = loopback_target();
        let result = ProtocolTester::new(&target, &transport)
            .test_protocol(Protocol::TLS12)
            .unwrap();

        assert!(!result.supported);
        assert_eq!(result.cipher_suite, None);
        assert_eq!(result.handshake_time_ms, None);
    }

    #[test]
    fn test_filter_and_isolated_failure() {
        let transport = CannedTransport::new(vec![
            Err(TlsError::Other("reset".to_string())),
            Ok(server_hello_record(0x0300, 0x0005, 0)),
        ]);
        let target = loopback_target();
        let results = ProtocolTester::new(&target, &transport)
            .with_protocol_filter(Some(vec![Protocol::TLS11, Protocol::SSLv3]))
            .test_all_protocols()
            .unwrap();

        assert_eq!(supported_protocols(&results), vec![Protocol::SSLv3]);
        assert!(!results[0].supported);
    }

    #[test]
    fn test_unreachable_host_is_error() {
        let transport = CannedTransport::new(vec![Err(TlsError::ConnectionTimeout {
            duration: std::time::Duration::from_secs(10),
            addr: "127.0.0.1:443".to_string(),
        })]);
        let target = loopback_target();
        let result = ProtocolTester::new(&target, &transport)
            .with_protocol_filter(Some(vec![Protocol::TLS12]))
            .test_all_protocols();

        assert!(result.unwrap_err().is_unreachable());
    }
}
