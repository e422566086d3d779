// Standard handshake - Baseline session through OpenSSL for TLS 1.0 to 1.2

use super::{BaselineSessionInfo, SessionPath, StandardHandshake, StandardOutcome, TrustMode};
use crate::certificates::parse_chain;
use crate::data::cipher_mapping::{normalize_cipher_name, openssl_hexcode};
use crate::error::TlsError;
use crate::protocols::Protocol;
use crate::transport::{Connector, TcpConnector, TcpTransport};
use crate::utils::network::Target;
use crate::utils::retry::{Sleeper, ThreadSleeper};
use crate::Result;
use openssl::ssl::{HandshakeError, SslConnector, SslMethod, SslRef, SslVerifyMode, SslVersion};
use openssl::x509::{X509, X509VerifyResult};
use std::fmt::Debug;

/// Library handshake over the shared transport
pub struct OpenSslHandshake<C = TcpConnector, S = ThreadSleeper> {
    transport: TcpTransport<C, S>,
    /// Trusted in addition to the system store
    extra_anchors: Vec<Vec<u8>>,
}

impl<C: Connector, S: Sleeper> OpenSslHandshake<C, S> {
    pub fn new(transport: TcpTransport<C, S>) -> Self {
        Self {
            transport,
            extra_anchors: Vec::new(),
        }
    }

    pub fn with_anchors(mut self, anchors: Vec<Vec<u8>>) -> Self {
        self.extra_anchors = anchors;
        self
    }

    fn connector(&self, trust: TrustMode) -> Result<SslConnector> {
        let mut builder = SslConnector::builder(SslMethod::tls())?;
        builder.set_min_proto_version(Some(SslVersion::TLS1))?;
        builder.set_max_proto_version(Some(SslVersion::TLS1_2))?;
        // old servers still need the weak suites
        builder.set_cipher_list("ALL:@SECLEVEL=0")?;

        for der in &self.extra_anchors {
            builder.cert_store_mut().add_cert(X509::from_der(der)?)?;
        }
        if trust == TrustMode::NoVerify {
            builder.set_verify(SslVerifyMode::NONE);
        }

        Ok(builder.build())
    }
}

impl<C, S> StandardHandshake for OpenSslHandshake<C, S>
where
    C: Connector,
    C::Stream: Debug,
    S: Sleeper,
{
    fn handshake(&self, target: &Target, trust: TrustMode) -> Result<StandardOutcome> {
        let connector = self.connector(trust)?;
        let stream = self.transport.connect(target)?;

        let mut config = connector.configure()?;
        if trust == TrustMode::NoVerify {
            config.set_verify_hostname(false);
        }

        tracing::debug!("Library handshake with {} ({:?})", target, trust);

        match config.connect(&target.hostname, stream) {
            Ok(ssl_stream) => {
                let info = session_info(ssl_stream.ssl(), trust)?;
                Ok(StandardOutcome::Established(Box::new(info)))
            }
            Err(HandshakeError::Failure(mid)) => {
                let verify_result = mid.ssl().verify_result();
                if verify_result != X509VerifyResult::OK {
                    Ok(StandardOutcome::CertificateUntrusted(
                        verify_result.error_string().to_string(),
                    ))
                } else {
                    Ok(StandardOutcome::ProtocolFailure(mid.error().to_string()))
                }
            }
            Err(HandshakeError::WouldBlock(_)) => Err(TlsError::ConnectionTimeout {
                duration: self.transport.policy().socket_timeout,
                addr: target.to_string(),
            }),
            Err(e @ HandshakeError::SetupFailure(_)) => Err(e.into()),
        }
    }
}

fn session_info(ssl: &SslRef, trust: TrustMode) -> Result<BaselineSessionInfo> {
    let ders: Vec<Vec<u8>> = match ssl.peer_cert_chain() {
        Some(chain) => chain
            .iter()
            .map(|cert| cert.to_der())
            .collect::<std::result::Result<_, _>>()?,
        None => match ssl.peer_certificate() {
            Some(cert) => vec![cert.to_der()?],
            None => Vec::new(),
        },
    };
    let certificate_chain = parse_chain(&ders)?;
    let certificate = certificate_chain
        .leaf()
        .cloned()
        .ok_or_else(|| TlsError::InvalidHandshake {
            details: "server presented no certificate".to_string(),
        })?;

    let cipher = ssl.current_cipher().ok_or_else(|| TlsError::InvalidHandshake {
        details: "no cipher negotiated".to_string(),
    })?;
    let cipher_suite = match cipher.standard_name() {
        Some(name) => name.to_string(),
        None => normalize_cipher_name(cipher.name()),
    };
    let cipher_suite_id = openssl_hexcode(cipher.name())
        .unwrap_or_else(|| u16::from_be_bytes(cipher.protocol_id()));

    let protocol = negotiated_protocol(ssl)?;

    Ok(BaselineSessionInfo {
        certificate,
        certificate_chain,
        cipher_suite,
        cipher_suite_id: Some(cipher_suite_id),
        protocol,
        verified: trust == TrustMode::Verify,
        path: SessionPath::Standard,
    })
}

fn negotiated_protocol(ssl: &SslRef) -> Result<Protocol> {
    let version = ssl.version2();
    let protocol = if version == Some(SslVersion::TLS1_2) {
        Protocol::TLS12
    } else if version == Some(SslVersion::TLS1_1) {
        Protocol::TLS11
    } else if version == Some(SslVersion::TLS1) {
        Protocol::TLS10
    } else if version == Some(SslVersion::SSL3) {
        Protocol::SSLv3
    } else {
        return Err(TlsError::InvalidHandshake {
            details: format!("unexpected negotiated version {}", ssl.version_str()),
        });
    };
    Ok(protocol)
}
