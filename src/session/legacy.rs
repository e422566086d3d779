// Legacy handshake - SSLv2/SSLv3 handshakes no maintained library will perform
//
// The session stops once the certificate has been checked: there is no key
// exchange and nothing is ever encrypted.

use super::{BaselineSessionInfo, LegacyHandshake, SessionPath};
use crate::certificates::{parse_chain, ChainVerifier};
use crate::ciphers::catalog;
use crate::error::TlsError;
use crate::protocols::handshake::{
    ClientHelloBuilder, Sslv2ClientHello, CONTENT_TYPE_ALERT, CONTENT_TYPE_HANDSHAKE,
    HANDSHAKE_CERTIFICATE, HANDSHAKE_SERVER_HELLO,
};
use crate::protocols::response::SSLV2_SERVER_HELLO;
use crate::protocols::Protocol;
use crate::transport::{Connector, TcpConnector, TcpTransport};
use crate::utils::network::Target;
use crate::utils::retry::{Sleeper, ThreadSleeper};
use crate::Result;
use serde::Serialize;
use std::io::{ErrorKind, Read, Write};

/// Largest single record accepted (2^14 plaintext plus slack)
const MAX_RECORD_LEN: usize = 18 * 1024;
/// Largest handshake message accepted
const MAX_HANDSHAKE_LEN: usize = 256 * 1024;

const SSLV2_ERROR: u8 = 0x00;
const SSLV2_CERT_TYPE_X509: u8 = 0x01;

/// Where a legacy session is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LegacyState {
    Init,
    SentClientHello,
    ReceivedServerHello,
    ParsedCipherSuite,
    ParsedCertificate,
    /// Chain verified
    Verified,
    /// Chain received but not trusted
    Rejected,
}

impl LegacyState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, LegacyState::Verified | LegacyState::Rejected)
    }
}

/// How a legacy session ended
#[derive(Debug)]
pub enum LegacyOutcome {
    Established(Box<BaselineSessionInfo>),
    /// Alert, wrong version or unparsable data; `state` is where it stopped
    Unsupported { state: LegacyState, reason: String },
}

enum StepError {
    Unsupported(String),
    Fatal(TlsError),
}

impl From<TlsError> for StepError {
    fn from(err: TlsError) -> Self {
        StepError::Fatal(err)
    }
}

type Step<T> = std::result::Result<T, StepError>;

fn unsupported<T>(reason: impl Into<String>) -> Step<T> {
    Err(StepError::Unsupported(reason.into()))
}

/// One SSLv2 or SSLv3 handshake over an owned stream
pub struct LegacySession<S: Read + Write> {
    stream: S,
    protocol: Protocol,
    state: LegacyState,
    /// Handshake bytes received but not yet consumed (SSLv3)
    pending: Vec<u8>,
    cipher_suite: Option<(Option<u16>, String)>,
    certificates: Vec<Vec<u8>>,
}

impl<S: Read + Write> LegacySession<S> {
    pub fn new(stream: S, protocol: Protocol) -> Result<Self> {
        if !protocol.is_legacy() {
            return Err(TlsError::InvalidInput {
                message: format!("{} is not a legacy protocol", protocol),
            });
        }
        Ok(Self {
            stream,
            protocol,
            state: LegacyState::Init,
            pending: Vec::new(),
            cipher_suite: None,
            certificates: Vec::new(),
        })
    }

    pub fn state(&self) -> LegacyState {
        self.state
    }

    /// Drive the session to a terminal state or to `Unsupported`
    pub fn run(&mut self, verifier: &ChainVerifier) -> Result<LegacyOutcome> {
        match self.drive(verifier) {
            Ok(info) => Ok(LegacyOutcome::Established(Box::new(info))),
            Err(StepError::Unsupported(reason)) => {
                tracing::debug!(
                    "Legacy {} handshake unsupported at {:?}: {}",
                    self.protocol,
                    self.state,
                    reason
                );
                Ok(LegacyOutcome::Unsupported {
                    state: self.state,
                    reason,
                })
            }
            Err(StepError::Fatal(err)) => Err(err),
        }
    }

    fn drive(&mut self, verifier: &ChainVerifier) -> Step<BaselineSessionInfo> {
        self.send_client_hello()?;
        match self.protocol {
            Protocol::SSLv2 => self.receive_sslv2_server_hello()?,
            _ => {
                let body = self.receive_sslv3_server_hello()?;
                self.parse_sslv3_cipher_suite(&body)?;
                self.receive_sslv3_certificate()?;
            }
        }
        self.verify(verifier)
    }

    fn send_client_hello(&mut self) -> Step<()> {
        let hello = match self.protocol {
            Protocol::SSLv2 => Sslv2ClientHello::new().build(),
            protocol => {
                let mut builder = ClientHelloBuilder::new(protocol);
                builder
                    .add_ciphers(&crate::ciphers::hexcodes(catalog::suites_for(protocol)))
                    .fill_default_ciphers(false);
                builder.build()
            }
        };

        self.stream.write_all(&hello).map_err(TlsError::from)?;
        self.stream.flush().map_err(TlsError::from)?;
        self.state = LegacyState::SentClientHello;
        Ok(())
    }

    fn receive_sslv3_server_hello(&mut self) -> Step<Vec<u8>> {
        let (msg_type, body) = self.next_handshake_message()?;
        if msg_type != HANDSHAKE_SERVER_HELLO {
            return unsupported(format!("expected ServerHello, got message type {}", msg_type));
        }

        let version = body
            .get(..2)
            .map(|v| u16::from_be_bytes([v[0], v[1]]))
            .ok_or_else(|| StepError::Unsupported("ServerHello too short".to_string()))?;
        if version != self.protocol.as_hex() {
            return unsupported(format!("server chose version 0x{:04x}", version));
        }

        self.state = LegacyState::ReceivedServerHello;
        Ok(body)
    }

    fn parse_sslv3_cipher_suite(&mut self, body: &[u8]) -> Step<()> {
        // version (2) + random (32)
        let session_id_len = *body
            .get(34)
            .ok_or_else(|| StepError::Unsupported("ServerHello truncated".to_string()))?
            as usize;
        let offset = 35 + session_id_len;
        let code = body
            .get(offset..offset + 2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .ok_or_else(|| StepError::Unsupported("ServerHello has no cipher suite".to_string()))?;

        let name = catalog::lookup(code)
            .map(str::to_string)
            .unwrap_or_else(|| format!("0x{:04x}", code));
        tracing::debug!("Legacy server selected {}", name);

        self.cipher_suite = Some((Some(code), name));
        self.state = LegacyState::ParsedCipherSuite;
        Ok(())
    }

    fn receive_sslv3_certificate(&mut self) -> Step<()> {
        let (msg_type, body) = self.next_handshake_message()?;
        if msg_type != HANDSHAKE_CERTIFICATE {
            return unsupported(format!("expected Certificate, got message type {}", msg_type));
        }

        let list_len = read_u24(&body, 0)
            .ok_or_else(|| StepError::Unsupported("Certificate message truncated".to_string()))?;
        let list = body
            .get(3..3 + list_len)
            .ok_or_else(|| StepError::Unsupported("certificate list truncated".to_string()))?;

        let mut certificates = Vec::new();
        let mut offset = 0;
        while offset < list.len() {
            let cert_len = read_u24(list, offset)
                .ok_or_else(|| StepError::Unsupported("certificate length truncated".to_string()))?;
            let der = list
                .get(offset + 3..offset + 3 + cert_len)
                .ok_or_else(|| StepError::Unsupported("certificate truncated".to_string()))?;
            certificates.push(der.to_vec());
            offset += 3 + cert_len;
        }

        if certificates.is_empty() {
            return unsupported("server sent an empty certificate list");
        }

        self.certificates = certificates;
        self.state = LegacyState::ParsedCertificate;
        Ok(())
    }

    /// SERVER-HELLO carries version, certificate and cipher specs in one message
    fn receive_sslv2_server_hello(&mut self) -> Step<()> {
        let mut header = [0u8; 2];
        self.read_exact_or_unsupported(&mut header)?;

        if header[0] == CONTENT_TYPE_ALERT || header[0] == CONTENT_TYPE_HANDSHAKE {
            return unsupported("server answered with a TLS record");
        }
        if header[0] & 0x80 == 0 {
            return unsupported("SSLv2 record with 3-byte header");
        }

        let len = (((header[0] & 0x7f) as usize) << 8) | header[1] as usize;
        let mut body = vec![0u8; len];
        self.read_exact_or_unsupported(&mut body)?;

        match body.first() {
            Some(&SSLV2_SERVER_HELLO) => {}
            Some(&SSLV2_ERROR) => return unsupported("SSLv2 ERROR message"),
            _ => return unsupported("expected SSLv2 SERVER-HELLO"),
        }
        if body.len() < 11 {
            return unsupported("SERVER-HELLO truncated");
        }

        let cert_type = body[2];
        let version = u16::from_be_bytes([body[3], body[4]]);
        let cert_len = u16::from_be_bytes([body[5], body[6]]) as usize;
        let specs_len = u16::from_be_bytes([body[7], body[8]]) as usize;

        if version != Protocol::SSLv2.as_hex() {
            return unsupported(format!("server chose version 0x{:04x}", version));
        }
        self.state = LegacyState::ReceivedServerHello;

        let cert = body
            .get(11..11 + cert_len)
            .ok_or_else(|| StepError::Unsupported("SERVER-HELLO certificate truncated".to_string()))?;
        let specs = body
            .get(11 + cert_len..11 + cert_len + specs_len)
            .ok_or_else(|| StepError::Unsupported("SERVER-HELLO cipher specs truncated".to_string()))?;

        let first_spec = specs
            .get(..3)
            .map(|s| [s[0], s[1], s[2]])
            .ok_or_else(|| StepError::Unsupported("server offered no SSLv2 cipher".to_string()))?;
        let name = catalog::lookup_sslv2(first_spec)
            .map(str::to_string)
            .unwrap_or_else(|| format!("SSLv2 0x{}", hex::encode(first_spec)));
        self.cipher_suite = Some((None, name));
        self.state = LegacyState::ParsedCipherSuite;

        if cert_type != SSLV2_CERT_TYPE_X509 || cert.is_empty() {
            return unsupported("SERVER-HELLO carries no X.509 certificate");
        }
        self.certificates = vec![cert.to_vec()];
        self.state = LegacyState::ParsedCertificate;
        Ok(())
    }

    fn verify(&mut self, verifier: &ChainVerifier) -> Step<BaselineSessionInfo> {
        let chain = parse_chain(&self.certificates)
            .map_err(|e| StepError::Unsupported(format!("unparsable certificate: {}", e)))?;
        let leaf = chain
            .leaf()
            .cloned()
            .ok_or_else(|| StepError::Unsupported("no certificate".to_string()))?;

        let verification = verifier.verify(&self.certificates)?;
        self.state = if verification.verified {
            LegacyState::Verified
        } else {
            tracing::debug!(
                "Legacy certificate rejected: {}",
                verification.reason.as_deref().unwrap_or("unknown reason")
            );
            LegacyState::Rejected
        };

        let (cipher_suite_id, cipher_suite) = self
            .cipher_suite
            .clone()
            .ok_or_else(|| StepError::Unsupported("no cipher suite".to_string()))?;

        Ok(BaselineSessionInfo {
            certificate: leaf,
            certificate_chain: chain,
            cipher_suite,
            cipher_suite_id,
            protocol: self.protocol,
            verified: verification.verified,
            path: SessionPath::Legacy,
        })
    }

    /// Next handshake message from the record stream, across record boundaries
    fn next_handshake_message(&mut self) -> Step<(u8, Vec<u8>)> {
        loop {
            if let Some(len) = read_u24(&self.pending, 1) {
                if len > MAX_HANDSHAKE_LEN {
                    return unsupported(format!("handshake message of {} bytes", len));
                }
                if self.pending.len() >= 4 + len {
                    let msg_type = self.pending[0];
                    let body = self.pending[4..4 + len].to_vec();
                    self.pending.drain(..4 + len);
                    return Ok((msg_type, body));
                }
            }
            self.read_record()?;
        }
    }

    /// Append one handshake record's payload to `pending`
    fn read_record(&mut self) -> Step<()> {
        let mut header = [0u8; 5];
        self.read_exact_or_unsupported(&mut header)?;

        let len = u16::from_be_bytes([header[3], header[4]]) as usize;
        if len > MAX_RECORD_LEN {
            return unsupported(format!("record of {} bytes", len));
        }
        let mut payload = vec![0u8; len];
        self.read_exact_or_unsupported(&mut payload)?;

        match header[0] {
            CONTENT_TYPE_HANDSHAKE => {
                self.pending.extend_from_slice(&payload);
                Ok(())
            }
            CONTENT_TYPE_ALERT => match payload.get(..2) {
                Some(alert) => unsupported(format!(
                    "alert level {} description {}",
                    alert[0], alert[1]
                )),
                None => unsupported("truncated alert"),
            },
            other => unsupported(format!("unexpected record type 0x{:02x}", other)),
        }
    }

    fn read_exact_or_unsupported(&mut self, buf: &mut [u8]) -> Step<()> {
        match self.stream.read_exact(buf) {
            Ok(()) => Ok(()),
            Err(e)
                if matches!(
                    e.kind(),
                    ErrorKind::UnexpectedEof
                        | ErrorKind::WouldBlock
                        | ErrorKind::TimedOut
                        | ErrorKind::ConnectionReset
                        | ErrorKind::ConnectionAborted
                ) =>
            {
                unsupported(format!("server stopped answering: {}", e))
            }
            Err(e) => Err(StepError::Fatal(e.into())),
        }
    }
}

fn read_u24(data: &[u8], offset: usize) -> Option<usize> {
    let b = data.get(offset..offset + 3)?;
    Some(((b[0] as usize) << 16) | ((b[1] as usize) << 8) | b[2] as usize)
}

/// Legacy handshake over a fresh connection per attempt
pub struct LegacySessionHandshake<C = TcpConnector, S = ThreadSleeper> {
    transport: TcpTransport<C, S>,
    verifier: ChainVerifier,
}

impl<C: Connector, S: Sleeper> LegacySessionHandshake<C, S> {
    pub fn new(transport: TcpTransport<C, S>, verifier: ChainVerifier) -> Self {
        Self {
            transport,
            verifier,
        }
    }
}

impl<C: Connector, S: Sleeper> LegacyHandshake for LegacySessionHandshake<C, S> {
    fn handshake(&self, target: &Target, protocol: Protocol) -> Result<LegacyOutcome> {
        let stream = self.transport.connect(target)?;
        let mut session = LegacySession::new(stream, protocol)?;
        session.run(&self.verifier)
    }
}
