// Session module - Baseline connection info through a library handshake or the legacy path

pub mod legacy;
pub mod standard;

use crate::certificates::{Certificate, CertificateChain};
use crate::error::TlsError;
use crate::protocols::Protocol;
use crate::utils::network::Target;
use crate::Result;
use serde::Serialize;

pub use legacy::{LegacyOutcome, LegacySession, LegacySessionHandshake, LegacyState};
pub use standard::OpenSslHandshake;

/// Which handshake produced the session info
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionPath {
    Standard,
    Legacy,
}

/// Whether the standard handshake verifies the peer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrustMode {
    Verify,
    NoVerify,
}

/// What a server negotiates with a well-behaved client
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BaselineSessionInfo {
    /// Leaf certificate
    pub certificate: Certificate,
    pub certificate_chain: CertificateChain,
    /// IANA name when known, otherwise whatever the library reported
    pub cipher_suite: String,
    pub cipher_suite_id: Option<u16>,
    pub protocol: Protocol,
    pub verified: bool,
    pub path: SessionPath,
}

/// Result of one library handshake attempt
#[derive(Debug)]
pub enum StandardOutcome {
    Established(Box<BaselineSessionInfo>),
    /// Handshake failed only because the chain did not verify
    CertificateUntrusted(String),
    /// Version or cipher mismatch, reset during the handshake, or similar
    ProtocolFailure(String),
}

/// Handshake through a maintained TLS library
pub trait StandardHandshake {
    fn handshake(&self, target: &Target, trust: TrustMode) -> Result<StandardOutcome>;
}

/// Hand-rolled SSLv2/SSLv3 handshake
pub trait LegacyHandshake {
    fn handshake(&self, target: &Target, protocol: Protocol) -> Result<LegacyOutcome>;
}

/// Picks the handshake strategy that yields the baseline session info
pub struct SessionNegotiator<S, L> {
    standard: S,
    legacy: L,
}

impl<S: StandardHandshake, L: LegacyHandshake> SessionNegotiator<S, L> {
    pub fn new(standard: S, legacy: L) -> Self {
        Self { standard, legacy }
    }

    /// Establish a session, falling back from verified to unverified to legacy.
    ///
    /// Connection-level failures are returned as errors and never trigger
    /// the legacy path.
    pub fn establish(
        &self,
        target: &Target,
        supported_protocols: &[Protocol],
    ) -> Result<BaselineSessionInfo> {
        match self.standard.handshake(target, TrustMode::Verify)? {
            StandardOutcome::Established(info) => Ok(*info),
            StandardOutcome::CertificateUntrusted(reason) => {
                tracing::warn!(
                    "Certificate for {} did not verify ({}), retrying without verification",
                    target,
                    reason
                );
                match self.standard.handshake(target, TrustMode::NoVerify)? {
                    StandardOutcome::Established(info) => Ok(BaselineSessionInfo {
                        verified: false,
                        ..*info
                    }),
                    StandardOutcome::CertificateUntrusted(reason)
                    | StandardOutcome::ProtocolFailure(reason) => {
                        self.establish_legacy(target, supported_protocols, &reason)
                    }
                }
            }
            StandardOutcome::ProtocolFailure(reason) => {
                self.establish_legacy(target, supported_protocols, &reason)
            }
        }
    }

    fn establish_legacy(
        &self,
        target: &Target,
        supported_protocols: &[Protocol],
        reason: &str,
    ) -> Result<BaselineSessionInfo> {
        let protocol = legacy_protocol_for(supported_protocols);
        tracing::info!(
            "Standard handshake with {} failed ({}), trying legacy {}",
            target,
            reason,
            protocol
        );

        match self.legacy.handshake(target, protocol)? {
            LegacyOutcome::Established(info) => Ok(*info),
            LegacyOutcome::Unsupported { state, reason } => {
                tracing::debug!("Legacy {} handshake stopped at {:?}: {}", protocol, state, reason);
                Err(TlsError::ProtocolNotSupported {
                    protocol: protocol.to_string(),
                })
            }
        }
    }
}

/// SSLv2 only when it is the sole supported version, SSLv3 otherwise
pub fn legacy_protocol_for(supported_protocols: &[Protocol]) -> Protocol {
    if supported_protocols == [Protocol::SSLv2] {
        Protocol::SSLv2
    } else {
        Protocol::SSLv3
    }
}

#[cfg(test)]
pub(crate) mod fakes {
    use super::*;
    use crate::certificates::parse_chain;
    use crate::certificates::test_pki::TestPki;
    use std::cell::RefCell;

    pub fn session_info(protocol: Protocol, path: SessionPath) -> BaselineSessionInfo {
        let pki = TestPki::generate("fake.test");
        let chain = parse_chain(&pki.chain_der()).unwrap();
        BaselineSessionInfo {
            certificate: chain.certificates[0].clone(),
            certificate_chain: chain,
            cipher_suite: "TLS_RSA_WITH_AES_128_CBC_SHA".to_string(),
            cipher_suite_id: Some(0x002f),
            protocol,
            verified: true,
            path,
        }
    }

    /// Standard handshake that replays scripted outcomes
    pub struct ScriptedStandard {
        pub outcomes: RefCell<Vec<StandardOutcome>>,
        pub calls: RefCell<Vec<TrustMode>>,
    }

    impl ScriptedStandard {
        pub fn new(mut outcomes: Vec<StandardOutcome>) -> Self {
            outcomes.reverse();
            Self {
                outcomes: RefCell::new(outcomes),
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl StandardHandshake for ScriptedStandard {
        fn handshake(&self, _target: &Target, trust: TrustMode) -> Result<StandardOutcome> {
            self.calls.borrow_mut().push(trust);
            self.outcomes
                .borrow_mut()
                .pop()
                .ok_or_else(|| TlsError::Other("no scripted outcome left".to_string()))
        }
    }

    /// Legacy handshake that records the requested version
    pub struct RecordingLegacy {
        pub succeed: bool,
        pub calls: RefCell<Vec<Protocol>>,
    }

    impl RecordingLegacy {
        pub fn new(succeed: bool) -> Self {
            Self {
                succeed,
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl LegacyHandshake for RecordingLegacy {
        fn handshake(&self, _target: &Target, protocol: Protocol) -> Result<LegacyOutcome> {
            self.calls.borrow_mut().push(protocol);
            if self.succeed {
                Ok(LegacyOutcome::Established(Box::new(session_info(
                    protocol,
                    SessionPath::Legacy,
                ))))
            } else {
                Ok(LegacyOutcome::Unsupported {
                    state: LegacyState::SentClientHello,
                    reason: "handshake_failure alert".to_string(),
                })
            }
        }
    }
}
