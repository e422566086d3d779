// Certificate Validator - Chain order and trust verification through OpenSSL

use super::parser::parse_chain;
use crate::error::CertificateValidationError;
use crate::Result;
use openssl::error::ErrorStack;
use openssl::stack::Stack;
use openssl::x509::store::{X509Store, X509StoreBuilder};
use openssl::x509::{X509, X509StoreContext};
use serde::Serialize;

/// Outcome of checking one chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainVerification {
    pub verified: bool,
    /// Why verification failed, when it did
    pub reason: Option<String>,
}

impl ChainVerification {
    fn trusted() -> Self {
        Self {
            verified: true,
            reason: None,
        }
    }

    fn rejected(reason: impl Into<String>) -> Self {
        Self {
            verified: false,
            reason: Some(reason.into()),
        }
    }
}

/// Every certificate parses and certificate n is issued by certificate n+1
pub fn check_chain_order(ders: &[Vec<u8>]) -> std::result::Result<(), CertificateValidationError> {
    if ders.is_empty() {
        return Err(CertificateValidationError::InvalidChain {
            reason: "server sent no certificates".to_string(),
        });
    }

    let chain = parse_chain(ders).map_err(|e| CertificateValidationError::ParseError {
        details: e.to_string(),
    })?;

    for (depth, pair) in chain.certificates.windows(2).enumerate() {
        if pair[0].issuer != pair[1].subject {
            return Err(CertificateValidationError::InvalidChain {
                reason: format!(
                    "issuer of certificate {} ({}) does not match subject of certificate {} ({})",
                    depth,
                    pair[0].issuer,
                    depth + 1,
                    pair[1].subject
                ),
            });
        }
    }

    Ok(())
}

/// Verifies signatures, validity and trust anchors with an OpenSSL store
pub struct ChainVerifier {
    store: X509Store,
}

impl ChainVerifier {
    /// System trust store (OpenSSL default paths)
    pub fn system() -> Result<Self> {
        Self::build(&[], true)
    }

    /// System trust store plus extra anchors
    pub fn with_anchors(anchors: &[Vec<u8>]) -> Result<Self> {
        Self::build(anchors, true)
    }

    /// Only the given anchors are trusted
    pub fn anchors_only(anchors: &[Vec<u8>]) -> Result<Self> {
        Self::build(anchors, false)
    }

    fn build(anchors: &[Vec<u8>], system: bool) -> Result<Self> {
        let mut builder = X509StoreBuilder::new()?;
        if system {
            builder.set_default_paths()?;
        }
        for der in anchors {
            builder.add_cert(X509::from_der(der)?)?;
        }
        Ok(Self {
            store: builder.build(),
        })
    }

    /// Check order, then signatures and trust. Hostnames are not checked.
    pub fn verify(&self, ders: &[Vec<u8>]) -> Result<ChainVerification> {
        if let Err(e) = check_chain_order(ders) {
            tracing::debug!("Chain rejected before trust check: {}", e);
            return Ok(ChainVerification::rejected(e.to_string()));
        }

        let (leaf, intermediates) = match decode_chain(ders) {
            Ok(decoded) => decoded,
            Err(e) => {
                tracing::debug!("OpenSSL could not decode the chain: {}", e);
                return Ok(ChainVerification::rejected(format!(
                    "certificate not decodable: {}",
                    e
                )));
            }
        };

        let mut context = X509StoreContext::new()?;
        let (ok, error) = context.init(&self.store, &leaf, &intermediates, |ctx| {
            let ok = ctx.verify_cert()?;
            Ok((ok, ctx.error()))
        })?;

        if ok {
            Ok(ChainVerification::trusted())
        } else {
            let reason = CertificateValidationError::Untrusted {
                reason: error.error_string().to_string(),
            };
            tracing::debug!("{}", reason);
            Ok(ChainVerification::rejected(reason.to_string()))
        }
    }
}

fn decode_chain(ders: &[Vec<u8>]) -> std::result::Result<(X509, Stack<X509>), ErrorStack> {
    let (leaf, rest) = match ders.split_first() {
        Some(split) => split,
        None => return Err(ErrorStack::get()),
    };
    let leaf = X509::from_der(leaf)?;
    let mut intermediates = Stack::new()?;
    for der in rest {
        intermediates.push(X509::from_der(der)?)?;
    }
    Ok((leaf, intermediates))
}
