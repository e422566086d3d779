// Certificate Parser - Decode DER certificates into display-ready fields

use crate::error::CertificateValidationError;
use crate::Result;
use chrono::{DateTime, Utc};
use openssl::hash::MessageDigest;
use openssl::pkey::Id;
use openssl::x509::X509 as OpensslX509;
use serde::Serialize;
use x509_parser::prelude::*;

/// Parsed X.509 certificate
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Certificate {
    pub subject: String,
    pub issuer: String,
    pub serial_number: String,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
    pub signature_algorithm: String,
    pub public_key_algorithm: String,
    pub public_key_size: Option<u32>,
    pub san: Vec<String>, // Subject Alternative Names
    pub is_ca: bool,
    /// SHA256 of the DER encoding, colon-separated hex
    pub fingerprint_sha256: String,
    #[serde(skip)]
    pub der_bytes: Vec<u8>,
}

impl Certificate {
    pub fn is_self_signed(&self) -> bool {
        self.subject == self.issuer
    }

    /// Check the validity window against `now`
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.not_before <= now && now <= self.not_after
    }
}

/// Certificate chain as sent by the server, leaf first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CertificateChain {
    pub certificates: Vec<Certificate>,
}

impl CertificateChain {
    /// Get the leaf (server) certificate
    pub fn leaf(&self) -> Option<&Certificate> {
        self.certificates.first()
    }

    pub fn intermediates(&self) -> &[Certificate] {
        self.certificates.get(1..).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.certificates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.certificates.is_empty()
    }

    /// DER encodings in chain order
    pub fn der_chain(&self) -> Vec<Vec<u8>> {
        self.certificates.iter().map(|c| c.der_bytes.clone()).collect()
    }
}

fn parse_error(details: String) -> crate::TlsError {
    CertificateValidationError::ParseError { details }.into()
}

/// Parse a single certificate from DER bytes
pub fn parse_certificate(der_bytes: &[u8]) -> Result<Certificate> {
    let (_, cert) = X509Certificate::from_der(der_bytes)
        .map_err(|e| parse_error(format!("Failed to parse certificate: {:?}", e)))?;

    let mut san = Vec::new();
    if let Ok(Some(ext)) = cert.subject_alternative_name() {
        for name in &ext.value.general_names {
            match name {
                GeneralName::DNSName(dns) => san.push(dns.to_string()),
                GeneralName::IPAddress(ip) => san.push(format!("IP:{}", hex::encode(ip))),
                _ => {}
            }
        }
    }

    let is_ca = cert
        .basic_constraints()
        .map(|bc| bc.map(|ext| ext.value.ca).unwrap_or(false))
        .unwrap_or(false);

    let validity = cert.validity();
    let not_before = asn1_to_utc(validity.not_before.timestamp())?;
    let not_after = asn1_to_utc(validity.not_after.timestamp())?;

    // OpenSSL gives readable algorithm names and key sizes
    let openssl_cert = OpensslX509::from_der(der_bytes)?;
    let signature_algorithm = openssl_cert
        .signature_algorithm()
        .object()
        .nid()
        .long_name()
        .map(str::to_string)
        .unwrap_or_else(|_| cert.signature_algorithm.algorithm.to_id_string());

    let (public_key_algorithm, public_key_size) = match openssl_cert.public_key() {
        Ok(key) => (key_algorithm_name(key.id()), Some(key.bits())),
        Err(_) => ("Unknown".to_string(), None),
    };

    Ok(Certificate {
        subject: cert.subject().to_string(),
        issuer: cert.issuer().to_string(),
        serial_number: cert.raw_serial_as_string(),
        not_before,
        not_after,
        signature_algorithm,
        public_key_algorithm,
        public_key_size,
        san,
        is_ca,
        fingerprint_sha256: calculate_fingerprint_sha256(der_bytes)?,
        der_bytes: der_bytes.to_vec(),
    })
}

/// Parse every certificate of a chain, leaf first
pub fn parse_chain(ders: &[Vec<u8>]) -> Result<CertificateChain> {
    let certificates = ders
        .iter()
        .map(|der| parse_certificate(der))
        .collect::<Result<Vec<_>>>()?;
    Ok(CertificateChain { certificates })
}

fn asn1_to_utc(timestamp: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(timestamp, 0)
        .ok_or_else(|| parse_error(format!("validity timestamp {} out of range", timestamp)))
}

fn key_algorithm_name(id: Id) -> String {
    match id {
        Id::RSA => "RSA",
        Id::EC => "EC",
        Id::DSA => "DSA",
        Id::DH => "DH",
        Id::ED25519 => "Ed25519",
        Id::ED448 => "Ed448",
        _ => "Unknown",
    }
    .to_string()
}

/// Calculate certificate fingerprint SHA256
fn calculate_fingerprint_sha256(der_bytes: &[u8]) -> Result<String> {
    let digest = openssl::hash::hash(MessageDigest::sha256(), der_bytes)?;

    Ok(digest
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(":"))
}
