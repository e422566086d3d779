// Error types for tlsprobe
//
// Only connection-level failures are errors. Protocol mismatches, alerts,
// malformed responses and untrusted certificates are reported as data by the
// modules that observe them.

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Main error type for probing operations
#[derive(Debug, Error)]
pub enum TlsError {
    /// Connect or read exceeded its bound
    #[error("Connection timeout after {duration:?} to {addr}")]
    ConnectionTimeout { duration: Duration, addr: String },

    /// DNS resolution failed for the hostname
    #[error("DNS resolution failed for {hostname}: {details}")]
    DnsResolutionFailed { hostname: String, details: String },

    /// Connection could not be established, after retries when the error was transient
    #[error("Connection to {addr} failed after {attempts} attempt(s): {source}")]
    ConnectionFailed {
        addr: String,
        attempts: usize,
        #[source]
        source: io::Error,
    },

    /// Protocol version not supported by server
    #[error("Protocol {protocol} not supported by server")]
    ProtocolNotSupported { protocol: String },

    /// TLS handshake failed or is invalid
    #[error("Invalid TLS handshake: {details}")]
    InvalidHandshake { details: String },

    /// Certificate validation error
    #[error("Certificate validation failed: {0}")]
    CertificateError(#[from] CertificateValidationError),

    /// Generic I/O error
    #[error("I/O error: {source}")]
    IoError {
        #[from]
        source: io::Error,
    },

    /// Parsing error for wire data or certificates
    #[error("Parse error: {message}")]
    ParseError { message: String },

    /// OpenSSL-specific errors
    #[error("OpenSSL error: {0}")]
    OpenSslError(#[from] openssl::error::ErrorStack),

    /// URL parsing errors
    #[error("Invalid URL: {0}")]
    UrlParseError(#[from] url::ParseError),

    /// Invalid input from user or configuration
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    /// Serialization errors
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl TlsError {
    /// True for failures that mean the target could not be reached at all
    pub fn is_unreachable(&self) -> bool {
        matches!(
            self,
            TlsError::ConnectionTimeout { .. }
                | TlsError::DnsResolutionFailed { .. }
                | TlsError::ConnectionFailed { .. }
        )
    }
}

/// Certificate validation specific errors
#[derive(Debug, Error)]
pub enum CertificateValidationError {
    /// Certificate chain is empty, unordered or unparsable
    #[error("Invalid certificate chain: {reason}")]
    InvalidChain { reason: String },

    /// Invalid signature or untrusted anchor
    #[error("Certificate not trusted: {reason}")]
    Untrusted { reason: String },

    /// Invalid certificate format or parsing error
    #[error("Certificate parsing error: {details}")]
    ParseError { details: String },
}

impl<S: std::fmt::Debug> From<openssl::ssl::HandshakeError<S>> for TlsError {
    fn from(err: openssl::ssl::HandshakeError<S>) -> Self {
        TlsError::InvalidHandshake {
            details: format!("SSL handshake error: {}", err),
        }
    }
}

/// Helper macro for creating context-specific errors
#[macro_export]
macro_rules! tls_bail {
    ($msg:literal $(,)?) => {
        return Err($crate::error::TlsError::Other($msg.to_string()))
    };
    ($fmt:expr, $($arg:tt)*) => {
        return Err($crate::error::TlsError::Other(format!($fmt, $($arg)*)))
    };
}
