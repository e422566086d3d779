// Ciphers module - Cipher suite definitions, per-version catalog and filtering

use regex::Regex;
use serde::Serialize;
use std::fmt;

pub mod catalog;

pub use catalog::{lookup, sslv2_cipher_kinds, suites_for};

/// Cipher suite identified by its 2-byte wire code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct CipherSuite {
    pub hexcode: u16,
    pub iana_name: &'static str,
}

impl CipherSuite {
    pub const fn new(hexcode: u16, iana_name: &'static str) -> Self {
        Self { hexcode, iana_name }
    }

    /// Hexcode as lowercase string (e.g. "c02f")
    pub fn hex(&self) -> String {
        format!("{:04x}", self.hexcode)
    }

    pub fn is_export(&self) -> bool {
        self.iana_name.contains("EXPORT")
    }
}

impl fmt::Display for CipherSuite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:04x})", self.iana_name, self.hexcode)
    }
}

/// SSLv2 cipher kind, a 3-byte wire code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Sslv2CipherKind {
    pub code: [u8; 3],
    pub name: &'static str,
}

/// Predicate used to narrow a suite list
pub enum CipherFilter {
    /// IANA name contains the given text
    Contains(&'static str),
    /// IANA name matches the regular expression
    Pattern(Regex),
    /// Caller-supplied predicate
    Custom(fn(&CipherSuite) -> bool),
}

impl CipherFilter {
    /// Build a pattern filter, e.g. `DH.*EXPORT`
    pub fn pattern(pattern: &str) -> crate::Result<Self> {
        let regex = Regex::new(pattern).map_err(|e| crate::TlsError::InvalidInput {
            message: format!("invalid cipher pattern {:?}: {}", pattern, e),
        })?;
        Ok(CipherFilter::Pattern(regex))
    }

    pub fn matches(&self, suite: &CipherSuite) -> bool {
        match self {
            CipherFilter::Contains(text) => suite.iana_name.contains(text),
            CipherFilter::Pattern(regex) => regex.is_match(suite.iana_name),
            CipherFilter::Custom(predicate) => predicate(suite),
        }
    }
}

/// Subset of `suites` matching `filter`, in the original order.
///
/// An empty result is a normal outcome; callers treat it as "nothing to test".
pub fn filter(suites: &[CipherSuite], filter: &CipherFilter) -> Vec<CipherSuite> {
    suites.iter().filter(|s| filter.matches(s)).copied().collect()
}

/// Wire codes of a suite list, for the handshake builder
pub fn hexcodes(suites: &[CipherSuite]) -> Vec<u16> {
    suites.iter().map(|s| s.hexcode).collect()
}
