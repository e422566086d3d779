// Protocols module - TLS/SSL protocol versions, handshake crafting and response parsing

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// TLS/SSL protocol versions, ordered oldest to newest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub enum Protocol {
    SSLv2,
    SSLv3,
    TLS10,
    TLS11,
    TLS12,
}

impl Protocol {
    /// Get protocol version as hex value
    pub fn as_hex(&self) -> u16 {
        match self {
            Protocol::SSLv2 => 0x0002,
            Protocol::SSLv3 => 0x0300,
            Protocol::TLS10 => 0x0301,
            Protocol::TLS11 => 0x0302,
            Protocol::TLS12 => 0x0303,
        }
    }

    /// Minor version byte as it appears after the 0x03 major byte
    pub fn minor(&self) -> u8 {
        (self.as_hex() & 0xff) as u8
    }

    /// Get protocol name, spelled the way OpenSSL reports it
    pub fn name(&self) -> &'static str {
        match self {
            Protocol::SSLv2 => "SSLv2",
            Protocol::SSLv3 => "SSLv3",
            Protocol::TLS10 => "TLSv1.0",
            Protocol::TLS11 => "TLSv1.1",
            Protocol::TLS12 => "TLSv1.2",
        }
    }

    /// Versions no maintained library will negotiate
    pub fn is_legacy(&self) -> bool {
        matches!(self, Protocol::SSLv2 | Protocol::SSLv3)
    }

    /// All versions, newest first (fallback order)
    pub fn all_descending() -> Vec<Protocol> {
        vec![
            Protocol::TLS12,
            Protocol::TLS11,
            Protocol::TLS10,
            Protocol::SSLv3,
            Protocol::SSLv2,
        ]
    }

    /// Look up a protocol by its wire version
    pub fn from_wire(value: u16) -> Option<Protocol> {
        match value {
            0x0002 => Some(Protocol::SSLv2),
            0x0300 => Some(Protocol::SSLv3),
            0x0301 => Some(Protocol::TLS10),
            0x0302 => Some(Protocol::TLS11),
            0x0303 => Some(Protocol::TLS12),
            _ => None,
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Protocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SSLv2" | "SSL 2.0" => Ok(Protocol::SSLv2),
            "SSLv3" | "SSL 3.0" => Ok(Protocol::SSLv3),
            "TLS 1.0" | "TLSv1.0" | "TLSv1" => Ok(Protocol::TLS10),
            "TLS 1.1" | "TLSv1.1" => Ok(Protocol::TLS11),
            "TLS 1.2" | "TLSv1.2" => Ok(Protocol::TLS12),
            _ => Err(format!("Unknown protocol: {}", s)),
        }
    }
}

/// Whether one version was accepted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolTestResult {
    pub protocol: Protocol,
    pub supported: bool,
    /// Suite the server picked, when it answered with a ServerHello
    pub cipher_suite: Option<u16>,
    pub handshake_time_ms: Option<u64>,
}

pub mod handshake;
pub mod response;
pub mod tester;

#[cfg(test)]
pub(crate) mod fixtures;
