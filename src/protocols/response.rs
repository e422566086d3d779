// Response classifier - Turns raw server bytes into a handshake outcome

use super::handshake::{CONTENT_TYPE_ALERT, CONTENT_TYPE_HANDSHAKE, HANDSHAKE_SERVER_HELLO};
use super::Protocol;
use serde::Serialize;

/// SSLv2 SERVER-HELLO message type
pub const SSLV2_SERVER_HELLO: u8 = 0x04;

/// Alert description sent by servers rejecting every offered suite
pub const ALERT_HANDSHAKE_FAILURE: u8 = 0x28;

/// Fields of a ServerHello that probes look at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ServerHelloSummary {
    /// Wire version chosen by the server
    pub version: u16,
    /// Selected suite, absent when the message was cut short
    pub cipher_suite: Option<u16>,
    /// Selected compression method, absent when the message was cut short
    pub compression: Option<u8>,
}

impl ServerHelloSummary {
    pub fn protocol(&self) -> Option<Protocol> {
        Protocol::from_wire(self.version)
    }

    /// True when the server accepted a compression method other than null
    pub fn compression_enabled(&self) -> bool {
        matches!(self.compression, Some(method) if method != 0x00)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Alert {
    pub level: u8,
    pub description: u8,
}

impl Alert {
    pub fn is_handshake_failure(&self) -> bool {
        self.description == ALERT_HANDSHAKE_FAILURE
    }
}

/// What came back for one ClientHello
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ServerResponse {
    ServerHello(ServerHelloSummary),
    Alert(Alert),
    /// Empty, truncated or unrecognised bytes
    Malformed,
}

impl ServerResponse {
    pub fn is_server_hello(&self) -> bool {
        matches!(self, ServerResponse::ServerHello(_))
    }

    pub fn server_hello(&self) -> Option<&ServerHelloSummary> {
        match self {
            ServerResponse::ServerHello(summary) => Some(summary),
            _ => None,
        }
    }
}

/// Classify the first record of a server response.
///
/// Total over all inputs: every index is bounds-checked.
pub fn classify(data: &[u8]) -> ServerResponse {
    if data.len() < 6 {
        return ServerResponse::Malformed;
    }

    match data[0] {
        CONTENT_TYPE_HANDSHAKE if data[5] == HANDSHAKE_SERVER_HELLO => {
            ServerResponse::ServerHello(summarize_server_hello(data))
        }
        CONTENT_TYPE_ALERT if data.len() >= 7 => ServerResponse::Alert(Alert {
            level: data[5],
            description: data[6],
        }),
        first if first & 0x80 != 0 && data[2] == SSLV2_SERVER_HELLO => {
            ServerResponse::ServerHello(ServerHelloSummary {
                version: u16::from_be_bytes([data[5], data.get(6).copied().unwrap_or(0)]),
                cipher_suite: None,
                compression: None,
            })
        }
        _ => ServerResponse::Malformed,
    }
}

fn summarize_server_hello(data: &[u8]) -> ServerHelloSummary {
    // record header (5) + handshake type (1) + length (3)
    let mut offset = 9;

    let version = read_u16(data, offset).unwrap_or_else(|| u16::from_be_bytes([data[1], data[2]]));
    offset += 2 + 32;

    let session_id_len = data.get(offset).map(|len| *len as usize);
    let (cipher_suite, compression) = match session_id_len {
        Some(len) => {
            offset += 1 + len;
            (read_u16(data, offset), data.get(offset + 2).copied())
        }
        None => (None, None),
    };

    ServerHelloSummary {
        version,
        cipher_suite,
        compression,
    }
}

fn read_u16(data: &[u8], offset: usize) -> Option<u16> {
    let bytes = data.get(offset..offset + 2)?;
    Some(u16::from_be_bytes([bytes[0], bytes[1]]))
}
