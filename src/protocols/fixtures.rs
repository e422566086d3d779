// Test fixtures - Canned server responses

use super::handshake::{CONTENT_TYPE_ALERT, CONTENT_TYPE_HANDSHAKE, HANDSHAKE_SERVER_HELLO};

/// Minimal ServerHello record choosing `suite` and `compression`
pub fn server_hello_record(version: u16, suite: u16, compression: u8) -> Vec<u8> {
    let mut body = vec![HANDSHAKE_SERVER_HELLO, 0x00, 0x00, 0x00];
    body.extend_from_slice(&version.to_be_bytes());
    body.extend_from_slice(&[0xab; 32]);
    body.push(0);
    body.extend_from_slice(&suite.to_be_bytes());
    body.push(compression);
    let hs_len = body.len() - 4;
    body[3] = hs_len as u8;

    let mut record = vec![CONTENT_TYPE_HANDSHAKE, 0x03, (version & 0xff) as u8];
    record.extend_from_slice(&(body.len() as u16).to_be_bytes());
    record.extend_from_slice(&body);
    record
}

/// Fatal handshake_failure alert
pub fn handshake_failure_alert() -> Vec<u8> {
    vec![CONTENT_TYPE_ALERT, 0x03, 0x03, 0x00, 0x02, 0x02, 0x28]
}
