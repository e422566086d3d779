// TLS Handshake Builder - Constructs raw ClientHello messages

use super::Protocol;
use crate::ciphers::catalog;
use crate::ciphers::Sslv2CipherKind;
use bytes::{BufMut, BytesMut};
use rand::RngCore;

pub const CONTENT_TYPE_HANDSHAKE: u8 = 0x16;
pub const CONTENT_TYPE_ALERT: u8 = 0x15;
pub const HANDSHAKE_CLIENT_HELLO: u8 = 0x01;
pub const HANDSHAKE_SERVER_HELLO: u8 = 0x02;
pub const HANDSHAKE_CERTIFICATE: u8 = 0x0b;
pub const HANDSHAKE_SERVER_HELLO_DONE: u8 = 0x0e;

pub const EXT_SUPPORTED_GROUPS: u16 = 0x000a;
pub const EXT_SIGNATURE_ALGORITHMS: u16 = 0x000d;

/// Groups advertised in every hello: x25519, secp256r1, x448, secp521r1, secp384r1
pub const DEFAULT_SUPPORTED_GROUPS: &[u16] = &[0x001d, 0x0017, 0x001e, 0x0019, 0x0018];

/// (hash, signature) pairs advertised in every hello
pub const DEFAULT_SIGNATURE_ALGORITHMS: &[(u8, u8)] = &[
    (0x04, 0x03), // ecdsa_secp256r1_sha256
    (0x05, 0x03), // ecdsa_secp384r1_sha384
    (0x06, 0x03), // ecdsa_secp521r1_sha512
    (0x08, 0x07), // ed25519
    (0x08, 0x08), // ed448
    (0x08, 0x09), // rsa_pss_pss_sha256
    (0x08, 0x0a), // rsa_pss_pss_sha384
    (0x08, 0x0b), // rsa_pss_pss_sha512
    (0x08, 0x04), // rsa_pss_rsae_sha256
    (0x08, 0x05), // rsa_pss_rsae_sha384
    (0x08, 0x06), // rsa_pss_rsae_sha512
    (0x04, 0x01), // rsa_pkcs1_sha256
    (0x05, 0x01), // rsa_pkcs1_sha384
    (0x06, 0x01), // rsa_pkcs1_sha512
    (0x03, 0x03), // SHA224-ECDSA
    (0x03, 0x01), // SHA224-RSA
    (0x03, 0x02), // SHA224-DSA
    (0x04, 0x02), // SHA256-DSA
    (0x05, 0x02), // SHA384-DSA
    (0x06, 0x02), // SHA512-DSA
];

/// Compression methods a hello can offer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    Null,
    Deflate,
}

impl Compression {
    pub fn method(&self) -> u8 {
        match self {
            Compression::Null => 0x00,
            Compression::Deflate => 0x01,
        }
    }
}

/// ClientHello message builder
///
/// Suite codes are passed through unchecked; probing servers with odd
/// offers is the point.
#[derive(Debug, Clone)]
pub struct ClientHelloBuilder {
    protocol: Protocol,
    cipher_suites: Vec<u16>,
    fill_defaults: bool,
    compression: Compression,
}

impl ClientHelloBuilder {
    /// Create new ClientHello builder
    pub fn new(protocol: Protocol) -> Self {
        Self {
            protocol,
            cipher_suites: Vec::new(),
            fill_defaults: true,
            compression: Compression::Null,
        }
    }

    /// Add cipher suite by hex code
    pub fn add_cipher(&mut self, hexcode: u16) -> &mut Self {
        self.cipher_suites.push(hexcode);
        self
    }

    /// Add multiple cipher suites
    pub fn add_ciphers(&mut self, hexcodes: &[u16]) -> &mut Self {
        self.cipher_suites.extend_from_slice(hexcodes);
        self
    }

    /// Append the version's default suite list after the caller's suites
    pub fn fill_default_ciphers(&mut self, fill: bool) -> &mut Self {
        self.fill_defaults = fill;
        self
    }

    /// Offer a single compression method
    pub fn with_compression(&mut self, compression: Compression) -> &mut Self {
        self.compression = compression;
        self
    }

    /// Suite codes in the order they go on the wire
    pub fn cipher_codes(&self) -> Vec<u16> {
        let mut codes = self.cipher_suites.clone();
        if self.fill_defaults {
            codes.extend_from_slice(catalog::default_hexcodes(self.protocol));
        }
        codes
    }

    /// Build the complete ClientHello record with a fresh random
    pub fn build(&self) -> Vec<u8> {
        let mut random = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut random);
        self.build_with_random(&random)
    }

    fn build_with_random(&self, random: &[u8; 32]) -> Vec<u8> {
        let minor = self.protocol.minor();
        let mut buf = BytesMut::new();

        // Record layer
        buf.put_u8(CONTENT_TYPE_HANDSHAKE);
        buf.put_u8(0x03);
        buf.put_u8(minor);
        let record_length_pos = buf.len();
        buf.put_u16(0);

        // Handshake header
        let handshake_start = buf.len();
        buf.put_u8(HANDSHAKE_CLIENT_HELLO);
        let handshake_length_pos = buf.len();
        buf.put_u8(0);
        buf.put_u16(0);

        let hello_start = buf.len();
        buf.put_u8(0x03);
        buf.put_u8(minor);
        buf.put_slice(random);

        // Empty session id: always a fresh handshake
        buf.put_u8(0);

        let codes = self.cipher_codes();
        buf.put_u16((codes.len() * 2) as u16);
        for code in &codes {
            buf.put_u16(*code);
        }

        buf.put_u8(1);
        buf.put_u8(self.compression.method());

        let extensions = default_extensions();
        buf.put_u16(extensions.len() as u16);
        buf.put_slice(&extensions);

        let handshake_len = buf.len() - hello_start;
        buf[handshake_length_pos] = ((handshake_len >> 16) & 0xff) as u8;
        buf[handshake_length_pos + 1..handshake_length_pos + 3]
            .copy_from_slice(&((handshake_len & 0xffff) as u16).to_be_bytes());

        let record_len = buf.len() - handshake_start;
        buf[record_length_pos..record_length_pos + 2]
            .copy_from_slice(&(record_len as u16).to_be_bytes());

        buf.to_vec()
    }
}

/// supported_groups followed by signature_algorithms, identical for every version
pub fn default_extensions() -> Vec<u8> {
    let mut buf = BytesMut::new();

    buf.put_u16(EXT_SUPPORTED_GROUPS);
    buf.put_u16((DEFAULT_SUPPORTED_GROUPS.len() * 2 + 2) as u16);
    buf.put_u16((DEFAULT_SUPPORTED_GROUPS.len() * 2) as u16);
    for group in DEFAULT_SUPPORTED_GROUPS {
        buf.put_u16(*group);
    }

    buf.put_u16(EXT_SIGNATURE_ALGORITHMS);
    buf.put_u16((DEFAULT_SIGNATURE_ALGORITHMS.len() * 2 + 2) as u16);
    buf.put_u16((DEFAULT_SIGNATURE_ALGORITHMS.len() * 2) as u16);
    for (hash, sig) in DEFAULT_SIGNATURE_ALGORITHMS {
        buf.put_u8(*hash);
        buf.put_u8(*sig);
    }

    buf.to_vec()
}

/// SSLv2 CLIENT-HELLO builder
#[derive(Debug, Clone)]
pub struct Sslv2ClientHello {
    cipher_kinds: Vec<[u8; 3]>,
}

impl Sslv2ClientHello {
    /// Hello offering every known SSLv2 cipher kind
    pub fn new() -> Self {
        Self::with_kinds(catalog::sslv2_cipher_kinds())
    }

    pub fn with_kinds(kinds: &[Sslv2CipherKind]) -> Self {
        Self {
            cipher_kinds: kinds.iter().map(|k| k.code).collect(),
        }
    }

    /// Build the two-byte-header record with a fresh 16-byte challenge
    pub fn build(&self) -> Vec<u8> {
        let mut challenge = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut challenge);

        let mut body = BytesMut::new();
        body.put_u8(HANDSHAKE_CLIENT_HELLO);
        body.put_u16(Protocol::SSLv2.as_hex());
        body.put_u16((self.cipher_kinds.len() * 3) as u16);
        body.put_u16(0); // session id length
        body.put_u16(challenge.len() as u16);
        for kind in &self.cipher_kinds {
            body.put_slice(kind);
        }
        body.put_slice(&challenge);

        let mut buf = BytesMut::with_capacity(body.len() + 2);
        buf.put_u16(0x8000 | body.len() as u16);
        buf.put_slice(&body);
        buf.to_vec()
    }
}

impl Default for Sslv2ClientHello {
    fn default() -> Self {
        Self::new()
    }
}
