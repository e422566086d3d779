// Cipher Mapping - OpenSSL cipher names to IANA names

use crate::ciphers::catalog;
use lazy_static::lazy_static;
use std::collections::HashMap;

/// (hexcode, OpenSSL name); IANA names come from the catalog
const OPENSSL_NAMES: &[(u16, &str)] = &[
    // TLS 1.3 (OpenSSL already reports IANA names)
    (0x1301, "TLS_AES_128_GCM_SHA256"),
    (0x1302, "TLS_AES_256_GCM_SHA384"),
    (0x1303, "TLS_CHACHA20_POLY1305_SHA256"),
    // ECDHE
    (0xc02b, "ECDHE-ECDSA-AES128-GCM-SHA256"),
    (0xc02c, "ECDHE-ECDSA-AES256-GCM-SHA384"),
    (0xc02f, "ECDHE-RSA-AES128-GCM-SHA256"),
    (0xc030, "ECDHE-RSA-AES256-GCM-SHA384"),
    (0xcca8, "ECDHE-RSA-CHACHA20-POLY1305"),
    (0xcca9, "ECDHE-ECDSA-CHACHA20-POLY1305"),
    (0xc023, "ECDHE-ECDSA-AES128-SHA256"),
    (0xc024, "ECDHE-ECDSA-AES256-SHA384"),
    (0xc027, "ECDHE-RSA-AES128-SHA256"),
    (0xc028, "ECDHE-RSA-AES256-SHA384"),
    (0xc009, "ECDHE-ECDSA-AES128-SHA"),
    (0xc00a, "ECDHE-ECDSA-AES256-SHA"),
    (0xc013, "ECDHE-RSA-AES128-SHA"),
    (0xc014, "ECDHE-RSA-AES256-SHA"),
    (0xc008, "ECDHE-ECDSA-DES-CBC3-SHA"),
    (0xc012, "ECDHE-RSA-DES-CBC3-SHA"),
    (0xc007, "ECDHE-ECDSA-RC4-SHA"),
    (0xc011, "ECDHE-RSA-RC4-SHA"),
    (0xc006, "ECDHE-ECDSA-NULL-SHA"),
    (0xc010, "ECDHE-RSA-NULL-SHA"),
    // ECDH
    (0xc002, "ECDH-ECDSA-RC4-SHA"),
    (0xc00c, "ECDH-RSA-RC4-SHA"),
    (0xc004, "ECDH-ECDSA-AES128-SHA"),
    (0xc005, "ECDH-ECDSA-AES256-SHA"),
    (0xc00e, "ECDH-RSA-AES128-SHA"),
    (0xc00f, "ECDH-RSA-AES256-SHA"),
    // DHE
    (0x009e, "DHE-RSA-AES128-GCM-SHA256"),
    (0x009f, "DHE-RSA-AES256-GCM-SHA384"),
    (0x00a2, "DHE-DSS-AES128-GCM-SHA256"),
    (0x00a3, "DHE-DSS-AES256-GCM-SHA384"),
    (0xccaa, "DHE-RSA-CHACHA20-POLY1305"),
    (0x0067, "DHE-RSA-AES128-SHA256"),
    (0x006b, "DHE-RSA-AES256-SHA256"),
    (0x0040, "DHE-DSS-AES128-SHA256"),
    (0x006a, "DHE-DSS-AES256-SHA256"),
    (0x0033, "DHE-RSA-AES128-SHA"),
    (0x0039, "DHE-RSA-AES256-SHA"),
    (0x0032, "DHE-DSS-AES128-SHA"),
    (0x0038, "DHE-DSS-AES256-SHA"),
    (0x0045, "DHE-RSA-CAMELLIA128-SHA"),
    (0x0088, "DHE-RSA-CAMELLIA256-SHA"),
    (0x009a, "DHE-RSA-SEED-SHA"),
    (0x0016, "EDH-RSA-DES-CBC3-SHA"),
    (0x0013, "EDH-DSS-DES-CBC3-SHA"),
    (0x0015, "EDH-RSA-DES-CBC-SHA"),
    (0x0012, "EDH-DSS-DES-CBC-SHA"),
    (0x0014, "EXP-EDH-RSA-DES-CBC-SHA"),
    (0x0011, "EXP-EDH-DSS-DES-CBC-SHA"),
    // Static DH
    (0x000e, "EXP-DH-RSA-DES-CBC-SHA"),
    (0x000b, "EXP-DH-DSS-DES-CBC-SHA"),
    // Anonymous
    (0x0018, "ADH-RC4-MD5"),
    (0x0017, "EXP-ADH-RC4-MD5"),
    (0x0019, "EXP-ADH-DES-CBC-SHA"),
    (0x001b, "ADH-DES-CBC3-SHA"),
    (0x0034, "ADH-AES128-SHA"),
    (0x003a, "ADH-AES256-SHA"),
    (0xc016, "AECDH-RC4-SHA"),
    // RSA
    (0x009c, "AES128-GCM-SHA256"),
    (0x009d, "AES256-GCM-SHA384"),
    (0x003c, "AES128-SHA256"),
    (0x003d, "AES256-SHA256"),
    (0x002f, "AES128-SHA"),
    (0x0035, "AES256-SHA"),
    (0x0041, "CAMELLIA128-SHA"),
    (0x0084, "CAMELLIA256-SHA"),
    (0x0096, "SEED-SHA"),
    (0x0007, "IDEA-CBC-SHA"),
    (0x000a, "DES-CBC3-SHA"),
    (0x0009, "DES-CBC-SHA"),
    (0x0004, "RC4-MD5"),
    (0x0005, "RC4-SHA"),
    (0x0003, "EXP-RC4-MD5"),
    (0x0006, "EXP-RC2-CBC-MD5"),
    (0x0008, "EXP-DES-CBC-SHA"),
    (0x0001, "NULL-MD5"),
    (0x0002, "NULL-SHA"),
    (0x003b, "NULL-SHA256"),
    // PSK
    (0x008a, "PSK-RC4-SHA"),
    (0x008c, "PSK-AES128-CBC-SHA"),
    (0x008d, "PSK-AES256-CBC-SHA"),
];

lazy_static! {
    static ref BY_OPENSSL_NAME: HashMap<&'static str, u16> =
        OPENSSL_NAMES.iter().map(|(code, name)| (*name, *code)).collect();
    static ref BY_HEXCODE: HashMap<u16, &'static str> = OPENSSL_NAMES.iter().copied().collect();
}

/// Hexcode for an OpenSSL cipher name
pub fn openssl_hexcode(openssl_name: &str) -> Option<u16> {
    BY_OPENSSL_NAME.get(openssl_name).copied()
}

/// IANA name for an OpenSSL cipher name
pub fn openssl_to_iana(openssl_name: &str) -> Option<&'static str> {
    openssl_hexcode(openssl_name).and_then(catalog::lookup)
}

/// OpenSSL name for a hexcode
pub fn openssl_name(hexcode: u16) -> Option<&'static str> {
    BY_HEXCODE.get(&hexcode).copied()
}

/// Best available IANA-style name for whatever the TLS library reported.
///
/// Names without a dash are assumed to be IANA names already; unknown
/// OpenSSL names are returned unchanged.
pub fn normalize_cipher_name(reported: &str) -> String {
    if !reported.contains('-') {
        return reported.to_string();
    }
    match openssl_to_iana(reported) {
        Some(iana) => iana.to_string(),
        None => {
            tracing::debug!("Cipher {} is not in the OpenSSL name table", reported);
            reported.to_string()
        }
    }
}
