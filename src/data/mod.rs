// Data module - Embedded lookup tables

pub mod cipher_mapping;

pub use cipher_mapping::{normalize_cipher_name, openssl_to_iana};
