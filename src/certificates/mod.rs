// Certificates module - Certificate parsing and chain verification

pub mod parser;
pub mod validator;

pub use parser::{parse_certificate, parse_chain, Certificate, CertificateChain};
pub use validator::{check_chain_order, ChainVerification, ChainVerifier};

#[cfg(test)]
pub(crate) mod test_pki;
