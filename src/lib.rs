// tlsprobe - TLS/SSL handshake prober
// Licensed under GPL-3.0

//! tlsprobe crafts raw TLS/SSL handshakes to detect historical weaknesses
//! (RC4 support, TLS compression, export-grade DH) and to characterize the
//! session a server negotiates, including SSLv2/SSLv3 servers that no modern
//! library will talk to.

pub mod certificates;
pub mod ciphers;
pub mod cli;
pub mod data;
pub mod error;
pub mod output;
pub mod protocols;
pub mod scanner;
pub mod session;
pub mod transport;
pub mod utils;
pub mod vulnerabilities;

// Re-export commonly used types
pub use crate::cli::Args;
pub use crate::error::TlsError;
pub use crate::scanner::Scanner;

/// Result type for tlsprobe operations
pub type Result<T> = std::result::Result<T, TlsError>;
