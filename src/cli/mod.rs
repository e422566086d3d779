// CLI module - Command line interface and argument parsing
// Licensed under GPL-3.0

use clap::Parser;

mod connection_args;
mod output_args;
mod scan_args;

pub use connection_args::ConnectionArgs;
pub use output_args::OutputArgs;
pub use scan_args::{ProbeArg, ScanArgs};

/// tlsprobe - Crafted-handshake TLS/SSL vulnerability prober
///
/// The Args struct composes the domain-specific sub-structs with clap's
/// #[command(flatten)]:
/// - Target selection
/// - Core scanning (ScanArgs)
/// - Output formats (OutputArgs)
/// - Connection and timeout settings (ConnectionArgs)
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, long_about = None)]
#[command(name = "tlsprobe")]
#[command(about = "Crafted-handshake TLS/SSL vulnerability prober", long_about = None)]
pub struct Args {
    // ============ Target Selection ============
    /// Target (host, host:port or URL)
    #[arg(value_name = "URI")]
    pub target: String,

    /// Ports to test; overrides any port in the target
    #[arg(short = 'p', long = "port", value_name = "PORT", value_delimiter = ',')]
    pub ports: Vec<u16>,

    // ============ Core Scanning Options ============
    #[command(flatten)]
    pub scan: ScanArgs,

    // ============ Output Formats and Display ============
    #[command(flatten)]
    pub output: OutputArgs,

    // ============ Connection and Timeout Settings ============
    #[command(flatten)]
    pub connection: ConnectionArgs,
}
