// tlsprobe - TLS/SSL handshake prober
// Licensed under GPL-3.0
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, version 3.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use tlsprobe::output::{display_results, generate_json, write_json_file};
use tlsprobe::{Args, Scanner};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    // Initialize logging - respect RUST_LOG environment variable
    let log_level = std::env::var("RUST_LOG")
        .ok()
        .and_then(|s| s.parse::<Level>().ok())
        .unwrap_or(Level::INFO);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    let args = Args::parse();

    // Handle --no-color (disable colored output)
    if args.output.no_color {
        colored::control::set_override(false);
    }

    if !args.output.quiet && !args.output.json_stdout {
        display_banner();
    }

    let scanner = Scanner::new(args.clone())?;
    info!(
        "Scanning {} on port(s) {:?}",
        scanner.config().hostname,
        scanner.config().ports
    );
    let results = scanner.run()?;

    if args.output.json_stdout {
        println!("{}", generate_json(&results, args.output.json_pretty)?);
    } else {
        display_results(&results);
    }

    if let Some(json_file) = &args.output.json {
        write_json_file(&results, json_file, args.output.json_pretty)
            .with_context(|| format!("Failed to write {}", json_file.display()))?;
        if !args.output.json_stdout {
            println!("✓ Results exported to JSON: {}", json_file.display());
        }
    }

    if results.iter().all(|r| r.error.is_some()) {
        anyhow::bail!("no port could be scanned");
    }

    Ok(())
}

fn display_banner() {
    println!(
        "{} v{} - crafted-handshake TLS/SSL prober\n",
        "tlsprobe".cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
}
