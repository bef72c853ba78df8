//! Main application entry point (CLI binary).
//!
//! A thin wrapper around the `domain_origin` library: argument parsing,
//! `.env` loading, logger initialization, and output formatting. All core
//! functionality lives in the library crate.

use anyhow::{Context, Result};
use clap::Parser;
use std::process;

use domain_origin::initialization::{init_crypto_provider, init_logger};
use domain_origin::{Config, LocationInference, LogFormat, LogLevel};

#[derive(Parser, Debug)]
#[command(
    name = "domain_origin",
    about = "Infers the physical location behind a domain by fusing GeoIP, DNS, TLS, header, and page-content signals."
)]
struct Cli {
    /// Domain or URL to locate
    target: String,

    /// Print raw per-source facts (and CDN detection) instead of the fused
    /// estimate
    #[arg(long)]
    raw: bool,

    /// Emit the estimate as JSON
    #[arg(long)]
    json: bool,

    /// Log level
    #[arg(long, value_enum, default_value = "warn")]
    log_level: LogLevel,

    /// Log format
    #[arg(long, value_enum, default_value = "plain")]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Credentials (MAXMIND_LICENSE_KEY etc.) can live in a .env file.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_logger(cli.log_level.clone().into(), cli.log_format.clone())
        .context("Failed to initialize logger")?;
    init_crypto_provider();

    let service = LocationInference::new(Config::from_env())
        .await
        .context("Failed to initialize lookup service")?;

    if cli.raw {
        match service.lookup_url(&cli.target).await {
            Some(facts) => println!("{facts:#?}"),
            None => {
                eprintln!("domain_origin: could not resolve {}", cli.target);
                process::exit(1);
            }
        }
        return Ok(());
    }

    let estimate = service.lookup(&cli.target).await;
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&estimate)?);
    } else {
        match &estimate.location {
            Some(location) => println!("{location} (confidence {})", estimate.confidence),
            None => println!("no location inferred (confidence {})", estimate.confidence),
        }
        for label in &estimate.signals_used {
            println!("  - {label}");
        }
        if let Some(error) = &estimate.error {
            eprintln!("domain_origin error: {error}");
            process::exit(1);
        }
    }

    Ok(())
}
