//! Binary crate for the `weather-finder` command-line tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Prompting for the API key and for ambiguous matches
//! - Human-friendly output formatting

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cmd = cli::Cli::parse();
    cmd.run().await
}
