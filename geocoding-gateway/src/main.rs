//! Binary crate for the reverse-geocoding gateway.
//!
//! This crate focuses on:
//! - Parsing CLI arguments and loading configuration
//! - Serving the HTTP API
//! - One-shot lookups from the command line

use clap::Parser;

mod api;
mod cli;
mod logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cmd = cli::Cli::parse();
    cmd.run().await
}
