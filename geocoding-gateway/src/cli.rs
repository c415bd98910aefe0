use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use geocoding_core::{Config, Envelope, Environment, Gateway, GeocoderInfo};
use tracing::info;

use crate::{
    api,
    logging::{LoggingConfig, init_logging},
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "geocoding-gateway", version, about = "Reverse-geocoding HTTP gateway")]
pub struct Cli {
    /// Path to a TOML config file (host, port, timeout_secs, default_provider).
    #[arg(long, global = true, env = "GEOCODER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Defaults to `serve`.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP gateway.
    Serve {
        #[arg(long)]
        host: Option<String>,

        #[arg(long)]
        port: Option<u16>,
    },

    /// Resolve coordinates to addresses once and exit.
    Reverse {
        #[arg(long, allow_negative_numbers = true)]
        latitude: f64,

        #[arg(long, allow_negative_numbers = true)]
        longitude: f64,

        /// Provider name, e.g. "geoapify" or "nominatim_replica_1".
        #[arg(long)]
        platform: Option<String>,

        /// Print the raw response envelope.
        #[arg(long)]
        json: bool,
    },

    /// Resolve an address to coordinates once and exit.
    Geocode {
        address: String,

        #[arg(long)]
        platform: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// List configured providers.
    Providers,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let env = Environment::capture();
        init_logging(&LoggingConfig::from_env(&env));

        let config = Config::load(self.config.as_deref())
            .and_then(|cfg| cfg.apply_env(&env))
            .context("Failed to load gateway configuration")?;
        let gateway = Gateway::from_environment(&config, &env)?;

        match self.command.unwrap_or(Command::Serve { host: None, port: None }) {
            Command::Serve { host, port } => {
                let host = host.unwrap_or(config.host);
                let port = port.unwrap_or(config.port);
                info!(%host, port, "starting gateway");
                api::serve(Arc::new(gateway), &host, port).await?;
            }
            Command::Reverse { latitude, longitude, platform, json } => {
                let result = gateway.reverse_geocode(latitude, longitude, platform.as_deref()).await;
                if json {
                    print_envelope(Envelope::from(result))?;
                } else {
                    let addresses = result.map_err(|e| anyhow!(e))?;
                    for address in addresses {
                        println!("{}", address.label());
                    }
                }
            }
            Command::Geocode { address, platform, json } => {
                let result = gateway.geocode(&address, platform.as_deref()).await;
                if json {
                    print_envelope(Envelope::from(result))?;
                } else {
                    let found = result.map_err(|e| anyhow!(e))?;
                    for coordinates in found {
                        println!("{}, {}", coordinates.latitude, coordinates.longitude);
                    }
                }
            }
            Command::Providers => {
                print_providers("Reverse geocoders", &gateway.reversers().list());
                print_providers("Forward geocoders", &gateway.geocoders().list());
                println!("Default: {}", gateway.default_provider());
            }
        }

        Ok(())
    }
}

fn print_envelope<T: serde::Serialize>(envelope: Envelope<T>) -> anyhow::Result<()> {
    let rendered = serde_json::to_string_pretty(&envelope).context("Failed to render response")?;
    println!("{rendered}");
    Ok(())
}

fn print_providers(title: &str, providers: &[GeocoderInfo]) {
    println!("{title}:");
    if providers.is_empty() {
        println!("  (none configured)");
    }
    for provider in providers {
        println!("  {:<24} {}", provider.name, provider.url);
    }
}
