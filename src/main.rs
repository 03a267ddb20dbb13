//! Caching HTTP proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!                       ┌───────────────────────────────────────────────────┐
//!                       │                  CACHING PROXY                    │
//!   GET /go/<url>       │  ┌────────┐   ┌──────────┐   ┌──────────────┐     │
//!   ────────────────────┼─▶│  http  │──▶│ routing  │──▶│ cache lookup │     │
//!                       │  │ server │   │ resolver │   └──────┬───────┘     │
//!                       │  └────────┘   └──────────┘      hit │ miss        │
//!                       │                                     │   ▼         │
//!                       │                                     │ ┌──────────┐│
//!                       │                                     │ │dispatcher├┼──▶ Origin
//!                       │                                     │ └────┬─────┘│
//!                       │                                     │      ▼      │
//!                       │                                     │ ┌──────────┐│
//!                       │                                     │ │ snapshot ││
//!                       │                                     │ │ + store  ││
//!   Response            │  ┌────────┐                         │ └────┬─────┘│
//!   ◀───────────────────┼──│ replay │◀────────────────────────┴──────┘      │
//!                       │  └────────┘                                       │
//!                       └───────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use caching_proxy::config::{load_config, validation::validate_config, ConfigError, ProxyConfig};
use caching_proxy::lifecycle::startup;
use caching_proxy::observability::logging;

#[derive(Parser)]
#[command(name = "caching-proxy")]
#[command(about = "Caching HTTP proxy: GET /go/<url> fetches <url> once and replays it from cache", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address, overriding the configuration file.
    #[arg(short, long)]
    bind: Option<String>,
}

fn load(cli: &Cli) -> Result<ProxyConfig, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };
    if let Some(bind) = &cli.bind {
        config.listener.bind_address = bind.clone();
        validate_config(&config).map_err(ConfigError::Validation)?;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load(&cli)?;

    logging::init(&config.observability.log_level);

    tracing::info!("caching-proxy v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        ttl_secs = config.cache.ttl_secs,
        sweep_interval_secs = config.cache.sweep_interval_secs,
        dispatch_timeout_secs = config.timeouts.dispatch_secs,
        "Configuration loaded"
    );

    startup::run(config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
