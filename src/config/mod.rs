use anyhow::{Context, Result};
use clap::Parser;
use dotenvy::dotenv;
use serde::Deserialize;

/// Configuration for the service
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Redis connection URL
    #[serde(default = "default_redis_url")]
    pub redis_url: String,
    /// Address the HTTP server listens on
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// Scan size hint used when listing clients
    #[serde(default = "default_page_size")]
    pub page_size: u64,
    /// Tracing filter used when RUST_LOG is not set
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    /// Keep records in process memory instead of Redis
    #[serde(default)]
    pub memory: bool,
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_page_size() -> u64 {
    50
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            redis_url: default_redis_url(),
            bind_addr: default_bind_addr(),
            page_size: default_page_size(),
            log_filter: default_log_filter(),
            memory: false,
        }
    }
}

/// Command line overrides. Anything given here wins over the environment.
#[derive(Debug, Default, Parser)]
#[command(name = "booking_service", version, about = "Client records over a key-value store")]
pub struct Cli {
    /// Listen address, e.g. 127.0.0.1:3000
    #[arg(long)]
    pub bind: Option<String>,
    /// Redis connection URL
    #[arg(long)]
    pub redis_url: Option<String>,
    /// Page size used by GET /clients
    #[arg(long)]
    pub page_size: Option<u64>,
    /// Serve from an in-process store (nothing survives a restart)
    #[arg(long)]
    pub memory: bool,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// This function will:
    /// 1. Load variables from .env file if it exists
    /// 2. Deserialize environment variables into Config struct
    pub fn load() -> Result<Self> {
        dotenv().ok();

        let config = envy::from_env::<Config>().context("invalid environment configuration")?;

        Ok(config)
    }

    /// Apply command line overrides on top of the loaded values
    pub fn with_cli(mut self, cli: Cli) -> Result<Self> {
        if let Some(bind) = cli.bind {
            self.bind_addr = bind;
        }
        if let Some(url) = cli.redis_url {
            self.redis_url = url;
        }
        if let Some(size) = cli.page_size {
            self.page_size = size;
        }
        if cli.memory {
            self.memory = true;
        }

        anyhow::ensure!(self.page_size > 0, "page size must be greater than zero");

        Ok(self)
    }

    pub fn redis_url(&self) -> &str {
        &self.redis_url
    }
}

/// Load the environment and apply command line overrides
pub fn init(cli: Cli) -> Result<Config> {
    Config::load()?.with_cli(cli)
}
