use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use booking_service::config::{self, Cli};
use booking_service::{db, http, logging};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Load configuration
    let config = match config::init(cli) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("failed to load configuration: {err:#}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = logging::init(&config.log_filter) {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    match run(&config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("failed to start app: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: &config::Config) -> Result<()> {
    info!("initializing booking service");

    let store = db::init(config).await?;

    http::serve(config, store).await
}
