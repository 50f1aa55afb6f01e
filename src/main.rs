mod auth;
mod cli;
mod config;
mod error;
mod output;
mod parser;
mod providers;
mod reporter;
mod table;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use log::info;
use std::path::PathBuf;

/// Overrides the default `build.env` location.
const ENV_FILE_VAR: &str = "DEPLOY_REPORT_ENV_FILE";

#[tokio::main]
async fn main() -> Result<()> {
    // Loaded before parsing so the file can feed clap's env fallbacks.
    let env_file = std::env::var_os(ENV_FILE_VAR)
        .map_or_else(|| PathBuf::from(config::DEFAULT_ENV_FILE), PathBuf::from);
    let env_loaded = config::load_env_file(&env_file)?;

    env_logger::init();

    output::print_banner();

    let cli = Cli::parse();
    info!("Starting deploy-report");
    if env_loaded {
        info!("Configuration loaded from {}", env_file.display());
    }
    cli.execute().await?;

    Ok(())
}
