pub mod cli;
pub mod core;
pub mod providers;

use crate::core::PriceOracle;
use crate::core::config::AppConfig;
use crate::core::convert::Direction;
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub enum AppCommand {
    Price,
    Convert { amount: String, direction: Direction },
    Watch,
}

/// Wires the configured sources into an oracle.
pub fn build_oracle(config: &AppConfig) -> Result<PriceOracle> {
    let sources = providers::build_sources(config)?;
    if sources.is_empty() {
        warn!("No price sources configured, only the default price is available");
    }
    Ok(PriceOracle::new(
        sources,
        config.default_price,
        config.history_capacity,
    ))
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("adaconv starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let oracle = Arc::new(build_oracle(&config)?);

    match command {
        AppCommand::Price => cli::price::run(&oracle, &config.pair).await,
        AppCommand::Convert { amount, direction } => {
            cli::convert::run(&oracle, &config.pair, &amount, direction).await
        }
        AppCommand::Watch => cli::watch::run(oracle, &config).await,
    }
}
