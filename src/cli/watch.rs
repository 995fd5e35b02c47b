//! Live view: a background worker keeps the oracle fresh while the
//! foreground redraws and answers conversions from the cached price.

use super::convert::{convert_amount, display_conversion};
use super::price::{display_history, display_quote};
use super::ui;
use crate::core::config::{AppConfig, PairConfig};
use crate::core::convert::{ConversionCounter, Direction};
use crate::core::{OracleStatus, PriceOracle, spawn_refresher};
use anyhow::Result;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Convert { direction: Direction, amount: String },
    Price,
    History,
    Help,
    Quit,
    Unknown(String),
}

/// Parses one input line. `10 cad` converts CAD to the asset, `10 ada`
/// the other way; a bare unit converts zero.
pub fn parse_command(line: &str, pair: &PairConfig) -> Command {
    let mut words: Vec<&str> = line.split_whitespace().collect();
    let Some(last) = words.pop() else {
        return Command::Help;
    };
    let unit = last.to_lowercase();

    if words.is_empty() {
        match unit.as_str() {
            "price" => return Command::Price,
            "history" => return Command::History,
            "help" | "?" => return Command::Help,
            "quit" | "exit" | "q" => return Command::Quit,
            _ => {}
        }
    }

    let direction = if unit == pair.fiat.to_lowercase() {
        Direction::FiatToAsset
    } else if unit == pair.asset_symbol.to_lowercase() {
        Direction::AssetToFiat
    } else {
        return Command::Unknown(line.trim().to_string());
    };

    Command::Convert {
        direction,
        amount: words.join(" "),
    }
}

fn help_text(pair: &PairConfig) -> String {
    ui::style_text(
        &format!(
            "Enter '<amount> {fiat}' or '<amount> {asset}' to convert, 'price', 'history' or 'quit'.",
            fiat = pair.fiat.to_lowercase(),
            asset = pair.asset_symbol.to_lowercase()
        ),
        ui::StyleType::Subtle,
    )
}

fn render_price(oracle: &PriceOracle, pair: &PairConfig) -> String {
    match (oracle.status(), oracle.latest()) {
        (OracleStatus::HasPrice, Some(quote)) => display_quote(&quote, pair),
        _ => ui::style_text(
            &format!(
                "Waiting for the first price, using {}{} {}",
                pair.fiat_symbol,
                oracle.default_price(),
                pair.fiat
            ),
            ui::StyleType::Subtle,
        ),
    }
}

/// One redraw: the price card, plus the history table once there is a
/// trend to show.
fn render_view(oracle: &PriceOracle, pair: &PairConfig) -> String {
    let mut view = render_price(oracle, pair);
    let history = oracle.history();
    if history.len() >= 2 {
        view.push('\n');
        view.push_str(&display_history(&history, pair));
    }
    view
}

/// Handles one command against the cached price. Returns `false` to stop.
fn handle_command(
    command: Command,
    oracle: &PriceOracle,
    pair: &PairConfig,
    counter: &ConversionCounter,
) -> bool {
    match command {
        Command::Convert { direction, amount } => {
            match convert_amount(&amount, direction, oracle.current_price(), pair) {
                Ok(conversion) => {
                    let count = counter.increment();
                    println!("{}", display_conversion(&conversion, count));
                }
                Err(e) => println!("{}", ui::style_text(&e.to_string(), ui::StyleType::Error)),
            }
        }
        Command::Price => println!("{}", render_price(oracle, pair)),
        Command::History => println!("{}", display_history(&oracle.history(), pair)),
        Command::Help => println!("{}", help_text(pair)),
        Command::Unknown(input) => println!(
            "{}\n{}",
            ui::style_text(&format!("Unknown command: {input}"), ui::StyleType::Error),
            help_text(pair)
        ),
        Command::Quit => return false,
    }
    true
}

pub async fn run(oracle: Arc<PriceOracle>, config: &AppConfig) -> Result<()> {
    let pair = &config.pair;
    let interval = config.refresh_interval();
    let _refresher = spawn_refresher(Arc::clone(&oracle), interval);

    let counter = ConversionCounter::new();
    let mut redraw = tokio::time::interval(interval);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    println!(
        "{}\n{}",
        ui::style_text(
            &format!("{}/{} live rate", pair.asset_symbol, pair.fiat),
            ui::StyleType::Title
        ),
        help_text(pair)
    );

    loop {
        tokio::select! {
            _ = redraw.tick() => {
                ui::print_separator();
                println!("{}", render_view(&oracle, pair));
            }
            line = lines.next_line(), if stdin_open => {
                match line? {
                    Some(line) => {
                        let command = parse_command(&line, pair);
                        debug!(?command, "Received command");
                        if !handle_command(command, &oracle, pair, &counter) {
                            break;
                        }
                    }
                    None => {
                        debug!("stdin closed, continuing without input");
                        stdin_open = false;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    debug!(conversions = counter.get(), "Leaving watch mode");
    Ok(())
}
