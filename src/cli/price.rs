use super::ui;
use crate::core::config::PairConfig;
use crate::core::{PriceOracle, PriceQuote, QuoteSource};
use anyhow::Result;
use comfy_table::{Cell, CellAlignment};
use rust_decimal::prelude::ToPrimitive;

/// Renders one quote as a short price card.
pub fn display_quote(quote: &PriceQuote, pair: &PairConfig) -> String {
    let price = format!("{}{} {}", pair.fiat_symbol, quote.value(), pair.fiat);
    let mut output = format!(
        "{} {}\n",
        ui::style_text(&format!("1 {} =", pair.asset_symbol), ui::StyleType::PriceLabel),
        ui::style_text(&price, ui::StyleType::PriceValue)
    );

    let updated = match quote.source() {
        QuoteSource::Default => ui::style_text(
            "No live price yet, showing the default",
            ui::StyleType::Error,
        ),
        source => ui::style_text(
            &format!(
                "Last updated: {} via {}",
                ui::format_timestamp(quote.observed_at()),
                source
            ),
            ui::StyleType::Subtle,
        ),
    };
    output.push_str(&updated);
    output
}

/// Renders the rolling history, oldest first, with the change from the
/// previous observation.
pub fn display_history(history: &[PriceQuote], pair: &PairConfig) -> String {
    if history.is_empty() {
        return ui::style_text("No price history yet", ui::StyleType::Subtle);
    }

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("#"),
        ui::header_cell("Time"),
        ui::header_cell(&format!("Price ({})", pair.fiat)),
        ui::header_cell("Change"),
        ui::header_cell("Source"),
    ]);

    let mut previous: Option<&PriceQuote> = None;
    for (i, quote) in history.iter().enumerate() {
        let change = previous.and_then(|p| percent_change(p, quote));
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(ui::format_timestamp(quote.observed_at())),
            Cell::new(quote.value()).set_alignment(CellAlignment::Right),
            ui::change_cell(change),
            ui::source_cell(quote.source()),
        ]);
        previous = Some(quote);
    }

    let mut output = table.to_string();
    if let (Some(low), Some(high)) = (
        history.iter().map(PriceQuote::value).min(),
        history.iter().map(PriceQuote::value).max(),
    ) {
        output.push_str(&format!(
            "\n{}",
            ui::style_text(
                &format!("Low {low} / High {high} {}", pair.fiat),
                ui::StyleType::Subtle
            )
        ));
    }
    output
}

fn percent_change(previous: &PriceQuote, current: &PriceQuote) -> Option<f64> {
    let prev = previous.value().to_f64()?;
    let curr = current.value().to_f64()?;
    if prev == 0.0 {
        return None;
    }
    Some((curr - prev) / prev * 100.0)
}

pub async fn run(oracle: &PriceOracle, pair: &PairConfig) -> Result<()> {
    let pb = ui::new_spinner("Fetching price...");
    let quote = oracle.refresh().await;
    pb.finish_and_clear();

    println!("{}", display_quote(&quote, pair));
    Ok(())
}
