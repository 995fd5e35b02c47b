use super::ui;
use crate::core::config::PairConfig;
use crate::core::convert::{Conversion, ConversionError, Direction, parse_amount};
use crate::core::PriceOracle;
use anyhow::Result;
use rust_decimal::Decimal;

/// Converts user-entered `amount` at `price`.
pub fn convert_amount(
    amount: &str,
    direction: Direction,
    price: Decimal,
    pair: &PairConfig,
) -> Result<Conversion, ConversionError> {
    let amount = parse_amount(amount)?;
    Conversion::compute(
        direction,
        amount,
        price,
        &pair.asset_symbol,
        &pair.fiat,
    )
}

pub fn display_conversion(conversion: &Conversion, count: u64) -> String {
    format!(
        "{}\n{}",
        ui::style_text(&conversion.to_string(), ui::StyleType::PriceValue),
        ui::style_text(&format!("Conversions: {count}"), ui::StyleType::Subtle)
    )
}

/// One-shot conversion against a freshly fetched price.
pub async fn run(
    oracle: &PriceOracle,
    pair: &PairConfig,
    amount: &str,
    direction: Direction,
) -> Result<()> {
    let pb = ui::new_spinner("Fetching price...");
    let quote = oracle.refresh().await;
    pb.finish_and_clear();

    let conversion = convert_amount(amount, direction, quote.value(), pair)?;
    println!("{}", display_conversion(&conversion, 1));
    Ok(())
}
