//! Amount conversion between the tracked asset and fiat currency.

use rust_decimal::{Decimal, RoundingStrategy};
use std::fmt::Display;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConversionError {
    #[error("Please enter a valid number: '{0}'")]
    InvalidAmount(String),
    #[error("No price available yet")]
    NoPrice,
    #[error("Amount is too large to convert: '{0}'")]
    AmountTooLarge(Decimal),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    FiatToAsset,
    AssetToFiat,
}

/// Parses user input. Blank input counts as zero.
pub fn parse_amount(input: &str) -> Result<Decimal, ConversionError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(Decimal::ZERO);
    }
    Decimal::from_str(trimmed).map_err(|_| ConversionError::InvalidAmount(trimmed.to_string()))
}

fn round(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

pub fn fiat_to_asset(amount: Decimal, price: Decimal) -> Result<Decimal, ConversionError> {
    if price.is_zero() {
        return Err(ConversionError::NoPrice);
    }
    amount
        .checked_div(price)
        .map(round)
        .ok_or(ConversionError::AmountTooLarge(amount))
}

pub fn asset_to_fiat(amount: Decimal, price: Decimal) -> Result<Decimal, ConversionError> {
    if price.is_zero() {
        return Err(ConversionError::NoPrice);
    }
    amount
        .checked_mul(price)
        .map(round)
        .ok_or(ConversionError::AmountTooLarge(amount))
}

/// A finished conversion, ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversion {
    pub direction: Direction,
    pub amount: Decimal,
    pub result: Decimal,
    pub asset: String,
    pub fiat: String,
}

impl Conversion {
    pub fn compute(
        direction: Direction,
        amount: Decimal,
        price: Decimal,
        asset: &str,
        fiat: &str,
    ) -> Result<Self, ConversionError> {
        let result = match direction {
            Direction::FiatToAsset => fiat_to_asset(amount, price)?,
            Direction::AssetToFiat => asset_to_fiat(amount, price)?,
        };
        Ok(Self {
            direction,
            amount,
            result,
            asset: asset.to_string(),
            fiat: fiat.to_string(),
        })
    }
}

impl Display for Conversion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (from, to) = match self.direction {
            Direction::FiatToAsset => (&self.fiat, &self.asset),
            Direction::AssetToFiat => (&self.asset, &self.fiat),
        };
        write!(
            f,
            "{:.2} {} → {:.2} {}",
            round(self.amount),
            from,
            self.result,
            to
        )
    }
}

#[derive(Debug, Default)]
pub struct ConversionCounter(AtomicU64);

impl ConversionCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one conversion and returns the new total.
    pub fn increment(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}
