//! Price quotes and normalization of scraped price text

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

use crate::core::source::SourceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuoteSource {
    GoogleScrape,
    PublicApi,
    SecondaryScrape,
    /// Caller supplied price used before any source succeeded.
    Default,
}

impl Display for QuoteSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                QuoteSource::GoogleScrape => "Google",
                QuoteSource::PublicApi => "CoinGecko API",
                QuoteSource::SecondaryScrape => "CoinGecko",
                QuoteSource::Default => "Default",
            }
        )
    }
}

/// One observed price. Fields are private so a quote can't change after it
/// was accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuote {
    value: Decimal,
    source: QuoteSource,
    observed_at: DateTime<Utc>,
}

impl PriceQuote {
    pub fn new(value: Decimal, source: QuoteSource, observed_at: DateTime<Utc>) -> Self {
        Self {
            value,
            source,
            observed_at,
        }
    }

    /// Normalizes `text` and stamps it with the current time.
    pub fn from_text(text: &str, source: QuoteSource) -> Result<Self, SourceError> {
        let value = parse_price(text)?;
        Ok(Self::new(value, source, Utc::now()))
    }

    pub fn value(&self) -> Decimal {
        self.value
    }

    pub fn source(&self) -> QuoteSource {
        self.source
    }

    pub fn observed_at(&self) -> DateTime<Utc> {
        self.observed_at
    }
}

/// Turns raw price text into a positive decimal.
///
/// Whitespace and thousands separators are stripped. Empty, non-numeric,
/// zero and negative values are rejected; a placeholder `0.00` on a page is
/// as useless as no match at all.
pub fn parse_price(text: &str) -> Result<Decimal, SourceError> {
    let cleaned: String = text.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return Err(SourceError::Invalid("empty price".to_string()));
    }

    let value = Decimal::from_str(&cleaned)
        .map_err(|e| SourceError::Invalid(format!("'{cleaned}' is not a decimal: {e}")))?;

    if value <= Decimal::ZERO {
        return Err(SourceError::Invalid(format!("non-positive price {value}")));
    }
    Ok(value)
}
