use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;
use std::time::Duration;
use tracing::{error, instrument};

use super::http::{API_USER_AGENT, build_client, get_text};
use crate::core::config::PairConfig;
use crate::core::{PriceQuote, PriceSource, QuoteSource, SourceError};

/// Reads the price from CoinGecko's `simple/price` endpoint.
pub struct CoinGeckoApiProvider {
    base_url: String,
    client: reqwest::Client,
    asset_id: String,
    currency: String,
}

impl CoinGeckoApiProvider {
    pub fn new(base_url: &str, pair: &PairConfig, timeout: Duration) -> Result<Self> {
        Ok(CoinGeckoApiProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: build_client(API_USER_AGENT, timeout)?,
            asset_id: pair.asset_id.to_lowercase(),
            currency: pair.fiat.to_lowercase(),
        })
    }

    fn url(&self) -> String {
        format!(
            "{}/api/v3/simple/price?ids={}&vs_currencies={}",
            self.base_url, self.asset_id, self.currency
        )
    }

    /// Pulls `body[asset][currency]` out as text. The API answers with a JSON
    /// number, but string prices are accepted too.
    fn extract(&self, body: &str) -> Result<String, SourceError> {
        let data: Value = serde_json::from_str(body).map_err(|e| {
            error!(error = ?e, response = %body, "Failed to parse price response");
            SourceError::BadResponse(format!("Failed to parse JSON response: {e}"))
        })?;

        let field = data
            .get(&self.asset_id)
            .and_then(|prices| prices.get(&self.currency))
            .ok_or_else(|| {
                SourceError::BadResponse(format!(
                    "No {} price for {} in response",
                    self.currency, self.asset_id
                ))
            })?;

        match field {
            Value::String(text) => Ok(text.clone()),
            Value::Number(number) => {
                let text = number.to_string();
                // Small prices come back in exponent form, e.g. 8.5e-5
                match Decimal::from_str(&text) {
                    Ok(_) => Ok(text),
                    Err(_) => Decimal::from_scientific(&text)
                        .map(|d| d.to_string())
                        .map_err(|e| SourceError::Invalid(format!("'{text}': {e}"))),
                }
            }
            other => Err(SourceError::BadResponse(format!(
                "Unexpected price value: {other}"
            ))),
        }
    }
}

#[async_trait]
impl PriceSource for CoinGeckoApiProvider {
    fn kind(&self) -> QuoteSource {
        QuoteSource::PublicApi
    }

    #[instrument(name = "CoinGeckoApiFetch", skip(self))]
    async fn fetch(&self) -> Result<PriceQuote, SourceError> {
        let body = get_text(&self.client, &self.url())
            .await
            .map_err(|e| match e {
                SourceError::HttpStatus(status) => {
                    SourceError::BadResponse(format!("HTTP error: {status}"))
                }
                other => other,
            })?;

        let text = self.extract(&body)?;
        PriceQuote::from_text(&text, QuoteSource::PublicApi)
    }
}
