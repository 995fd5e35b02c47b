use anyhow::{Context, Result};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::{debug, instrument};

use super::http::{BROWSER_USER_AGENT, build_client, get_text};
use crate::core::config::PairConfig;
use crate::core::{PriceQuote, PriceSource, QuoteSource, SourceError};

static SPAN: Lazy<Selector> = Lazy::new(|| Selector::parse("span").expect("invalid selector"));

/// Last resort: scrapes the coin's CoinGecko page for a `C$0.85`-style span.
pub struct CoinGeckoPageProvider {
    base_url: String,
    client: reqwest::Client,
    asset_id: String,
    symbol: String,
    symbol_price: Regex,
}

impl CoinGeckoPageProvider {
    pub fn new(base_url: &str, pair: &PairConfig, timeout: Duration) -> Result<Self> {
        let symbol_price = Regex::new(&format!(
            r"{}(\d+\.\d+)",
            regex::escape(&pair.secondary_symbol)
        ))
        .with_context(|| format!("Invalid secondary symbol: {}", pair.secondary_symbol))?;

        Ok(CoinGeckoPageProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: build_client(BROWSER_USER_AGENT, timeout)?,
            asset_id: pair.asset_id.to_lowercase(),
            symbol: pair.secondary_symbol.clone(),
            symbol_price,
        })
    }

    fn url(&self) -> String {
        format!("{}/en/coins/{}", self.base_url, self.asset_id)
    }

    fn extract(&self, html: &str) -> Option<String> {
        let document = Html::parse_document(html);
        document
            .select(&SPAN)
            .map(|span| span.text().collect::<String>())
            .filter(|text| text.contains(&self.symbol))
            .find_map(|text| {
                self.symbol_price
                    .captures(&text)
                    .and_then(|caps| caps.get(1))
                    .map(|m| m.as_str().to_string())
            })
    }
}

#[async_trait]
impl PriceSource for CoinGeckoPageProvider {
    fn kind(&self) -> QuoteSource {
        QuoteSource::SecondaryScrape
    }

    #[instrument(name = "CoinGeckoPageFetch", skip(self))]
    async fn fetch(&self) -> Result<PriceQuote, SourceError> {
        let body = get_text(&self.client, &self.url()).await?;

        let text = self.extract(&body).ok_or(SourceError::NoMatch)?;
        debug!(price = %text, "Matched price");

        PriceQuote::from_text(&text, QuoteSource::SecondaryScrape)
    }
}
