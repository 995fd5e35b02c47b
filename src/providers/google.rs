use anyhow::{Context, Result};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use std::fmt::Display;
use std::time::Duration;
use tracing::{debug, instrument};

use super::http::{BROWSER_USER_AGENT, build_client, get_text};
use crate::core::config::PairConfig;
use crate::core::{PriceQuote, PriceSource, QuoteSource, SourceError};

static PRICE_BLOCK: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.BNeawe.iBp4i.AP7Wnd").expect("invalid selector"));
static CONVERTER_RESULT: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".DFlfde.SwHCTb").expect("invalid selector"));
static DIV: Lazy<Selector> = Lazy::new(|| Selector::parse("div").expect("invalid selector"));
static DECIMAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+\.\d+").expect("invalid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Strategy {
    NestedBlock,
    ConverterResult,
    TextScan,
}

impl Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Strategy::NestedBlock => "nested block",
                Strategy::ConverterResult => "converter result",
                Strategy::TextScan => "text scan",
            }
        )
    }
}

/// Scrapes the price from a search results page.
///
/// The markup is undocumented and changes without notice; the strategies
/// below are tried in a fixed order and the first hit wins.
pub struct GoogleScrapeProvider {
    base_url: String,
    client: reqwest::Client,
    pair: PairConfig,
    symbol_price: Regex,
}

impl GoogleScrapeProvider {
    pub fn new(base_url: &str, pair: &PairConfig, timeout: Duration) -> Result<Self> {
        let symbol_price = Regex::new(&format!(r"{}(\d+\.\d+)", regex::escape(&pair.fiat_symbol)))
            .with_context(|| format!("Invalid fiat symbol: {}", pair.fiat_symbol))?;

        Ok(GoogleScrapeProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: build_client(BROWSER_USER_AGENT, timeout)?,
            pair: pair.clone(),
            symbol_price,
        })
    }

    fn url(&self) -> String {
        format!(
            "{}/search?q={}+to+{}",
            self.base_url, self.pair.asset_symbol, self.pair.fiat
        )
    }

    fn extract(&self, html: &str) -> Option<(Strategy, String)> {
        let document = Html::parse_document(html);

        if let Some(outer) = document.select(&PRICE_BLOCK).next()
            && let Some(inner) = outer.select(&PRICE_BLOCK).next()
        {
            let text: String = inner.text().collect();
            if let Some(m) = DECIMAL.find(&text) {
                return Some((Strategy::NestedBlock, m.as_str().to_string()));
            }
        }

        if let Some(element) = document.select(&CONVERTER_RESULT).next() {
            return Some((Strategy::ConverterResult, element.text().collect()));
        }

        document.select(&DIV).find_map(|div| {
            let text: String = div.text().collect();
            if !text.contains(&self.pair.fiat) || !text.contains(&self.pair.fiat_symbol) {
                return None;
            }
            self.symbol_price
                .captures(&text)
                .and_then(|caps| caps.get(1))
                .map(|m| (Strategy::TextScan, m.as_str().to_string()))
        })
    }
}

#[async_trait]
impl PriceSource for GoogleScrapeProvider {
    fn kind(&self) -> QuoteSource {
        QuoteSource::GoogleScrape
    }

    #[instrument(name = "GoogleScrapeFetch", skip(self))]
    async fn fetch(&self) -> Result<PriceQuote, SourceError> {
        let body = get_text(&self.client, &self.url()).await?;

        let (strategy, text) = self.extract(&body).ok_or(SourceError::NoMatch)?;
        debug!(%strategy, price = %text, "Matched price");

        PriceQuote::from_text(&text, QuoteSource::GoogleScrape)
    }
}
