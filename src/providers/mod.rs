pub mod coingecko_api;
pub mod coingecko_page;
pub mod google;
pub mod http;

use anyhow::Result;
use tracing::debug;

use crate::core::PriceSource;
use crate::core::config::AppConfig;
use coingecko_api::CoinGeckoApiProvider;
use coingecko_page::CoinGeckoPageProvider;
use google::GoogleScrapeProvider;

/// Builds the configured sources in priority order: search page, public
/// API, then the coin page. Sources missing from the config are skipped.
pub fn build_sources(config: &AppConfig) -> Result<Vec<Box<dyn PriceSource>>> {
    let pair = &config.pair;
    let timeout = config.request_timeout();
    let providers = &config.providers;

    let mut sources: Vec<Box<dyn PriceSource>> = Vec::new();
    if let Some(google) = &providers.google {
        sources.push(Box::new(GoogleScrapeProvider::new(
            &google.base_url,
            pair,
            timeout,
        )?));
    }
    if let Some(api) = &providers.coingecko_api {
        sources.push(Box::new(CoinGeckoApiProvider::new(
            &api.base_url,
            pair,
            timeout,
        )?));
    }
    if let Some(web) = &providers.coingecko_web {
        sources.push(Box::new(CoinGeckoPageProvider::new(
            &web.base_url,
            pair,
            timeout,
        )?));
    }

    debug!(
        sources = ?sources.iter().map(|s| s.kind()).collect::<Vec<_>>(),
        "Configured price sources"
    );
    Ok(sources)
}
