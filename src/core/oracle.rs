//! The price oracle: source fallback, rolling history and the refresh worker.

use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::core::history::PriceHistory;
use crate::core::quote::{PriceQuote, QuoteSource};
use crate::core::source::{PriceSource, SourceError};

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OracleStatus {
    NoPriceYet,
    HasPrice,
}

#[derive(Debug)]
struct OracleState {
    history: PriceHistory,
}

/// Owns the current trusted price.
///
/// Sources are tried in the order given to [`PriceOracle::new`]. Only
/// [`PriceOracle::refresh`] mutates state, and network I/O never happens
/// while the state lock is held, so readers only ever wait for a push.
pub struct PriceOracle {
    sources: Vec<Box<dyn PriceSource>>,
    default_price: Decimal,
    state: Mutex<OracleState>,
}

impl PriceOracle {
    pub fn new(
        sources: Vec<Box<dyn PriceSource>>,
        default_price: Decimal,
        history_capacity: usize,
    ) -> Self {
        Self {
            sources,
            default_price,
            state: Mutex::new(OracleState {
                history: PriceHistory::new(history_capacity),
            }),
        }
    }

    // A panic elsewhere can't leave the history half-written, so a poisoned
    // lock is still safe to use.
    fn state(&self) -> MutexGuard<'_, OracleState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fetches a fresh price, falling back through the sources in order.
    ///
    /// Never fails. When every source fails the last accepted quote is
    /// returned untouched, or a [`QuoteSource::Default`] quote carrying the
    /// default price if nothing was ever accepted.
    pub async fn refresh(&self) -> PriceQuote {
        for source in &self.sources {
            let kind = source.kind();
            debug!(source = %kind, "Fetching price");

            match source.fetch().await.and_then(accept) {
                Ok(quote) => {
                    info!(source = %kind, price = %quote.value(), "Accepted price");
                    self.commit(&quote);
                    return quote;
                }
                Err(e) => {
                    warn!(source = %kind, kind = %e.kind(), error = %e, "Price source failed");
                }
            }
        }

        let fallback = self.latest();
        warn!(
            price = %self.current_price(),
            "All price sources failed, keeping last known price"
        );
        fallback
            .unwrap_or_else(|| PriceQuote::new(self.default_price, QuoteSource::Default, Utc::now()))
    }

    fn commit(&self, quote: &PriceQuote) {
        self.state().history.push(quote.clone());
    }

    pub fn current_price(&self) -> Decimal {
        self.state()
            .history
            .latest()
            .map_or(self.default_price, PriceQuote::value)
    }

    pub fn latest(&self) -> Option<PriceQuote> {
        self.state().history.latest().cloned()
    }

    /// Snapshot of the rolling history, oldest first.
    pub fn history(&self) -> Vec<PriceQuote> {
        self.state().history.to_vec()
    }

    pub fn status(&self) -> OracleStatus {
        if self.state().history.is_empty() {
            OracleStatus::NoPriceYet
        } else {
            OracleStatus::HasPrice
        }
    }

    pub fn default_price(&self) -> Decimal {
        self.default_price
    }
}

// Sources validate their own text, but a zero or negative quote must never
// become the current price whichever way it was built.
fn accept(quote: PriceQuote) -> Result<PriceQuote, SourceError> {
    if quote.value() <= Decimal::ZERO {
        return Err(SourceError::Invalid(format!(
            "non-positive price {}",
            quote.value()
        )));
    }
    Ok(quote)
}

/// Refreshes `oracle` now and then every `period` for the life of the runtime.
pub fn spawn_refresher(oracle: Arc<PriceOracle>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let quote = oracle.refresh().await;
            debug!(price = %quote.value(), source = %quote.source(), "Refresh finished");
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Replays scripted prices, `None` being a timeout. Once the script runs
    /// out it keeps returning the last entry.
    struct FakeSource {
        kind: QuoteSource,
        script: Mutex<VecDeque<Option<Decimal>>>,
        call_count: AtomicUsize,
    }

    impl FakeSource {
        fn new(kind: QuoteSource, script: Vec<Option<Decimal>>) -> Self {
            Self {
                kind,
                script: Mutex::new(script.into()),
                call_count: AtomicUsize::new(0),
            }
        }

        fn ok(kind: QuoteSource, price: Decimal) -> Self {
            Self::new(kind, vec![Some(price)])
        }

        fn failing(kind: QuoteSource) -> Self {
            Self::new(kind, vec![None])
        }
    }

    #[async_trait]
    impl PriceSource for Arc<FakeSource> {
        fn kind(&self) -> QuoteSource {
            self.kind
        }

        async fn fetch(&self) -> Result<PriceQuote, SourceError> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            let mut script = self.script.lock().unwrap();
            let next = if script.len() > 1 {
                script.pop_front().unwrap()
            } else {
                *script.front().unwrap()
            };
            next.map(|price| PriceQuote::new(price, self.kind, Utc::now()))
                .ok_or(SourceError::Timeout)
        }
    }

    fn oracle_with(sources: &[Arc<FakeSource>]) -> PriceOracle {
        let sources = sources
            .iter()
            .map(|s| Box::new(Arc::clone(s)) as Box<dyn PriceSource>)
            .collect();
        PriceOracle::new(sources, dec!(0.00), 24)
    }

    #[tokio::test]
    async fn test_first_source_wins() {
        let google = Arc::new(FakeSource::ok(QuoteSource::GoogleScrape, dec!(0.84)));
        let api = Arc::new(FakeSource::ok(QuoteSource::PublicApi, dec!(0.85)));
        let oracle = oracle_with(&[google.clone(), api.clone()]);

        let quote = oracle.refresh().await;

        assert_eq!(quote.value(), dec!(0.84));
        assert_eq!(quote.source(), QuoteSource::GoogleScrape);
        assert_eq!(oracle.current_price(), dec!(0.84));
        assert_eq!(oracle.history(), vec![quote]);
        assert_eq!(api.call_count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_falls_back_to_next_source() {
        let google = Arc::new(FakeSource::failing(QuoteSource::GoogleScrape));
        let api = Arc::new(FakeSource::ok(QuoteSource::PublicApi, dec!(0.85)));
        let page = Arc::new(FakeSource::ok(QuoteSource::SecondaryScrape, dec!(0.86)));
        let oracle = oracle_with(&[google.clone(), api.clone(), page.clone()]);

        let quote = oracle.refresh().await;

        assert_eq!(quote.value(), dec!(0.85));
        assert_eq!(quote.source(), QuoteSource::PublicApi);
        assert_eq!(oracle.current_price(), dec!(0.85));
        assert_eq!(oracle.history().len(), 1);
        assert_eq!(google.call_count.load(Ordering::SeqCst), 1);
        assert_eq!(page.call_count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_zero_price_is_not_accepted() {
        let google = Arc::new(FakeSource::ok(QuoteSource::GoogleScrape, dec!(0.00)));
        let api = Arc::new(FakeSource::ok(QuoteSource::PublicApi, dec!(0.85)));
        let oracle = oracle_with(&[google, api]);

        let quote = oracle.refresh().await;

        assert_eq!(quote.value(), dec!(0.85));
        assert_eq!(quote.source(), QuoteSource::PublicApi);
        assert!(oracle.history().iter().all(|q| !q.value().is_zero()));
    }

    #[tokio::test]
    async fn test_all_sources_fail_before_first_price() {
        let oracle = PriceOracle::new(
            vec![
                Box::new(Arc::new(FakeSource::failing(QuoteSource::GoogleScrape)))
                    as Box<dyn PriceSource>,
                Box::new(Arc::new(FakeSource::failing(QuoteSource::PublicApi))),
            ],
            dec!(0.80),
            24,
        );

        let quote = oracle.refresh().await;

        assert_eq!(quote.source(), QuoteSource::Default);
        assert_eq!(quote.value(), dec!(0.80));
        assert_eq!(oracle.current_price(), dec!(0.80));
        assert!(oracle.history().is_empty());
        assert_eq!(oracle.status(), OracleStatus::NoPriceYet);
    }

    #[tokio::test]
    async fn test_all_sources_fail_keeps_last_price() {
        let google = Arc::new(FakeSource::new(
            QuoteSource::GoogleScrape,
            vec![Some(dec!(0.85)), None],
        ));
        let api = Arc::new(FakeSource::failing(QuoteSource::PublicApi));
        let oracle = oracle_with(&[google, api]);

        let first = oracle.refresh().await;
        let before = oracle.history();

        let second = oracle.refresh().await;

        assert_eq!(second, first);
        assert_eq!(oracle.current_price(), dec!(0.85));
        assert_eq!(oracle.history(), before);
        assert_eq!(oracle.status(), OracleStatus::HasPrice);
    }

    #[tokio::test]
    async fn test_history_keeps_last_24() {
        let script = (1..=25).map(|i| Some(Decimal::new(i, 2))).collect();
        let api = Arc::new(FakeSource::new(QuoteSource::PublicApi, script));
        let oracle = oracle_with(&[api]);

        let mut accepted = Vec::new();
        for _ in 0..25 {
            accepted.push(oracle.refresh().await);
        }

        let history = oracle.history();
        assert_eq!(history.len(), 24);
        assert!(!history.contains(&accepted[0]));
        assert_eq!(history, accepted[1..].to_vec());
        assert_eq!(oracle.current_price(), dec!(0.25));
    }

    #[tokio::test]
    async fn test_history_snapshot_is_stable() {
        let api = Arc::new(FakeSource::ok(QuoteSource::PublicApi, dec!(0.85)));
        let oracle = oracle_with(&[api]);
        oracle.refresh().await;
        oracle.refresh().await;

        assert_eq!(oracle.history(), oracle.history());
        assert_eq!(oracle.history().len(), 2);
    }

    #[tokio::test]
    async fn test_status_transitions_once() {
        let api = Arc::new(FakeSource::new(
            QuoteSource::PublicApi,
            vec![None, Some(dec!(0.85)), None],
        ));
        let oracle = oracle_with(&[api]);
        assert_eq!(oracle.status(), OracleStatus::NoPriceYet);

        oracle.refresh().await;
        assert_eq!(oracle.status(), OracleStatus::NoPriceYet);

        oracle.refresh().await;
        assert_eq!(oracle.status(), OracleStatus::HasPrice);

        oracle.refresh().await;
        assert_eq!(oracle.status(), OracleStatus::HasPrice);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresher_runs_on_interval() {
        let api = Arc::new(FakeSource::ok(QuoteSource::PublicApi, dec!(0.85)));
        let oracle = Arc::new(oracle_with(&[api.clone()]));

        let handle = spawn_refresher(Arc::clone(&oracle), DEFAULT_REFRESH_INTERVAL);
        tokio::time::sleep(Duration::from_secs(61)).await;

        assert_eq!(api.call_count.load(Ordering::SeqCst), 3);
        assert_eq!(oracle.history().len(), 3);
        handle.abort();
    }
}
