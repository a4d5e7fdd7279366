//! Scriptable in-process market data provider.

use crate::error::{FeedError, FeedResult};
use crate::provider::MarketDataProvider;
use async_trait::async_trait;
use dashmap::DashMap;
use moonitor_core::{ChartSeries, CoinQuote, ExchangeDirectory, TickerSet, TimeRange};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

/// Mock provider for testing and offline runs.
///
/// Unknown assets yield `FeedError::EmptyResult`.
#[derive(Default)]
pub struct MockMarketData {
    quotes: DashMap<String, CoinQuote>,
    charts: DashMap<(String, TimeRange), ChartSeries>,
    tickers: DashMap<String, TickerSet>,
    exchanges: std::sync::RwLock<Option<ExchangeDirectory>>,
    /// Simulated response time for every call.
    latency: Duration,
    /// Whether every call should fail with a network error.
    should_fail: AtomicBool,
    quote_calls: AtomicU64,
    chart_calls: AtomicU64,
    ticker_calls: AtomicU64,
    exchange_calls: AtomicU64,
    in_flight: AtomicU64,
    max_in_flight: AtomicU64,
}

/// Decrements the in-flight gauge even when the caller drops the request.
struct InFlight<'a>(&'a AtomicU64);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MockMarketData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a quote.
    pub fn with_quote(self, quote: CoinQuote) -> Self {
        self.quotes.insert(quote.id.to_string(), quote);
        self
    }

    /// Add a chart for (asset, range).
    pub fn with_chart(self, asset_id: &str, range: TimeRange, series: ChartSeries) -> Self {
        self.charts.insert((asset_id.to_string(), range), series);
        self
    }

    /// Add tickers for an asset.
    pub fn with_tickers(self, asset_id: &str, tickers: TickerSet) -> Self {
        self.tickers.insert(asset_id.to_string(), tickers);
        self
    }

    /// Set the exchange directory.
    pub fn with_exchanges(self, directory: ExchangeDirectory) -> Self {
        if let Ok(mut lock) = self.exchanges.write() {
            *lock = Some(directory);
        }
        self
    }

    /// Delay every response by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Update the current price of a known asset.
    pub fn set_price(&self, asset_id: &str, price: f64) {
        if let Some(mut quote) = self.quotes.get_mut(asset_id) {
            quote.current_price = price;
        }
    }

    /// Make every subsequent call fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.should_fail.store(failing, Ordering::SeqCst);
    }

    pub fn quote_calls(&self) -> u64 {
        self.quote_calls.load(Ordering::SeqCst)
    }

    pub fn chart_calls(&self) -> u64 {
        self.chart_calls.load(Ordering::SeqCst)
    }

    pub fn ticker_calls(&self) -> u64 {
        self.ticker_calls.load(Ordering::SeqCst)
    }

    pub fn exchange_calls(&self) -> u64 {
        self.exchange_calls.load(Ordering::SeqCst)
    }

    /// Highest number of requests observed in flight at once.
    pub fn max_in_flight(&self) -> u64 {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn respond(&self, counter: &AtomicU64) -> FeedResult<()> {
        counter.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        let _in_flight = InFlight(&self.in_flight);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(FeedError::Network("Mock failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl MarketDataProvider for MockMarketData {
    async fn fetch_quote(&self, asset_id: &str) -> FeedResult<CoinQuote> {
        self.respond(&self.quote_calls).await?;
        self.quotes
            .get(asset_id)
            .map(|q| q.clone())
            .ok_or_else(|| FeedError::EmptyResult(asset_id.to_string()))
    }

    async fn fetch_chart_series(&self, asset_id: &str, range: TimeRange) -> FeedResult<ChartSeries> {
        self.respond(&self.chart_calls).await?;
        self.charts
            .get(&(asset_id.to_string(), range))
            .map(|s| s.clone())
            .ok_or_else(|| FeedError::EmptyResult(format!("{} {}", asset_id, range)))
    }

    async fn fetch_tickers(&self, asset_id: &str) -> FeedResult<TickerSet> {
        self.respond(&self.ticker_calls).await?;
        self.tickers
            .get(asset_id)
            .map(|t| t.clone())
            .ok_or_else(|| FeedError::EmptyResult(asset_id.to_string()))
    }

    async fn fetch_exchange_directory(&self) -> FeedResult<ExchangeDirectory> {
        self.respond(&self.exchange_calls).await?;
        self.exchanges
            .read()
            .ok()
            .and_then(|d| d.clone())
            .ok_or_else(|| FeedError::EmptyResult("exchanges".to_string()))
    }
}
