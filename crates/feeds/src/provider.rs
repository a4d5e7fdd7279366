//! Market data provider interface.

use crate::FeedResult;
use async_trait::async_trait;
use moonitor_core::{ChartSeries, CoinQuote, ExchangeDirectory, TickerSet, TimeRange};

/// Source of live market data.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Fetch the current quote for one asset.
    async fn fetch_quote(&self, asset_id: &str) -> FeedResult<CoinQuote>;

    /// Fetch the current USD price for one asset.
    async fn fetch_current_price(&self, asset_id: &str) -> FeedResult<f64> {
        Ok(self.fetch_quote(asset_id).await?.current_price)
    }

    /// Fetch chart samples for an asset over a time range.
    async fn fetch_chart_series(&self, asset_id: &str, range: TimeRange) -> FeedResult<ChartSeries>;

    /// Fetch exchange tickers for an asset, unfiltered.
    async fn fetch_tickers(&self, asset_id: &str) -> FeedResult<TickerSet>;

    /// Fetch the exchange metadata directory.
    async fn fetch_exchange_directory(&self) -> FeedResult<ExchangeDirectory>;
}
