//! Cache-or-fetch access to market data.

use crate::market_cache::MarketDataCache;
use crate::tickers::{filter_tickers, rank_tickers};
use futures_util::future::join_all;
use moonitor_core::{ChartSeries, ExchangeDirectory, TickerSet, TimeRange};
use moonitor_feeds::MarketDataProvider;
use std::sync::Arc;
use tracing::{debug, warn};

/// Serves detail-screen data from the cache, fetching from the provider on a miss.
///
/// Fetch failures are logged and reported as `None`, leaving the screen
/// section empty.
#[derive(Clone)]
pub struct MarketDataService {
    cache: Arc<MarketDataCache>,
    provider: Arc<dyn MarketDataProvider>,
}

impl MarketDataService {
    pub fn new(cache: Arc<MarketDataCache>, provider: Arc<dyn MarketDataProvider>) -> Self {
        Self { cache, provider }
    }

    pub fn cache(&self) -> &Arc<MarketDataCache> {
        &self.cache
    }

    /// Chart series for (asset, range).
    pub async fn chart(&self, asset_id: &str, range: TimeRange) -> Option<Arc<ChartSeries>> {
        if let Some(series) = self.cache.get_chart(asset_id, range) {
            debug!(asset = asset_id, range = %range, "Using cached chart");
            return Some(series);
        }

        match self.provider.fetch_chart_series(asset_id, range).await {
            Ok(series) => {
                debug!(asset = asset_id, range = %range, points = series.len(), "Fetched chart");
                Some(self.cache.put_chart(asset_id, range, series))
            }
            Err(e) => {
                warn!(asset = asset_id, range = %range, error = %e, "Failed to fetch chart");
                None
            }
        }
    }

    /// Exchange directory, fetched once per process.
    pub async fn exchanges(&self) -> Option<Arc<ExchangeDirectory>> {
        if let Some(directory) = self.cache.get_exchanges() {
            return Some(directory);
        }

        match self.provider.fetch_exchange_directory().await {
            Ok(directory) => {
                debug!(exchanges = directory.len(), "Fetched exchange directory");
                Some(self.cache.put_exchanges(directory))
            }
            Err(e) => {
                warn!(error = %e, "Failed to fetch exchange directory");
                None
            }
        }
    }

    /// Ranked tickers for an asset.
    ///
    /// With a known exchange directory the tickers are filtered to displayable
    /// exchanges and cached. Without one they are ranked but neither filtered
    /// nor cached, so a later call can filter them properly.
    pub async fn tickers(&self, asset_id: &str) -> Option<Arc<TickerSet>> {
        if let Some(tickers) = self.cache.get_tickers(asset_id) {
            debug!(asset = asset_id, "Using cached tickers");
            return Some(tickers);
        }

        let (directory, fetched) =
            tokio::join!(self.exchanges(), self.provider.fetch_tickers(asset_id));

        let tickers = match fetched {
            Ok(tickers) => tickers,
            Err(e) => {
                warn!(asset = asset_id, error = %e, "Failed to fetch tickers");
                return None;
            }
        };

        match directory {
            Some(directory) => {
                let filtered = filter_tickers(tickers, &directory);
                Some(self.cache.put_tickers(asset_id, filtered))
            }
            None => {
                debug!(asset = asset_id, "Exchange directory unavailable, tickers not cached");
                Some(Arc::new(rank_tickers(tickers)))
            }
        }
    }

    /// Fetch every time range for an asset concurrently.
    /// Returns how many ranges are available afterwards.
    pub async fn prefetch_charts(&self, asset_id: &str) -> usize {
        let futures = TimeRange::ALL.into_iter().map(|range| self.chart(asset_id, range));
        join_all(futures).await.into_iter().flatten().count()
    }
}
