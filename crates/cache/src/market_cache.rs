//! Keyed cache for chart series, ticker lists and the exchange directory.

use dashmap::DashMap;
use moonitor_core::{AssetId, ChartSeries, ExchangeDirectory, TickerSet, TimeRange};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use tracing::debug;

/// Key for chart storage: (asset, range)
type ChartKey = (AssetId, TimeRange);

/// Cache sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of distinct assets holding chart/ticker entries.
    /// `None` keeps every entry until `clear_all`.
    pub max_assets: Option<usize>,
}

impl CacheConfig {
    /// No bound: entries live for the whole process.
    pub fn unbounded() -> Self {
        Self { max_assets: None }
    }

    /// Keep entries for at most `max_assets` assets, evicting the least recently used.
    pub fn bounded(max_assets: usize) -> Self {
        Self {
            max_assets: Some(max_assets.max(1)),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::bounded(64)
    }
}

/// Per-asset recency used for LRU eviction.
#[derive(Debug, Default)]
struct Recency {
    clock: u64,
    last_used: HashMap<AssetId, u64>,
}

/// Thread-safe market data cache shared by every in-flight fetch.
///
/// Values are handed out as `Arc`s; callers never mutate cached data.
#[derive(Debug, Default)]
pub struct MarketDataCache {
    config: CacheConfig,
    charts: DashMap<ChartKey, Arc<ChartSeries>>,
    tickers: DashMap<AssetId, Arc<TickerSet>>,
    exchanges: RwLock<Option<Arc<ExchangeDirectory>>>,
    recency: Mutex<Recency>,
}

impl MarketDataCache {
    /// Create a new cache.
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn config(&self) -> CacheConfig {
        self.config
    }

    // === Charts ===

    /// Cached chart for (asset, range), if any.
    pub fn get_chart(&self, asset_id: &str, range: TimeRange) -> Option<Arc<ChartSeries>> {
        let key = (AssetId::new(asset_id), range);
        let hit = self.charts.get(&key).map(|r| Arc::clone(r.value()));
        if hit.is_some() {
            self.touch(asset_id);
        }
        hit
    }

    /// Insert or overwrite the chart for (asset, range).
    pub fn put_chart(&self, asset_id: &str, range: TimeRange, series: ChartSeries) -> Arc<ChartSeries> {
        let series = Arc::new(series);
        self.charts
            .insert((AssetId::new(asset_id), range), Arc::clone(&series));
        // Track after inserting so a concurrent eviction cannot orphan the entry
        self.touch(asset_id);
        series
    }

    // === Tickers ===

    /// Cached tickers for an asset, if any.
    pub fn get_tickers(&self, asset_id: &str) -> Option<Arc<TickerSet>> {
        let hit = self.tickers.get(asset_id).map(|r| Arc::clone(r.value()));
        if hit.is_some() {
            self.touch(asset_id);
        }
        hit
    }

    /// Insert or overwrite the tickers for an asset.
    pub fn put_tickers(&self, asset_id: &str, tickers: TickerSet) -> Arc<TickerSet> {
        let tickers = Arc::new(tickers);
        self.tickers
            .insert(AssetId::new(asset_id), Arc::clone(&tickers));
        self.touch(asset_id);
        tickers
    }

    pub fn has_tickers(&self, asset_id: &str) -> bool {
        self.tickers.contains_key(asset_id)
    }

    // === Exchanges ===

    /// Cached exchange directory, if it has been fetched.
    pub fn get_exchanges(&self) -> Option<Arc<ExchangeDirectory>> {
        self.exchanges.read().ok().and_then(|d| d.clone())
    }

    /// Replace the exchange directory.
    pub fn put_exchanges(&self, directory: ExchangeDirectory) -> Arc<ExchangeDirectory> {
        let directory = Arc::new(directory);
        if let Ok(mut lock) = self.exchanges.write() {
            *lock = Some(Arc::clone(&directory));
        }
        directory
    }

    pub fn has_exchanges(&self) -> bool {
        self.exchanges.read().map(|d| d.is_some()).unwrap_or(false)
    }

    /// Logo URL of an exchange from the cached directory.
    pub fn lookup_exchange_logo(&self, name: &str) -> Option<String> {
        self.get_exchanges()?.logo(name).map(str::to_string)
    }

    /// Website URL of an exchange from the cached directory.
    pub fn lookup_exchange_url(&self, name: &str) -> Option<String> {
        self.get_exchanges()?.url(name).map(str::to_string)
    }

    // === Maintenance ===

    /// Drop every entry.
    pub fn clear_all(&self) {
        self.charts.clear();
        self.tickers.clear();
        if let Ok(mut lock) = self.exchanges.write() {
            *lock = None;
        }
        if let Ok(mut recency) = self.recency.lock() {
            *recency = Recency::default();
        }
    }

    /// Number of cached chart series.
    pub fn chart_count(&self) -> usize {
        self.charts.len()
    }

    /// Number of assets with cached tickers.
    pub fn ticker_count(&self) -> usize {
        self.tickers.len()
    }

    /// Check if no chart or ticker entry is cached.
    pub fn is_empty(&self) -> bool {
        self.charts.is_empty() && self.tickers.is_empty()
    }

    /// Record a use of `asset_id` and evict the least recently used asset if
    /// the bound is exceeded. Must not be called while holding a map guard.
    fn touch(&self, asset_id: &str) {
        let Some(max_assets) = self.config.max_assets else {
            return;
        };
        let Ok(mut recency) = self.recency.lock() else {
            return;
        };

        recency.clock += 1;
        let now = recency.clock;
        recency.last_used.insert(AssetId::new(asset_id), now);

        while recency.last_used.len() > max_assets {
            let Some(victim) = recency
                .last_used
                .iter()
                .min_by_key(|(_, used)| **used)
                .map(|(id, _)| id.clone())
            else {
                break;
            };
            recency.last_used.remove(&victim);
            self.charts.retain(|(id, _), _| *id != victim);
            self.tickers.remove(&victim);
            debug!(asset = %victim, "Evicted least recently used asset from cache");
        }
    }
}
