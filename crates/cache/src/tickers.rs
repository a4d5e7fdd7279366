//! Ticker ranking for the markets section of a detail screen.

use moonitor_core::{ExchangeDirectory, Ticker, TickerSet};
use std::collections::HashSet;

/// Maximum tickers shown for one asset.
pub const MAX_DISPLAYED_TICKERS: usize = 10;

/// Keep tickers whose exchange has a known logo and website, then rank them.
pub fn filter_tickers(tickers: TickerSet, directory: &ExchangeDirectory) -> TickerSet {
    rank_tickers(
        tickers
            .into_iter()
            .filter(|t| directory.is_displayable(&t.exchange_name))
            .collect(),
    )
}

/// Sort by descending volume, keep the first ticker of each exchange and
/// truncate to `MAX_DISPLAYED_TICKERS`.
///
/// The sort is stable, so tickers with equal volume keep provider order.
pub fn rank_tickers(mut tickers: TickerSet) -> TickerSet {
    tickers.sort_by(|a, b| b.ranking_volume().total_cmp(&a.ranking_volume()));

    let mut seen = HashSet::new();
    tickers
        .into_iter()
        .filter(|t: &Ticker| seen.insert(t.exchange_name.clone()))
        .take(MAX_DISPLAYED_TICKERS)
        .collect()
}
