//! Exchange ticker records.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// One exchange's quote for an asset's trading pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticker {
    /// Exchange (market) name, e.g. "Binance"
    pub exchange_name: String,
    /// Base currency of the pair, e.g. "BTC"
    pub base: CompactString,
    /// Quote currency of the pair, e.g. "USDT"
    pub target: CompactString,
    /// Last traded price
    pub last_price: f64,
    /// Traded volume, when the exchange reports it
    pub volume: Option<f64>,
}

impl Ticker {
    pub fn new(
        exchange_name: &str,
        base: &str,
        target: &str,
        last_price: f64,
        volume: Option<f64>,
    ) -> Self {
        Self {
            exchange_name: exchange_name.to_string(),
            base: CompactString::new(base),
            target: CompactString::new(target),
            last_price,
            volume,
        }
    }

    /// Pair label, e.g. "BTC/USDT".
    pub fn pair(&self) -> String {
        format!("{}/{}", self.base, self.target)
    }

    /// Volume used for ranking; missing volume ranks as zero.
    #[inline]
    pub fn ranking_volume(&self) -> f64 {
        self.volume.unwrap_or(0.0)
    }
}

/// Ordered tickers for one asset.
pub type TickerSet = Vec<Ticker>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticker_pair() {
        let ticker = Ticker::new("Binance", "BTC", "USDT", 65000.0, Some(1200.0));
        assert_eq!(ticker.pair(), "BTC/USDT");
        assert_eq!(ticker.ranking_volume(), 1200.0);
    }

    #[test]
    fn test_ticker_missing_volume_ranks_zero() {
        let ticker = Ticker::new("Kraken", "BTC", "EUR", 60000.0, None);
        assert_eq!(ticker.ranking_volume(), 0.0);
    }
}
