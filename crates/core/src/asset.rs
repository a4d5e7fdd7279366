//! Asset identifiers and live quotes.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Stable provider identifier of a coin (e.g., "bitcoin", "ethereum").
pub type AssetId = CompactString;

/// Current market quote for a single asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinQuote {
    /// Provider identifier (e.g., "bitcoin")
    pub id: AssetId,
    /// Display name (e.g., "Bitcoin")
    pub name: String,
    /// Ticker symbol (e.g., "btc")
    pub symbol: CompactString,
    /// Current price in USD
    pub current_price: f64,
}

impl CoinQuote {
    /// Create a new quote.
    pub fn new(id: &str, name: &str, symbol: &str, current_price: f64) -> Self {
        Self {
            id: AssetId::new(id),
            name: name.to_string(),
            symbol: CompactString::new(symbol),
            current_price,
        }
    }

    /// Whether this quote has reached the given target price.
    #[inline]
    pub fn reaches(&self, target_price: f64) -> bool {
        self.current_price >= target_price
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_new() {
        let quote = CoinQuote::new("bitcoin", "Bitcoin", "btc", 65000.0);
        assert_eq!(quote.id.as_str(), "bitcoin");
        assert_eq!(quote.name, "Bitcoin");
        assert_eq!(quote.symbol.as_str(), "btc");
    }

    #[test]
    fn test_quote_reaches_target() {
        let quote = CoinQuote::new("bitcoin", "Bitcoin", "btc", 100.0);
        assert!(quote.reaches(100.0));
        assert!(quote.reaches(99.99));
        assert!(!quote.reaches(100.01));
    }
}
