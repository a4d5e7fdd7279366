//! CoinGecko REST API client.
//!
//! Fetches quotes, chart samples, tickers and exchange metadata from the
//! public CoinGecko v3 API.

use crate::error::{FeedError, FeedResult};
use crate::provider::MarketDataProvider;
use async_trait::async_trait;
use moonitor_core::{
    ChartSeries, CoinQuote, ExchangeDirectory, ExchangeInfo, Ticker, TickerSet, TimeRange,
};
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Configuration for the CoinGecko client.
#[derive(Debug, Clone)]
pub struct CoinGeckoConfig {
    /// API root, without trailing slash.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Tickers kept from the head of the provider's list.
    pub ticker_limit: usize,
    /// Exchanges requested for the directory.
    pub exchanges_per_page: u32,
}

impl Default for CoinGeckoConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.coingecko.com/api/v3".to_string(),
            timeout: Duration::from_secs(10),
            ticker_limit: 30,
            exchanges_per_page: 30,
        }
    }
}

/// Market data provider backed by the CoinGecko REST API.
pub struct CoinGeckoClient {
    client: reqwest::Client,
    config: CoinGeckoConfig,
}

impl CoinGeckoClient {
    const VS_CURRENCY: &'static str = "usd";

    /// Create a new client.
    pub fn new(config: CoinGeckoConfig) -> FeedResult<Self> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &CoinGeckoConfig {
        &self.config
    }

    fn endpoint(&self, path: &str, params: &[(&str, &str)]) -> FeedResult<Url> {
        let base = self.config.base_url.trim_end_matches('/');
        Ok(Url::parse_with_params(&format!("{}/{}", base, path), params)?)
    }

    async fn get_text(&self, url: Url) -> FeedResult<String> {
        debug!(url = %url, "CoinGecko request");

        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(FeedError::RateLimitExceeded);
        }
        if !status.is_success() {
            return Err(FeedError::Network(format!("HTTP {} from {}", status, url.path())));
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl MarketDataProvider for CoinGeckoClient {
    async fn fetch_quote(&self, asset_id: &str) -> FeedResult<CoinQuote> {
        let url = self.endpoint(
            "coins/markets",
            &[("vs_currency", Self::VS_CURRENCY), ("ids", asset_id)],
        )?;
        let body = self.get_text(url).await?;
        decode_quote(&body, asset_id)
    }

    async fn fetch_chart_series(&self, asset_id: &str, range: TimeRange) -> FeedResult<ChartSeries> {
        let days = range.days().to_string();
        let url = self.endpoint(
            &format!("coins/{}/market_chart", asset_id),
            &[("vs_currency", Self::VS_CURRENCY), ("days", days.as_str())],
        )?;
        let body = self.get_text(url).await?;
        let series = decode_chart(&body)?;
        debug!(asset = asset_id, range = %range, points = series.len(), "Decoded chart");
        Ok(series)
    }

    async fn fetch_tickers(&self, asset_id: &str) -> FeedResult<TickerSet> {
        let url = self.endpoint(&format!("coins/{}/tickers", asset_id), &[])?;
        let body = self.get_text(url).await?;
        decode_tickers(&body, self.config.ticker_limit)
    }

    async fn fetch_exchange_directory(&self) -> FeedResult<ExchangeDirectory> {
        let per_page = self.config.exchanges_per_page.to_string();
        let url = self.endpoint("exchanges", &[("per_page", per_page.as_str()), ("page", "1")])?;
        let body = self.get_text(url).await?;
        decode_exchanges(&body)
    }
}

// === Response decoding ===

#[derive(Debug, Deserialize)]
struct MarketEntry {
    id: String,
    name: String,
    symbol: String,
    current_price: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct MarketChartResponse {
    prices: Vec<(f64, f64)>,
}

#[derive(Debug, Deserialize)]
struct TickerResponse {
    tickers: Vec<TickerEntry>,
}

#[derive(Debug, Deserialize)]
struct TickerEntry {
    market: MarketRef,
    base: String,
    target: String,
    last: f64,
    volume: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct MarketRef {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ExchangeEntry {
    id: String,
    name: String,
    image: Option<String>,
    url: Option<String>,
}

/// `/coins/markets` returns an array; a by-ID lookup yields at most one entry.
fn decode_quote(body: &str, asset_id: &str) -> FeedResult<CoinQuote> {
    let entries: Vec<MarketEntry> = serde_json::from_str(body)?;
    let entry = entries
        .into_iter()
        .next()
        .ok_or_else(|| FeedError::EmptyResult(asset_id.to_string()))?;
    let price = entry
        .current_price
        .ok_or_else(|| FeedError::Decoding(format!("missing current_price for {}", entry.id)))?;

    Ok(CoinQuote::new(&entry.id, &entry.name, &entry.symbol, price))
}

fn decode_chart(body: &str) -> FeedResult<ChartSeries> {
    let response: MarketChartResponse = serde_json::from_str(body)?;
    Ok(ChartSeries::from_millis_pairs(response.prices))
}

fn decode_tickers(body: &str, limit: usize) -> FeedResult<TickerSet> {
    let response: TickerResponse = serde_json::from_str(body)?;
    Ok(response
        .tickers
        .into_iter()
        .take(limit)
        .map(|t| Ticker::new(&t.market.name, &t.base, &t.target, t.last, t.volume))
        .collect())
}

fn decode_exchanges(body: &str) -> FeedResult<ExchangeDirectory> {
    let entries: Vec<ExchangeEntry> = serde_json::from_str(body)?;
    Ok(entries
        .into_iter()
        .map(|e| {
            ExchangeInfo::new(
                &e.id,
                &e.name,
                e.image.as_deref().unwrap_or_default(),
                e.url.as_deref().unwrap_or_default(),
            )
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use moonitor_core::ChartPoint;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_endpoint_building() {
        let client = CoinGeckoClient::new(CoinGeckoConfig {
            base_url: "https://example.test/api/v3/".to_string(),
            ..Default::default()
        })
        .unwrap();

        let url = client
            .endpoint("coins/markets", &[("vs_currency", "usd"), ("ids", "bitcoin")])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.test/api/v3/coins/markets?vs_currency=usd&ids=bitcoin"
        );
    }

    #[test]
    fn test_decode_quote() {
        let body = r#"[{"id":"bitcoin","name":"Bitcoin","symbol":"btc","current_price":64250.5,"market_cap_rank":1}]"#;
        let quote = decode_quote(body, "bitcoin").unwrap();
        assert_eq!(quote, CoinQuote::new("bitcoin", "Bitcoin", "btc", 64250.5));
    }

    #[test]
    fn test_decode_quote_empty_result() {
        let err = decode_quote("[]", "nope").unwrap_err();
        assert!(matches!(err, FeedError::EmptyResult(id) if id == "nope"));
    }

    #[test]
    fn test_decode_quote_missing_price() {
        let body = r#"[{"id":"x","name":"X","symbol":"x","current_price":null}]"#;
        assert!(matches!(decode_quote(body, "x"), Err(FeedError::Decoding(_))));
    }

    #[test]
    fn test_decode_quote_malformed() {
        assert!(matches!(decode_quote("{", "x"), Err(FeedError::Decoding(_))));
    }

    #[test]
    fn test_decode_chart_converts_millis() {
        let body = r#"{"prices":[[1700000000000,100.0],[1700000300000,101.5]],"market_caps":[],"total_volumes":[]}"#;
        let series = decode_chart(body).unwrap();
        assert_eq!(
            series.points(),
            &[
                ChartPoint::new(1_700_000_000.0, 100.0),
                ChartPoint::new(1_700_000_300.0, 101.5)
            ]
        );
    }

    #[test]
    fn test_decode_tickers_limit() {
        let body = r#"{"name":"Bitcoin","tickers":[
            {"market":{"name":"Binance","identifier":"binance"},"base":"BTC","target":"USDT","last":64000.0,"volume":1500.0},
            {"market":{"name":"Kraken","identifier":"kraken"},"base":"BTC","target":"USD","last":64010.0},
            {"market":{"name":"Bybit","identifier":"bybit"},"base":"BTC","target":"USDT","last":63990.0,"volume":900.0}
        ]}"#;
        let tickers = decode_tickers(body, 2).unwrap();
        assert_eq!(tickers.len(), 2);
        assert_eq!(tickers[0], Ticker::new("Binance", "BTC", "USDT", 64000.0, Some(1500.0)));
        assert_eq!(tickers[1].volume, None);
    }

    #[test]
    fn test_decode_exchanges() {
        let body = r#"[
            {"id":"binance","name":"Binance","image":"https://img/b.png","url":"https://www.binance.com/"},
            {"id":"odd","name":"Odd","image":null,"url":"https://odd.example"}
        ]"#;
        let dir = decode_exchanges(body).unwrap();
        assert_eq!(dir.len(), 2);
        assert_eq!(dir.logo("Binance"), Some("https://img/b.png"));
        assert!(!dir.is_displayable("Odd"));
    }
}
