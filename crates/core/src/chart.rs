//! Chart price series.

use serde::{Deserialize, Serialize};

/// A single chart sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    /// Unix timestamp in seconds
    pub timestamp_secs: f64,
    /// Price in USD
    pub price: f64,
}

impl ChartPoint {
    pub fn new(timestamp_secs: f64, price: f64) -> Self {
        Self {
            timestamp_secs,
            price,
        }
    }
}

/// Ordered price samples for one (asset, range) pair.
///
/// Points keep the order the provider returned them in; they are never re-sorted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    points: Vec<ChartPoint>,
}

impl ChartSeries {
    pub fn new(points: Vec<ChartPoint>) -> Self {
        Self { points }
    }

    /// Build from provider `[timestamp_ms, price]` pairs.
    pub fn from_millis_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let points = pairs
            .into_iter()
            .map(|(ms, price)| ChartPoint::new(ms / 1000.0, price))
            .collect();
        Self { points }
    }

    pub fn points(&self) -> &[ChartPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Most recent price in the series.
    pub fn last_price(&self) -> Option<f64> {
        self.points.last().map(|p| p.price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_series_from_millis() {
        let series = ChartSeries::from_millis_pairs([(1_700_000_000_000.0, 10.0), (1_700_000_060_000.0, 11.0)]);
        assert_eq!(
            series.points(),
            &[
                ChartPoint::new(1_700_000_000.0, 10.0),
                ChartPoint::new(1_700_000_060.0, 11.0)
            ]
        );
        assert_eq!(series.last_price(), Some(11.0));
    }

    #[test]
    fn test_series_ordering_is_preserved() {
        let series = ChartSeries::new(vec![ChartPoint::new(2.0, 1.0), ChartPoint::new(1.0, 2.0)]);
        assert_eq!(series.points()[0].timestamp_secs, 2.0);
        assert_eq!(series.points()[1].timestamp_secs, 1.0);
        assert_eq!(series.last_price(), Some(2.0));
    }

    #[test]
    fn test_series_empty() {
        let series = ChartSeries::default();
        assert!(series.is_empty());
        assert_eq!(series.last_price(), None);
    }

    #[test]
    fn test_series_json() {
        let series = ChartSeries::new(vec![ChartPoint::new(1_700_000_000.0, 0.1), ChartPoint::new(1_699_999_940.0, 0.2)]);
        let json = serde_json::to_string(&series).unwrap();
        assert_eq!(
            json,
            r#"{"points":[{"timestamp_secs":1700000000.0,"price":0.1},{"timestamp_secs":1699999940.0,"price":0.2}]}"#
        );

        let decoded: ChartSeries = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, series);
    }
}
