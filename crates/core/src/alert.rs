//! Price alert records and target price validation.

use crate::AssetId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rejected user-entered target price.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ThresholdError {
    #[error("Target price is not a number: {0:?}")]
    NotANumber(String),

    #[error("Target price must be greater than zero, got {0}")]
    NotPositive(f64),
}

/// An active price target for one asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceAlert {
    pub asset_id: AssetId,
    /// Price at or above which the alert fires
    pub target_price: f64,
}

impl PriceAlert {
    pub fn new(asset_id: &str, target_price: f64) -> Result<Self, ThresholdError> {
        Ok(Self {
            asset_id: AssetId::new(asset_id),
            target_price: validate_target_price(target_price)?,
        })
    }
}

/// Check that a target price is a finite number above zero.
pub fn validate_target_price(value: f64) -> Result<f64, ThresholdError> {
    if !value.is_finite() {
        return Err(ThresholdError::NotANumber(value.to_string()));
    }
    if value <= 0.0 {
        return Err(ThresholdError::NotPositive(value));
    }
    Ok(value)
}

/// Parse a target price typed by the user.
///
/// Surrounding whitespace is ignored and `,` is accepted as the decimal separator.
pub fn parse_target_price(input: &str) -> Result<f64, ThresholdError> {
    let normalized = input.trim().replace(',', ".");
    let value = normalized
        .parse::<f64>()
        .map_err(|_| ThresholdError::NotANumber(input.to_string()))?;
    validate_target_price(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_target_price_plain() {
        assert_eq!(parse_target_price("2000"), Ok(2000.0));
        assert_eq!(parse_target_price("0.5"), Ok(0.5));
    }

    #[test]
    fn test_parse_target_price_comma_and_whitespace() {
        assert_eq!(parse_target_price(" 1,5 \n"), Ok(1.5));
    }

    #[test]
    fn test_parse_target_price_rejects_garbage() {
        assert!(matches!(
            parse_target_price("abc"),
            Err(ThresholdError::NotANumber(_))
        ));
        assert!(matches!(
            parse_target_price(""),
            Err(ThresholdError::NotANumber(_))
        ));
        assert!(matches!(
            parse_target_price("NaN"),
            Err(ThresholdError::NotANumber(_))
        ));
    }

    #[test]
    fn test_parse_target_price_rejects_non_positive() {
        assert_eq!(parse_target_price("0"), Err(ThresholdError::NotPositive(0.0)));
        assert_eq!(parse_target_price("-3"), Err(ThresholdError::NotPositive(-3.0)));
    }

    #[test]
    fn test_price_alert_json() {
        let alert = PriceAlert::new("bitcoin", 100.00007544360213).unwrap();
        let json = serde_json::to_string(&alert).unwrap();
        assert_eq!(json, r#"{"asset_id":"bitcoin","target_price":100.00007544360213}"#);

        let decoded: PriceAlert = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, alert);
        assert_eq!(decoded.target_price.to_bits(), alert.target_price.to_bits());
    }

    #[test]
    fn test_price_alert_invalid() {
        assert!(PriceAlert::new("bitcoin", 0.0).is_err());
        assert!(PriceAlert::new("bitcoin", f64::INFINITY).is_err());
    }
}
