//! Per-asset price alert thresholds.

use crate::db::{Database, DbError, SettingValue};
use moonitor_core::{parse_target_price, validate_target_price, PriceAlert, ThresholdError};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Settings key prefix of alert thresholds.
const ALERT_KEY_PREFIX: &str = "alert_";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Invalid threshold: {0}")]
    InvalidThreshold(#[from] ThresholdError),
    #[error(transparent)]
    Db(#[from] DbError),
}

fn alert_key(asset_id: &str) -> String {
    format!("{}{}", ALERT_KEY_PREFIX, asset_id)
}

/// Durable map from asset id to target price.
///
/// At most one threshold exists per asset. Writes are serialized so a
/// compare-and-clear never interleaves with a concurrent set.
pub struct AlertStore {
    db: Database,
    write_lock: Mutex<()>,
}

impl AlertStore {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            write_lock: Mutex::new(()),
        }
    }

    /// Set or overwrite the threshold for an asset. Persisted before returning.
    pub async fn set_alert(&self, asset_id: &str, target_price: f64) -> Result<(), StoreError> {
        let target_price = validate_target_price(target_price)?;

        let _guard = self.write_lock.lock().await;
        self.db
            .set(&alert_key(asset_id), &SettingValue::Number(target_price))
            .await?;

        info!(asset = asset_id, target = target_price, "Price alert set");
        Ok(())
    }

    /// Parse user input and set the threshold. Returns the stored value.
    pub async fn set_alert_from_input(&self, asset_id: &str, input: &str) -> Result<f64, StoreError> {
        let target_price = parse_target_price(input)?;
        self.set_alert(asset_id, target_price).await?;
        Ok(target_price)
    }

    /// Stored threshold, or `0.0` when none is set.
    pub async fn get_alert(&self, asset_id: &str) -> f64 {
        match self.db.get(&alert_key(asset_id)).await {
            Ok(value) => value.and_then(|v| v.as_number()).unwrap_or(0.0),
            Err(e) => {
                warn!(asset = asset_id, error = %e, "Failed to read price alert");
                0.0
            }
        }
    }

    pub async fn has_alert(&self, asset_id: &str) -> bool {
        self.get_alert(asset_id).await > 0.0
    }

    /// Remove the threshold. No-op when absent.
    pub async fn clear_alert(&self, asset_id: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        if self.db.remove(&alert_key(asset_id)).await? {
            info!(asset = asset_id, "Price alert cleared");
        }
        Ok(())
    }

    /// Remove the threshold only if it still equals `expected`.
    /// Returns whether it was removed.
    pub async fn clear_alert_if(&self, asset_id: &str, expected: f64) -> Result<bool, StoreError> {
        let _guard = self.write_lock.lock().await;
        let removed = self
            .db
            .remove_if_equals(&alert_key(asset_id), &SettingValue::Number(expected))
            .await?;

        if removed {
            info!(asset = asset_id, target = expected, "Price alert cleared after trigger");
        } else {
            debug!(asset = asset_id, "Price alert changed during check, keeping it");
        }
        Ok(removed)
    }

    /// Every active alert, ordered by asset id.
    pub async fn list_alerts(&self) -> Result<Vec<PriceAlert>, StoreError> {
        let keys = self.db.keys_with_prefix(ALERT_KEY_PREFIX).await?;

        let mut alerts = Vec::with_capacity(keys.len());
        for key in keys {
            let Some(target_price) = self.db.get(&key).await?.and_then(|v| v.as_number()) else {
                continue;
            };
            let asset_id = &key[ALERT_KEY_PREFIX.len()..];
            match PriceAlert::new(asset_id, target_price) {
                Ok(alert) => alerts.push(alert),
                Err(e) => warn!(asset = asset_id, error = %e, "Skipping invalid stored alert"),
            }
        }
        Ok(alerts)
    }
}
