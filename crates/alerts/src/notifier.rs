//! Alert notification delivery.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tracing::info;

/// Identifier of the pending notification for an asset.
pub fn alert_identifier(asset_id: &str) -> String {
    format!("alert_{}", asset_id)
}

/// Title shown when an alert fires, e.g. "Bitcoin reached 65000$".
pub fn format_alert_title(display_name: &str, target_price: f64) -> String {
    format!("{} reached {}$", display_name, target_price)
}

/// Delivers "price reached" notifications.
///
/// Delivery is fire-and-forget: implementations log their own failures.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Ask the user for permission to post notifications.
    async fn request_permission(&self) -> bool;

    /// Schedule one notification for an asset whose target was reached.
    /// Replaces any pending notification for the same asset.
    async fn schedule_alert(&self, asset_id: &str, display_name: &str, target_price: f64);

    /// Withdraw a pending notification, if any.
    async fn cancel_alert(&self, asset_id: &str);

    /// Wait until every pending delivery has been handed off.
    async fn flush(&self) {}
}

/// Notifier that only writes to the log.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn request_permission(&self) -> bool {
        true
    }

    async fn schedule_alert(&self, asset_id: &str, display_name: &str, target_price: f64) {
        info!(
            id = %alert_identifier(asset_id),
            target = target_price,
            "{}",
            format_alert_title(display_name, target_price)
        );
    }

    async fn cancel_alert(&self, asset_id: &str) {
        info!(id = %alert_identifier(asset_id), "Alert notification withdrawn");
    }
}

/// A notification handed to a `RecordingNotifier`.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertRequest {
    pub asset_id: String,
    pub display_name: String,
    pub target_price: f64,
}

/// Notifier that records every request, for tests and dry runs.
#[derive(Debug)]
pub struct RecordingNotifier {
    granted: AtomicBool,
    scheduled: Mutex<Vec<AlertRequest>>,
    cancelled: Mutex<Vec<String>>,
}

impl Default for RecordingNotifier {
    fn default() -> Self {
        Self {
            granted: AtomicBool::new(true),
            scheduled: Mutex::new(Vec::new()),
            cancelled: Mutex::new(Vec::new()),
        }
    }
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer future permission requests with `granted`.
    pub fn set_permission(&self, granted: bool) {
        self.granted.store(granted, Ordering::SeqCst);
    }

    pub fn scheduled(&self) -> Vec<AlertRequest> {
        self.scheduled.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn cancelled(&self) -> Vec<String> {
        self.cancelled.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn request_permission(&self) -> bool {
        self.granted.load(Ordering::SeqCst)
    }

    async fn schedule_alert(&self, asset_id: &str, display_name: &str, target_price: f64) {
        if let Ok(mut scheduled) = self.scheduled.lock() {
            scheduled.push(AlertRequest {
                asset_id: asset_id.to_string(),
                display_name: display_name.to_string(),
                target_price,
            });
        }
    }

    async fn cancel_alert(&self, asset_id: &str) {
        if let Ok(mut cancelled) = self.cancelled.lock() {
            cancelled.push(asset_id.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_alert_identifier() {
        assert_eq!(alert_identifier("bitcoin"), "alert_bitcoin");
    }

    #[test]
    fn test_format_alert_title() {
        assert_eq!(format_alert_title("Bitcoin", 65000.0), "Bitcoin reached 65000$");
        assert_eq!(format_alert_title("Dogecoin", 0.25), "Dogecoin reached 0.25$");
    }

    #[tokio::test]
    async fn test_recording_notifier() {
        let notifier = RecordingNotifier::new();
        assert!(notifier.request_permission().await);

        notifier.schedule_alert("bitcoin", "Bitcoin", 100.0).await;
        notifier.cancel_alert("ethereum").await;

        assert_eq!(
            notifier.scheduled(),
            vec![AlertRequest {
                asset_id: "bitcoin".to_string(),
                display_name: "Bitcoin".to_string(),
                target_price: 100.0,
            }]
        );
        assert_eq!(notifier.cancelled(), vec!["ethereum".to_string()]);

        notifier.set_permission(false);
        assert!(!notifier.request_permission().await);
    }

    #[tokio::test]
    async fn test_log_notifier() {
        let notifier = LogNotifier;
        assert!(notifier.request_permission().await);
        notifier.schedule_alert("bitcoin", "Bitcoin", 100.0).await;
        notifier.cancel_alert("bitcoin").await;
    }
}
