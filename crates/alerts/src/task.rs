//! One cancellable price check for one asset.

use crate::cancel::Cancellation;
use crate::notifier::Notifier;
use crate::store::AlertStore;
use moonitor_core::AssetId;
use moonitor_feeds::MarketDataProvider;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Lifecycle of a `PriceAlertTask`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Created,
    Running,
    Completed,
    Cancelled,
}

/// How a price check ended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TaskOutcome {
    /// Cancelled before any side effect.
    Cancelled,
    /// No threshold set for the asset; nothing was fetched.
    NoAlert,
    /// The price could not be fetched. The alert stays active.
    FetchFailed,
    /// Price below the threshold.
    BelowTarget { price: f64 },
    /// Threshold reached: notification scheduled and threshold cleared.
    Triggered { price: f64 },
}

impl TaskOutcome {
    /// Terminal state for this outcome.
    pub fn state(&self) -> TaskState {
        match self {
            Self::Cancelled => TaskState::Cancelled,
            _ => TaskState::Completed,
        }
    }
}

/// Checks the current price of one asset against its stored threshold.
///
/// Runs at most once: calling `run` on a finished task returns the same outcome
/// without doing any work.
pub struct PriceAlertTask {
    asset_id: AssetId,
    display_name: Option<String>,
    store: Arc<AlertStore>,
    provider: Arc<dyn MarketDataProvider>,
    notifier: Arc<dyn Notifier>,
    cancellation: Cancellation,
    state: TaskState,
    outcome: Option<TaskOutcome>,
}

impl PriceAlertTask {
    pub fn new(
        asset_id: &str,
        store: Arc<AlertStore>,
        provider: Arc<dyn MarketDataProvider>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            asset_id: AssetId::new(asset_id),
            display_name: None,
            store,
            provider,
            notifier,
            cancellation: Cancellation::new(),
            state: TaskState::Created,
            outcome: None,
        }
    }

    /// Name used in the notification. Defaults to the provider's asset name.
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Share a cancellation with other tasks of the same batch.
    pub fn with_cancellation(mut self, cancellation: Cancellation) -> Self {
        self.cancellation = cancellation;
        self
    }

    pub fn asset_id(&self) -> &str {
        &self.asset_id
    }

    pub fn cancellation(&self) -> &Cancellation {
        &self.cancellation
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    /// Run the check.
    pub async fn run(&mut self) -> TaskOutcome {
        if let Some(outcome) = self.outcome {
            return outcome;
        }

        self.state = TaskState::Running;
        let outcome = self.check().await;
        self.state = outcome.state();
        self.outcome = Some(outcome);
        outcome
    }

    async fn check(&self) -> TaskOutcome {
        let asset_id = self.asset_id.as_str();

        if self.cancellation.is_cancelled() {
            debug!(asset = asset_id, "Price check cancelled before start");
            return TaskOutcome::Cancelled;
        }

        let target = self.store.get_alert(asset_id).await;
        if target <= 0.0 {
            return TaskOutcome::NoAlert;
        }

        let fetched = tokio::select! {
            biased;
            _ = self.cancellation.cancelled() => None,
            result = self.provider.fetch_quote(asset_id) => Some(result),
        };

        // A fetch finishing together with cancellation is discarded
        let Some(result) = fetched.filter(|_| !self.cancellation.is_cancelled()) else {
            debug!(asset = asset_id, "Price check cancelled during fetch");
            return TaskOutcome::Cancelled;
        };

        let quote = match result {
            Ok(quote) => quote,
            Err(e) => {
                warn!(asset = asset_id, error = %e, "Failed to fetch price for alert");
                return TaskOutcome::FetchFailed;
            }
        };

        let price = quote.current_price;
        if !quote.reaches(target) {
            debug!(asset = asset_id, price, target, "Price below alert target");
            return TaskOutcome::BelowTarget { price };
        }

        let display_name = self.display_name.as_deref().unwrap_or(&quote.name);
        info!(asset = asset_id, price, target, "Price alert triggered");
        self.notifier
            .schedule_alert(asset_id, display_name, target)
            .await;

        if let Err(e) = self.store.clear_alert_if(asset_id, target).await {
            warn!(asset = asset_id, error = %e, "Failed to clear triggered alert");
        }

        TaskOutcome::Triggered { price }
    }
}
