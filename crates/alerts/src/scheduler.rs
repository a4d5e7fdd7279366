//! Runs price alert checks one at a time.

use crate::cancel::Cancellation;
use crate::notifier::Notifier;
use crate::store::AlertStore;
use crate::task::{PriceAlertTask, TaskOutcome};
use moonitor_feeds::MarketDataProvider;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

/// Summary of one batch of checks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Checks that completed, whatever their result.
    pub checked: usize,
    pub triggered: usize,
    pub cancelled: usize,
    /// Checks whose price fetch failed.
    pub failed: usize,
}

impl CycleReport {
    /// A cycle succeeds when nothing in it was cancelled.
    pub fn success(&self) -> bool {
        self.cancelled == 0
    }

    fn record(&mut self, outcome: TaskOutcome) {
        match outcome {
            TaskOutcome::Cancelled => self.cancelled += 1,
            TaskOutcome::Triggered { .. } => {
                self.checked += 1;
                self.triggered += 1;
            }
            TaskOutcome::FetchFailed => {
                self.checked += 1;
                self.failed += 1;
            }
            TaskOutcome::NoAlert | TaskOutcome::BelowTarget { .. } => self.checked += 1,
        }
    }
}

/// Single-lane queue of `PriceAlertTask`s.
///
/// Cycles and single-asset checks never overlap; a caller arriving while
/// another check runs waits for it to finish.
pub struct AlertScheduler {
    store: Arc<AlertStore>,
    provider: Arc<dyn MarketDataProvider>,
    notifier: Arc<dyn Notifier>,
    queue_lock: tokio::sync::Mutex<()>,
    current: Mutex<Cancellation>,
}

impl AlertScheduler {
    pub fn new(
        store: Arc<AlertStore>,
        provider: Arc<dyn MarketDataProvider>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            store,
            provider,
            notifier,
            queue_lock: tokio::sync::Mutex::new(()),
            current: Mutex::new(Cancellation::new()),
        }
    }

    pub fn store(&self) -> &Arc<AlertStore> {
        &self.store
    }

    /// Install a fresh cancellation for the batch about to run.
    fn begin_batch(&self) -> Cancellation {
        let cancellation = Cancellation::new();
        if let Ok(mut current) = self.current.lock() {
            *current = cancellation.clone();
        }
        cancellation
    }

    fn task(&self, asset_id: &str, cancellation: &Cancellation) -> PriceAlertTask {
        PriceAlertTask::new(
            asset_id,
            Arc::clone(&self.store),
            Arc::clone(&self.provider),
            Arc::clone(&self.notifier),
        )
        .with_cancellation(cancellation.clone())
    }

    /// Check every active alert once.
    ///
    /// With a `budget`, the batch is cancelled when it runs out; the check in
    /// flight is abandoned and the remaining ones end as cancelled.
    pub async fn run_cycle(&self, budget: Option<Duration>) -> CycleReport {
        let _queue = self.queue_lock.lock().await;
        let cancellation = self.begin_batch();

        let deadline = budget.map(|budget| {
            let cancellation = cancellation.clone();
            tokio::spawn(async move {
                tokio::time::sleep(budget).await;
                debug!(budget_ms = budget.as_millis() as u64, "Alert cycle budget expired");
                cancellation.cancel();
            })
        });

        let mut report = CycleReport::default();
        match self.store.list_alerts().await {
            Ok(alerts) => {
                for alert in alerts {
                    let outcome = self.task(&alert.asset_id, &cancellation).run().await;
                    report.record(outcome);
                }
            }
            Err(e) => error!(error = %e, "Failed to list price alerts"),
        }

        if let Some(deadline) = deadline {
            deadline.abort();
        }

        info!(
            checked = report.checked,
            triggered = report.triggered,
            cancelled = report.cancelled,
            failed = report.failed,
            "Alert cycle finished"
        );
        report
    }

    /// Check a single asset, e.g. from the detail screen timer.
    pub async fn check_asset(&self, asset_id: &str, display_name: Option<&str>) -> TaskOutcome {
        let _queue = self.queue_lock.lock().await;
        let cancellation = self.begin_batch();

        let mut task = self.task(asset_id, &cancellation);
        if let Some(name) = display_name {
            task = task.with_display_name(name);
        }
        task.run().await
    }

    /// Cancel the batch in flight. Checks queued behind it are unaffected.
    pub fn cancel_all(&self) {
        if let Ok(current) = self.current.lock() {
            current.cancel();
        }
    }

    /// Run a cycle every `interval` until `shutdown` is cancelled.
    ///
    /// A cycle in progress at shutdown is cancelled and drained before returning.
    pub async fn run_periodic(&self, interval: Duration, budget: Option<Duration>, shutdown: Cancellation) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(interval_secs = interval.as_secs(), "Alert scheduler started");

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let cycle = self.run_cycle(budget);
            tokio::pin!(cycle);
            tokio::select! {
                _ = &mut cycle => {}
                _ = shutdown.cancelled() => {
                    self.cancel_all();
                    cycle.await;
                    break;
                }
            }
        }

        info!("Alert scheduler stopped");
    }
}
