//! Price alerts for the Moonitor tracker.
//!
//! This crate provides:
//! - SQLite-backed key-value settings storage
//! - The alert and favorites stores built on it
//! - Notification delivery (log or Telegram)
//! - The cancellable price check task and its one-at-a-time scheduler

pub mod cancel;
pub mod config;
pub mod db;
pub mod favorites;
pub mod notifier;
pub mod scheduler;
pub mod store;
pub mod task;
pub mod telegram;

pub use cancel::Cancellation;
pub use config::{SchedulerConfig, TelegramConfig};
pub use db::{Database, DbError, SettingValue};
pub use favorites::FavoritesStore;
pub use notifier::{AlertRequest, LogNotifier, Notifier, RecordingNotifier};
pub use scheduler::{AlertScheduler, CycleReport};
pub use store::{AlertStore, StoreError};
pub use task::{PriceAlertTask, TaskOutcome, TaskState};
pub use telegram::TelegramNotifier;
