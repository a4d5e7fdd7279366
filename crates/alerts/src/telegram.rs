//! Telegram delivery of price alerts.

use crate::config::TelegramConfig;
use crate::notifier::{alert_identifier, format_alert_title, Notifier};
use async_trait::async_trait;
use dashmap::DashMap;
use std::time::Duration;
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use teloxide::utils::html;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

#[derive(Error, Debug)]
pub enum TelegramError {
    #[error("Telegram API error: {0}")]
    Api(#[from] teloxide::RequestError),
    #[error("Invalid chat id: {0}")]
    InvalidChatId(String),
}

/// Sends alert messages to one Telegram chat.
///
/// Each alert is delivered after `delivery_delay`; until then
/// `cancel_alert` can withdraw it. Scheduling the same asset again replaces
/// the pending delivery.
pub struct TelegramNotifier {
    bot: Bot,
    chat_id: ChatId,
    delivery_delay: Duration,
    pending: DashMap<String, JoinHandle<()>>,
}

impl TelegramNotifier {
    pub fn new(config: &TelegramConfig) -> Result<Self, TelegramError> {
        let chat_id = config
            .chat_id
            .trim()
            .parse::<i64>()
            .map_err(|_| TelegramError::InvalidChatId(config.chat_id.clone()))?;

        Ok(Self {
            bot: Bot::new(&config.bot_token),
            chat_id: ChatId(chat_id),
            delivery_delay: config.delivery_delay,
            pending: DashMap::new(),
        })
    }

    /// Number of deliveries still waiting for their delay.
    pub fn pending_count(&self) -> usize {
        self.pending.iter().filter(|h| !h.value().is_finished()).count()
    }

    async fn send(bot: &Bot, chat_id: ChatId, message: String) -> Result<(), TelegramError> {
        bot.send_message(chat_id, message)
            .parse_mode(ParseMode::Html)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn request_permission(&self) -> bool {
        match self.bot.get_me().await {
            Ok(me) => {
                debug!(bot = %me.username(), "Telegram bot authorized");
                true
            }
            Err(e) => {
                error!(error = %e, "Telegram bot authorization failed");
                false
            }
        }
    }

    async fn schedule_alert(&self, asset_id: &str, display_name: &str, target_price: f64) {
        let id = alert_identifier(asset_id);
        let message = format_alert_message(display_name, target_price);
        let bot = self.bot.clone();
        let chat_id = self.chat_id;
        let delay = self.delivery_delay;
        let log_id = id.clone();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            match Self::send(&bot, chat_id, message).await {
                Ok(()) => info!(id = %log_id, "Alert sent to Telegram"),
                Err(e) => error!(id = %log_id, error = %e, "Failed to send Telegram alert"),
            }
        });

        if let Some(previous) = self.pending.insert(id, handle) {
            previous.abort();
        }
        self.pending.retain(|_, h| !h.is_finished());
    }

    async fn cancel_alert(&self, asset_id: &str) {
        let id = alert_identifier(asset_id);
        if let Some((_, handle)) = self.pending.remove(&id) {
            handle.abort();
            debug!(id = %id, "Pending Telegram alert withdrawn");
        }
    }

    async fn flush(&self) {
        let ids: Vec<String> = self.pending.iter().map(|e| e.key().clone()).collect();
        for id in ids {
            if let Some((_, handle)) = self.pending.remove(&id) {
                let _ = handle.await;
            }
        }
    }
}

/// Format a price with precision that fits its magnitude.
fn format_price(price: f64) -> String {
    let abs_price = price.abs();
    if abs_price >= 1000.0 {
        format!("${:.2}", price)
    } else if abs_price >= 1.0 {
        format!("${:.4}", price)
    } else if abs_price >= 0.0001 {
        format!("${:.8}", price)
    } else {
        format!("${:.10}", price)
    }
}

/// Format a triggered alert as an HTML message.
pub fn format_alert_message(display_name: &str, target_price: f64) -> String {
    let now = chrono::Utc::now();
    format!(
        "🔔 <b>{}</b>\n\n<b>Target:</b> {}\n\n⏰ {}",
        html::escape(&format_alert_title(display_name, target_price)),
        format_price(target_price),
        now.format("%Y-%m-%d %H:%M:%S UTC")
    )
}
