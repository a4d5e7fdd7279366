//! Alert configuration types.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timing of price alert checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Interval of the in-app check while a detail screen is open.
    pub check_interval_secs: u64,
    /// Interval between background refresh wake-ups.
    pub background_interval_secs: u64,
    /// Time budget of a single background refresh.
    pub background_budget_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            check_interval_secs: 30,
            background_interval_secs: 15 * 60,
            background_budget_secs: 30,
        }
    }
}

impl SchedulerConfig {
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs.max(1))
    }

    pub fn background_interval(&self) -> Duration {
        Duration::from_secs(self.background_interval_secs.max(1))
    }

    /// Budget of one background cycle; zero means no deadline.
    pub fn background_budget(&self) -> Option<Duration> {
        (self.background_budget_secs > 0).then(|| Duration::from_secs(self.background_budget_secs))
    }
}

/// Telegram delivery settings.
#[derive(Clone)]
pub struct TelegramConfig {
    /// Bot token from @BotFather
    pub bot_token: String,
    /// Chat receiving the alerts
    pub chat_id: String,
    /// Delay before a scheduled alert is delivered; it can be withdrawn meanwhile.
    pub delivery_delay: Duration,
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .field("delivery_delay", &self.delivery_delay)
            .finish()
    }
}

impl TelegramConfig {
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
            delivery_delay: Duration::from_secs(1),
        }
    }

    /// Create config from environment variables.
    /// Uses TELEGRAM_BOT_TOKEN and TELEGRAM_CHAT_ID.
    pub fn from_env() -> Option<Self> {
        let bot_token = std::env::var("TELEGRAM_BOT_TOKEN").ok()?;
        let chat_id = std::env::var("TELEGRAM_CHAT_ID").ok()?;

        if bot_token.is_empty() || chat_id.is_empty() {
            return None;
        }

        Some(Self::new(bot_token, chat_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheduler_config_default() {
        let config = SchedulerConfig::default();
        assert_eq!(config.check_interval(), Duration::from_secs(30));
        assert_eq!(config.background_interval(), Duration::from_secs(900));
        assert_eq!(config.background_budget(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_scheduler_config_zero_budget() {
        let config = SchedulerConfig {
            background_budget_secs: 0,
            ..Default::default()
        };
        assert_eq!(config.background_budget(), None);
    }

    #[test]
    fn test_scheduler_config_partial_json() {
        let config: SchedulerConfig = serde_json::from_str(r#"{"check_interval_secs":10}"#).unwrap();
        assert_eq!(config.check_interval_secs, 10);
        assert_eq!(config.background_interval_secs, 900);
    }

    #[test]
    fn test_telegram_config_debug_redacts_token() {
        let config = TelegramConfig::new("secret-token", "42");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("42"));
    }
}
