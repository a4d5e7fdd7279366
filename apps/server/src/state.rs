//! Application state: wires the stores, provider, cache and scheduler together.

use crate::config::AppConfig;
use moonitor_alerts::{
    AlertScheduler, AlertStore, Database, DbError, FavoritesStore, LogNotifier, Notifier,
    TelegramConfig, TelegramNotifier,
};
use moonitor_cache::{MarketDataCache, MarketDataService};
use moonitor_feeds::{CoinGeckoClient, FeedError, MarketDataProvider};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum StateError {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error(transparent)]
    Feed(#[from] FeedError),
}

/// Everything a command needs, built once at startup.
pub struct AppState {
    pub config: AppConfig,
    pub alerts: Arc<AlertStore>,
    pub favorites: FavoritesStore,
    pub market: MarketDataService,
    pub scheduler: Arc<AlertScheduler>,
    pub notifier: Arc<dyn Notifier>,
}

impl AppState {
    /// Build state around an explicit provider and notifier.
    pub async fn build(
        config: AppConfig,
        provider: Arc<dyn MarketDataProvider>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, StateError> {
        let db = Database::connect(&config.database_url).await?;
        let alerts = Arc::new(AlertStore::new(db.clone()));
        let favorites = FavoritesStore::new(db);

        let cache = Arc::new(MarketDataCache::new((&config.cache).into()));
        let market = MarketDataService::new(cache, Arc::clone(&provider));

        let scheduler = Arc::new(AlertScheduler::new(
            Arc::clone(&alerts),
            provider,
            Arc::clone(&notifier),
        ));

        Ok(Self {
            config,
            alerts,
            favorites,
            market,
            scheduler,
            notifier,
        })
    }
}

/// Create state with the CoinGecko provider and the notifier chosen by the environment.
pub async fn create_state(config: AppConfig) -> Result<AppState, StateError> {
    let provider: Arc<dyn MarketDataProvider> =
        Arc::new(CoinGeckoClient::new((&config.provider).into())?);

    let notifier: Arc<dyn Notifier> = match TelegramConfig::from_env() {
        Some(telegram) => match TelegramNotifier::new(&telegram) {
            Ok(notifier) => {
                info!(chat = %telegram.chat_id, "Telegram alerts enabled");
                Arc::new(notifier)
            }
            Err(e) => {
                warn!(error = %e, "Telegram alerts disabled, logging instead");
                Arc::new(LogNotifier)
            }
        },
        None => {
            info!("Telegram not configured, alerts are logged only");
            Arc::new(LogNotifier)
        }
    };

    AppState::build(config, provider, notifier).await
}
