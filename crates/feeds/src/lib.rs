//! Market data feeds for the Moonitor tracker.
//!
//! This crate provides the market data provider interface and its
//! implementations.
//!
//! ## Architecture
//!
//! - `provider` - The `MarketDataProvider` trait consumed by caches and alert tasks
//! - `rest` - CoinGecko REST client
//! - `mock` - Scriptable in-process provider for tests and offline runs

pub mod error;
pub mod mock;
pub mod provider;
pub mod rest;

pub use error::*;
pub use mock::MockMarketData;
pub use provider::*;
pub use rest::{CoinGeckoClient, CoinGeckoConfig};
