//! In-process market data caching.
//!
//! Avoids redundant provider calls when a detail screen is revisited or
//! the chart range selector is toggled. Nothing here is persisted; the
//! cache lives for the duration of the process.

pub mod market_cache;
pub mod service;
pub mod tickers;

pub use market_cache::*;
pub use service::*;
pub use tickers::*;
