//! Exchange metadata directory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Metadata for a single exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeInfo {
    /// Provider identifier (e.g., "binance")
    pub id: String,
    /// Display name, matching `Ticker::exchange_name`
    pub name: String,
    /// Logo image URL
    pub logo_url: String,
    /// Exchange website URL
    pub site_url: String,
}

impl ExchangeInfo {
    pub fn new(id: &str, name: &str, logo_url: &str, site_url: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            logo_url: logo_url.to_string(),
            site_url: site_url.to_string(),
        }
    }
}

/// Exchange metadata indexed by display name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeDirectory {
    by_name: HashMap<String, ExchangeInfo>,
}

impl ExchangeDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an exchange. A later entry with the same name replaces the earlier one.
    pub fn insert(&mut self, info: ExchangeInfo) {
        self.by_name.insert(info.name.clone(), info);
    }

    pub fn get(&self, name: &str) -> Option<&ExchangeInfo> {
        self.by_name.get(name)
    }

    /// Logo URL for an exchange name.
    pub fn logo(&self, name: &str) -> Option<&str> {
        self.get(name)
            .map(|e| e.logo_url.as_str())
            .filter(|s| !s.is_empty())
    }

    /// Website URL for an exchange name.
    pub fn url(&self, name: &str) -> Option<&str> {
        self.get(name)
            .map(|e| e.site_url.as_str())
            .filter(|s| !s.is_empty())
    }

    /// Whether both a logo and a website are known for this exchange.
    pub fn is_displayable(&self, name: &str) -> bool {
        self.logo(name).is_some() && self.url(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExchangeInfo> {
        self.by_name.values()
    }
}

impl FromIterator<ExchangeInfo> for ExchangeDirectory {
    fn from_iter<T: IntoIterator<Item = ExchangeInfo>>(iter: T) -> Self {
        let mut directory = Self::new();
        for info in iter {
            directory.insert(info);
        }
        directory
    }
}
