//! Favorite assets, kept in the settings database.

use crate::db::{Database, SettingValue};
use crate::store::StoreError;
use std::collections::BTreeSet;
use tokio::sync::Mutex;
use tracing::debug;

const FAVORITES_KEY: &str = "favorites";

/// Set of favorite asset ids stored as a list under `favorites`.
pub struct FavoritesStore {
    db: Database,
    write_lock: Mutex<()>,
}

impl FavoritesStore {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            write_lock: Mutex::new(()),
        }
    }

    /// Current favorites, sorted.
    pub async fn ids(&self) -> Result<BTreeSet<String>, StoreError> {
        let value = self.db.get(FAVORITES_KEY).await?;
        Ok(value
            .and_then(|v| v.as_list().map(|items| items.iter().cloned().collect()))
            .unwrap_or_default())
    }

    pub async fn is_favorite(&self, asset_id: &str) -> Result<bool, StoreError> {
        Ok(self.ids().await?.contains(asset_id))
    }

    /// Add an asset. Returns false if it was already a favorite.
    pub async fn add(&self, asset_id: &str) -> Result<bool, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut ids = self.ids().await?;
        if !ids.insert(asset_id.to_string()) {
            return Ok(false);
        }
        self.save(ids).await?;
        debug!(asset = asset_id, "Added favorite");
        Ok(true)
    }

    /// Remove an asset. Returns false if it was not a favorite.
    pub async fn remove(&self, asset_id: &str) -> Result<bool, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut ids = self.ids().await?;
        if !ids.remove(asset_id) {
            return Ok(false);
        }
        self.save(ids).await?;
        debug!(asset = asset_id, "Removed favorite");
        Ok(true)
    }

    /// Flip membership. Returns whether the asset is a favorite afterwards.
    pub async fn toggle(&self, asset_id: &str) -> Result<bool, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut ids = self.ids().await?;
        let now_favorite = if ids.remove(asset_id) {
            false
        } else {
            ids.insert(asset_id.to_string());
            true
        };
        self.save(ids).await?;
        Ok(now_favorite)
    }

    async fn save(&self, ids: BTreeSet<String>) -> Result<(), StoreError> {
        let list = SettingValue::List(ids.into_iter().collect());
        self.db.set(FAVORITES_KEY, &list).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    async fn favorites() -> FavoritesStore {
        FavoritesStore::new(Database::connect("sqlite::memory:").await.unwrap())
    }

    #[tokio::test]
    async fn test_add_and_remove() {
        let store = favorites().await;

        assert!(store.add("bitcoin").await.unwrap());
        assert!(!store.add("bitcoin").await.unwrap());
        assert!(store.is_favorite("bitcoin").await.unwrap());

        assert!(store.remove("bitcoin").await.unwrap());
        assert!(!store.remove("bitcoin").await.unwrap());
        assert!(!store.is_favorite("bitcoin").await.unwrap());
    }

    #[tokio::test]
    async fn test_toggle() {
        let store = favorites().await;

        assert!(store.toggle("ethereum").await.unwrap());
        assert!(store.is_favorite("ethereum").await.unwrap());
        assert!(!store.toggle("ethereum").await.unwrap());
        assert!(store.ids().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ids_sorted() {
        let store = favorites().await;
        store.add("solana").await.unwrap();
        store.add("bitcoin").await.unwrap();

        let ids: Vec<_> = store.ids().await.unwrap().into_iter().collect();
        assert_eq!(ids, vec!["bitcoin", "solana"]);
    }

    #[tokio::test]
    async fn test_persists_across_reconnect() {
        let path = std::env::temp_dir().join(format!(
            "moonitor-favorites-{}-{}.db",
            std::process::id(),
            chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
        ));
        let url = format!("sqlite://{}", path.display());

        {
            let store = FavoritesStore::new(Database::connect(&url).await.unwrap());
            store.add("bitcoin").await.unwrap();
            store.add("ethereum").await.unwrap();
        }

        let store = FavoritesStore::new(Database::connect(&url).await.unwrap());
        assert!(store.is_favorite("bitcoin").await.unwrap());
        assert_eq!(store.ids().await.unwrap().len(), 2);

        drop(store);
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
        }
    }
}
