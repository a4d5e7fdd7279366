//! SQLite-backed key-value settings.
//!
//! Every value is stored as JSON text next to its key, so a key can hold a
//! number (alert thresholds), a string or a list of strings (favorites).

use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("Failed to encode setting {key}: {source}")]
    Encoding {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A stored setting value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Number(f64),
    Text(String),
    List(Vec<String>),
}

impl SettingValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    fn encode(&self, key: &str) -> Result<String, DbError> {
        serde_json::to_string(self).map_err(|source| DbError::Encoding {
            key: key.to_string(),
            source,
        })
    }
}

impl From<f64> for SettingValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<&str> for SettingValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<Vec<String>> for SettingValue {
    fn from(items: Vec<String>) -> Self {
        Self::List(items)
    }
}

/// Settings database connection.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connect to the SQLite database at the given URL, creating it if missing.
    ///
    /// `sqlite::memory:` databases live as long as their single pooled connection.
    pub async fn connect(database_url: &str) -> Result<Self, DbError> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(5)
                .connect_with(options)
                .await?
        };

        let db = Self { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    async fn run_migrations(&self) -> Result<(), DbError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Read a setting. Rows that no longer decode are reported as absent.
    pub async fn get(&self, key: &str) -> Result<Option<SettingValue>, DbError> {
        let raw = sqlx::query_scalar::<_, String>("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(raw.and_then(|raw| match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "Ignoring undecodable setting");
                None
            }
        }))
    }

    /// Insert or overwrite a setting.
    pub async fn set(&self, key: &str, value: &SettingValue) -> Result<(), DbError> {
        let encoded = value.encode(key)?;

        sqlx::query(
            r#"
            INSERT INTO settings (key, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(&encoded)
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Delete a setting. Returns whether a row existed.
    pub async fn remove(&self, key: &str) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM settings WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a setting only if it still holds `expected`.
    /// Returns whether the row was deleted.
    ///
    /// The stored value is decoded and compared as a `SettingValue`, so two
    /// encodings of the same number match. The delete is keyed on the raw
    /// text that was read, so a concurrent overwrite is never removed.
    pub async fn remove_if_equals(&self, key: &str, expected: &SettingValue) -> Result<bool, DbError> {
        let raw = sqlx::query_scalar::<_, String>("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        let Some(raw) = raw else {
            return Ok(false);
        };
        match serde_json::from_str::<SettingValue>(&raw) {
            Ok(stored) if stored == *expected => {}
            _ => return Ok(false),
        }

        let result = sqlx::query("DELETE FROM settings WHERE key = ? AND value = ?")
            .bind(key)
            .bind(&raw)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// All keys starting with `prefix`, sorted.
    pub async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, DbError> {
        let keys = sqlx::query_scalar::<_, String>(
            "SELECT key FROM settings WHERE substr(key, 1, length(?)) = ? ORDER BY key",
        )
        .bind(prefix)
        .bind(prefix)
        .fetch_all(&self.pool)
        .await?;

        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    async fn memory_db() -> Database {
        Database::connect("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn test_get_missing_key() {
        let db = memory_db().await;
        assert_eq!(db.get("nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_and_overwrite() {
        let db = memory_db().await;

        db.set("alert_bitcoin", &SettingValue::Number(100.0)).await.unwrap();
        assert_eq!(db.get("alert_bitcoin").await.unwrap(), Some(SettingValue::Number(100.0)));

        db.set("alert_bitcoin", &SettingValue::Number(250.5)).await.unwrap();
        let value = db.get("alert_bitcoin").await.unwrap().unwrap();
        assert_eq!(value.as_number(), Some(250.5));
    }

    #[tokio::test]
    async fn test_value_kinds() {
        let db = memory_db().await;
        let list = SettingValue::from(vec!["bitcoin".to_string(), "ethereum".to_string()]);

        db.set("favorites", &list).await.unwrap();
        db.set("theme", &SettingValue::from("dark")).await.unwrap();

        let favorites = db.get("favorites").await.unwrap().unwrap();
        assert_eq!(favorites.as_list().unwrap().len(), 2);
        assert_eq!(favorites.as_number(), None);

        let theme = db.get("theme").await.unwrap().unwrap();
        assert_eq!(theme.as_text(), Some("dark"));
    }

    #[tokio::test]
    async fn test_remove() {
        let db = memory_db().await;
        db.set("alert_bitcoin", &SettingValue::Number(1.0)).await.unwrap();

        assert!(db.remove("alert_bitcoin").await.unwrap());
        assert!(!db.remove("alert_bitcoin").await.unwrap());
        assert_eq!(db.get("alert_bitcoin").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_remove_if_equals() {
        let db = memory_db().await;
        db.set("alert_bitcoin", &SettingValue::Number(120.0)).await.unwrap();

        assert!(!db
            .remove_if_equals("alert_bitcoin", &SettingValue::Number(100.0))
            .await
            .unwrap());
        assert!(db.get("alert_bitcoin").await.unwrap().is_some());

        assert!(db
            .remove_if_equals("alert_bitcoin", &SettingValue::Number(120.0))
            .await
            .unwrap());
        assert_eq!(db.get("alert_bitcoin").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_remove_if_equals_exact_float() {
        let db = memory_db().await;
        let target = SettingValue::Number(100.00007544360213);
        db.set("alert_bitcoin", &target).await.unwrap();

        assert_eq!(db.get("alert_bitcoin").await.unwrap(), Some(target.clone()));
        assert!(db.remove_if_equals("alert_bitcoin", &target).await.unwrap());
        assert_eq!(db.get("alert_bitcoin").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_remove_if_equals_other_kind() {
        let db = memory_db().await;
        db.set("theme", &SettingValue::from("dark")).await.unwrap();

        assert!(!db.remove_if_equals("theme", &SettingValue::Number(1.0)).await.unwrap());
        assert!(!db.remove_if_equals("missing", &SettingValue::Number(1.0)).await.unwrap());
        assert!(db.get("theme").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_keys_with_prefix() {
        let db = memory_db().await;
        db.set("alert_ethereum", &SettingValue::Number(1.0)).await.unwrap();
        db.set("alert_bitcoin", &SettingValue::Number(2.0)).await.unwrap();
        db.set("favorites", &SettingValue::List(Vec::new())).await.unwrap();
        // LIKE wildcards in keys must not match loosely
        db.set("alertXsolana", &SettingValue::Number(3.0)).await.unwrap();

        let keys = db.keys_with_prefix("alert_").await.unwrap();
        assert_eq!(keys, vec!["alert_bitcoin", "alert_ethereum"]);
    }
}
