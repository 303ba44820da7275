//! `SQLite` implementation of the `ConfigStore` port.
//!
//! Two logical keys live in one `settings` table: `config` holds the
//! persisted JSON document, `autorun` holds the auto-resume flag as the
//! string `"true"` or `"false"`.

use sqlx::SqlitePool;

use autotask_app::ports::ConfigStore;
use autotask_domain::config::Config;
use autotask_domain::error::AutoTaskError;

use crate::error::StorageError;

const CONFIG_KEY: &str = "config";
const AUTORUN_KEY: &str = "autorun";

/// `SQLite`-backed config store.
pub struct SqliteConfigStore {
    pool: SqlitePool,
}

impl SqliteConfigStore {
    /// Create a new store backed by the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn read_key(&self, key: &str) -> Result<Option<String>, StorageError> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|(value,)| value))
    }

    async fn write_key(&self, key: &str, value: &str) -> Result<(), StorageError> {
        sqlx::query(
            "INSERT INTO settings (key, value, updated_at) VALUES (?, ?, ?) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(value)
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

impl ConfigStore for SqliteConfigStore {
    async fn load_config(&self) -> Result<Config, AutoTaskError> {
        let raw = self.read_key(CONFIG_KEY).await.map_err(StorageError::from)?;
        // Missing or corrupted data decodes to defaults, field by field.
        Ok(raw
            .map(|raw| Config::from_json_lossy(&raw))
            .unwrap_or_default())
    }

    async fn save_config(&self, config: Config) -> Result<(), AutoTaskError> {
        let json = serde_json::to_string(&config).map_err(StorageError::from)?;
        self.write_key(CONFIG_KEY, &json)
            .await
            .map_err(AutoTaskError::from)
    }

    async fn load_autorun(&self) -> Result<bool, AutoTaskError> {
        let raw = self
            .read_key(AUTORUN_KEY)
            .await
            .map_err(StorageError::from)?;
        Ok(raw.as_deref() == Some("true"))
    }

    async fn save_autorun(&self, armed: bool) -> Result<(), AutoTaskError> {
        self.write_key(AUTORUN_KEY, if armed { "true" } else { "false" })
            .await
            .map_err(AutoTaskError::from)
    }
}
