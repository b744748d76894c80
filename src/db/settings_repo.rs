use sqlx::SqlitePool;

use super::StoreError;

const HAS_PRELOADED: &str = "has_preloaded";

/// Small key/value settings persisted next to the data.
#[derive(Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Whether the one-time remote preload has completed on this installation.
    pub async fn has_preloaded(&self) -> Result<bool, StoreError> {
        Ok(self.get_bool(HAS_PRELOADED).await?.unwrap_or(false))
    }

    pub async fn set_has_preloaded(&self, value: bool) -> Result<(), StoreError> {
        self.set_bool(HAS_PRELOADED, value).await
    }

    async fn get_bool(&self, key: &str) -> Result<Option<bool>, StoreError> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM app_settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|(value,)| value == "true"))
    }

    async fn set_bool(&self, key: &str, value: bool) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO app_settings (key, value) VALUES (?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(key)
        .bind(if value { "true" } else { "false" })
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
