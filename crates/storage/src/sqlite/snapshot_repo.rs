use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use tutor_core::LearnerState;

use crate::repository::{SnapshotRepository, StorageError};
use crate::snapshot::{self, SNAPSHOT_VERSION};

use super::SqliteRepository;

#[async_trait]
impl SnapshotRepository for SqliteRepository {
    async fn load_snapshot(&self, key: &str) -> Result<Option<LearnerState>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT payload
            FROM snapshots
            WHERE key = ?1
            ",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let payload: String = row
            .try_get("payload")
            .map_err(|err| StorageError::Serialization(err.to_string()))?;

        snapshot::decode(&payload).map(Some)
    }

    async fn save_snapshot(
        &self,
        key: &str,
        state: &LearnerState,
        saved_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let payload = snapshot::encode(state)?;

        sqlx::query(
            r"
            INSERT INTO snapshots (key, version, payload, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(key) DO UPDATE SET
                version = excluded.version,
                payload = excluded.payload,
                updated_at = excluded.updated_at
            ",
        )
        .bind(key)
        .bind(i64::from(SNAPSHOT_VERSION))
        .bind(payload)
        .bind(saved_at)
        .execute(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        Ok(())
    }

    async fn clear_snapshot(&self, key: &str) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM snapshots WHERE key = ?1")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|err| StorageError::Connection(err.to_string()))?;
        Ok(())
    }
}
