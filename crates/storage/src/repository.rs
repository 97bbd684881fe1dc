use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tutor_core::LearnerState;

use crate::snapshot;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Durable home of the learner snapshot.
///
/// Implementations store whole snapshots by key; there is no partial update.
#[async_trait]
pub trait SnapshotRepository: Send + Sync {
    /// Fetch the snapshot stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend fails or the payload cannot be decoded.
    async fn load_snapshot(&self, key: &str) -> Result<Option<LearnerState>, StorageError>;

    /// Replace the snapshot stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the snapshot cannot be stored.
    async fn save_snapshot(
        &self,
        key: &str,
        state: &LearnerState,
        saved_at: DateTime<Utc>,
    ) -> Result<(), StorageError>;

    /// Remove the snapshot stored under `key`. Missing keys are not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend fails.
    async fn clear_snapshot(&self, key: &str) -> Result<(), StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
///
/// Payloads go through the same encoding as the durable backends.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    snapshots: Arc<Mutex<HashMap<String, (String, DateTime<Utc>)>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self {
            snapshots: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Time of the last successful save under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn saved_at(&self, key: &str) -> Result<Option<DateTime<Utc>>, StorageError> {
        let guard = self
            .snapshots
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(key).map(|(_, at)| *at))
    }
}

#[async_trait]
impl SnapshotRepository for InMemoryRepository {
    async fn load_snapshot(&self, key: &str) -> Result<Option<LearnerState>, StorageError> {
        let payload = {
            let guard = self
                .snapshots
                .lock()
                .map_err(|e| StorageError::Connection(e.to_string()))?;
            guard.get(key).map(|(payload, _)| payload.clone())
        };
        payload.as_deref().map(snapshot::decode).transpose()
    }

    async fn save_snapshot(
        &self,
        key: &str,
        state: &LearnerState,
        saved_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let payload = snapshot::encode(state)?;
        let mut guard = self
            .snapshots
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(key.to_string(), (payload, saved_at));
        Ok(())
    }

    async fn clear_snapshot(&self, key: &str) -> Result<(), StorageError> {
        let mut guard = self
            .snapshots
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.remove(key);
        Ok(())
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub snapshots: Arc<dyn SnapshotRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let snapshots: Arc<dyn SnapshotRepository> = Arc::new(InMemoryRepository::new());
        Self { snapshots }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::SNAPSHOT_KEY;
    use tutor_core::model::{ExerciseId, ExerciseSubmission, LessonId, User, UserId};
    use tutor_core::time::fixed_now;

    fn state() -> LearnerState {
        let user = User {
            id: UserId::new("user-001"),
            name: "Learner".into(),
            email: "learner@example.com".into(),
            role: Default::default(),
            enrolled_course_ids: Vec::new(),
            badges: Vec::new(),
            rank: 0,
            streak_days: 0,
            avatar_color: String::new(),
        };
        let mut state = LearnerState::new(user, Vec::new(), Vec::new());
        state.record_exercises(
            LessonId::new("l1"),
            vec![ExerciseSubmission::new(ExerciseId::new("e1"), "x", fixed_now())],
        );
        state
    }

    #[tokio::test]
    async fn missing_snapshot_is_none() {
        let repo = InMemoryRepository::new();
        assert!(repo.load_snapshot(SNAPSHOT_KEY).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn round_trips_snapshot() {
        let repo = InMemoryRepository::new();
        let state = state();

        repo.save_snapshot(SNAPSHOT_KEY, &state, fixed_now()).await.unwrap();

        let loaded = repo.load_snapshot(SNAPSHOT_KEY).await.unwrap().unwrap();
        assert_eq!(loaded, state);
        assert_eq!(repo.saved_at(SNAPSHOT_KEY).unwrap(), Some(fixed_now()));
    }

    #[tokio::test]
    async fn clear_removes_snapshot() {
        let repo = InMemoryRepository::new();
        repo.save_snapshot(SNAPSHOT_KEY, &state(), fixed_now()).await.unwrap();

        repo.clear_snapshot(SNAPSHOT_KEY).await.unwrap();
        repo.clear_snapshot(SNAPSHOT_KEY).await.unwrap();

        assert!(repo.load_snapshot(SNAPSHOT_KEY).await.unwrap().is_none());
    }
}
