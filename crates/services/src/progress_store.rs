//! Single-writer container for the learner's progress.
//!
//! Mutations run inside one lock scope and are published to subscribers as a
//! whole. Persistence happens after the lock is released and never fails the
//! mutation.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use storage::repository::SnapshotRepository;
use storage::snapshot::SNAPSHOT_KEY;
use tutor_core::model::{
    Attempt, Course, CourseId, ExerciseId, ExerciseSubmission, LeaderboardEntry, Lesson, LessonId,
    Locale, ProgressPatch, find_course,
};
use tutor_core::projection::{dashboard, project_course};
use tutor_core::{Clock, CourseProgress, DashboardSummary, LearnerState, QuizOutcome, QuizSubmission};

use crate::catalog::{Catalog, CatalogProvider};
use crate::error::CatalogError;

/// Learner state as published to subscribers.
#[derive(Debug, Clone)]
pub struct StoreSnapshot {
    /// Bumped by every mutation and locale change.
    pub revision: u64,
    pub locale: Locale,
    pub state: Arc<LearnerState>,
}

struct Inner {
    state: LearnerState,
    catalog: Arc<Catalog>,
    revision: u64,
    projections: HashMap<CourseId, (u64, CourseProgress)>,
}

impl Inner {
    fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            revision: self.revision,
            locale: self.catalog.locale,
            state: Arc::new(self.state.clone()),
        }
    }
}

/// Owns the learner state, the localized catalog and the snapshot adapter.
pub struct ProgressStore {
    clock: Clock,
    inner: Mutex<Inner>,
    catalog: Arc<dyn CatalogProvider>,
    snapshots: Arc<dyn SnapshotRepository>,
    // Highest revision written; later saves of older revisions are skipped.
    persisted: tokio::sync::Mutex<u64>,
    events: watch::Sender<StoreSnapshot>,
}

impl ProgressStore {
    /// Restores the persisted snapshot, or starts from the catalog defaults.
    ///
    /// An unreadable snapshot is logged and replaced by the defaults.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the catalog for `locale` cannot be built.
    pub async fn open(
        clock: Clock,
        catalog: Arc<dyn CatalogProvider>,
        snapshots: Arc<dyn SnapshotRepository>,
        locale: Locale,
    ) -> Result<Self, CatalogError> {
        let content = catalog.catalog(locale)?;

        let state = match snapshots.load_snapshot(SNAPSHOT_KEY).await {
            Ok(Some(state)) => {
                tracing::info!(key = SNAPSHOT_KEY, "restored learner snapshot");
                state
            }
            Ok(None) => {
                tracing::info!(key = SNAPSHOT_KEY, "no snapshot found, using catalog defaults");
                default_state(&content)
            }
            Err(e) => {
                tracing::warn!(key = SNAPSHOT_KEY, error = %e, "snapshot unreadable, using catalog defaults");
                default_state(&content)
            }
        };

        Ok(Self::with_state(clock, catalog, snapshots, content, state))
    }

    fn with_state(
        clock: Clock,
        catalog: Arc<dyn CatalogProvider>,
        snapshots: Arc<dyn SnapshotRepository>,
        content: Catalog,
        state: LearnerState,
    ) -> Self {
        let inner = Inner {
            state,
            catalog: Arc::new(content),
            revision: 0,
            projections: HashMap::new(),
        };
        let (events, _) = watch::channel(inner.snapshot());

        Self {
            clock,
            inner: Mutex::new(inner),
            catalog,
            snapshots,
            persisted: tokio::sync::Mutex::new(0),
            events,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs `apply` under the lock, publishes the result and returns it with
    /// the snapshot to persist.
    ///
    /// Publication happens before the lock is released so subscribers see
    /// revisions in the order they were produced.
    fn mutate<T>(&self, op: &'static str, apply: impl FnOnce(&mut LearnerState) -> T) -> (T, StoreSnapshot) {
        let mut inner = self.lock();
        let out = apply(&mut inner.state);
        inner.revision += 1;
        let snapshot = inner.snapshot();
        self.events.send_replace(snapshot.clone());
        drop(inner);

        tracing::debug!(op, revision = snapshot.revision, "store mutated");
        (out, snapshot)
    }

    async fn persist(&self, snapshot: StoreSnapshot) {
        let mut persisted = self.persisted.lock().await;
        if snapshot.revision <= *persisted {
            return;
        }
        match self
            .snapshots
            .save_snapshot(SNAPSHOT_KEY, &snapshot.state, self.clock.now())
            .await
        {
            Ok(()) => *persisted = snapshot.revision,
            Err(e) => {
                tracing::warn!(revision = snapshot.revision, error = %e, "failed to persist learner snapshot");
            }
        }
    }

    //
    // ─── MUTATIONS ─────────────────────────────────────────────────────────────
    //

    pub async fn set_active_course(&self, course_id: CourseId) {
        let ((), snapshot) = self.mutate("set_active_course", |state| state.set_active_course(course_id));
        self.persist(snapshot).await;
    }

    /// Merges `patch` into the course's record. Unknown courses are a no-op
    /// and return `false`.
    pub async fn update_progress(&self, course_id: &CourseId, patch: ProgressPatch) -> bool {
        let (applied, snapshot) = self.mutate("update_progress", |state| state.update_progress(course_id, patch));
        self.persist(snapshot).await;
        applied
    }

    pub async fn add_attempt(&self, attempt: Attempt) {
        let ((), snapshot) = self.mutate("add_attempt", |state| state.add_attempt(attempt));
        self.persist(snapshot).await;
    }

    /// Replaces the lesson's exercise submissions.
    pub async fn record_exercises(&self, lesson_id: LessonId, submissions: Vec<ExerciseSubmission>) {
        let ((), snapshot) = self.mutate("record_exercises", |state| {
            state.record_exercises(lesson_id, submissions);
        });
        self.persist(snapshot).await;
    }

    /// Submits every exercise of a lesson at once, stamped with the current time.
    ///
    /// Returns `false` if the lesson is not in the catalog.
    pub async fn submit_exercises<'a>(
        &self,
        course_id: &CourseId,
        lesson_id: &LessonId,
        answers: impl IntoIterator<Item = (&'a ExerciseId, &'a str)>,
    ) -> bool {
        let Some(lesson) = self.lesson(course_id, lesson_id) else {
            tracing::debug!(%course_id, %lesson_id, "exercise submission for unknown lesson ignored");
            return false;
        };
        let batch = ExerciseSubmission::batch(&lesson.exercises, answers, self.clock.now());
        self.record_exercises(lesson.id, batch).await;
        true
    }

    /// Applies one quiz submission: history, lesson record and course record
    /// change together.
    pub async fn record_quiz_score(&self, submission: QuizSubmission) -> QuizOutcome {
        self.record_quiz_score_at(submission, self.clock.now()).await
    }

    pub async fn record_quiz_score_at(&self, submission: QuizSubmission, now: DateTime<Utc>) -> QuizOutcome {
        let (outcome, snapshot) =
            self.mutate("record_quiz_score", |state| state.record_quiz_score(submission, now));
        tracing::debug!(
            attempt = %outcome.attempt.id,
            score = outcome.attempt.score,
            passed = outcome.passed,
            newly_completed = outcome.newly_completed,
            "quiz score recorded"
        );
        self.persist(snapshot).await;
        outcome
    }

    /// Grades a lesson quiz against the catalog and records the percentage
    /// score out of 100.
    ///
    /// Returns `None` if the lesson is not in the catalog.
    pub async fn submit_quiz(
        &self,
        course_id: &CourseId,
        lesson_id: &LessonId,
        answers: &HashMap<String, usize>,
    ) -> Option<QuizOutcome> {
        let lesson = self.lesson(course_id, lesson_id)?;
        let grade = lesson.quiz.grade(answers);
        let submission = QuizSubmission {
            course_id: course_id.clone(),
            lesson_id: lesson.id,
            quiz_id: lesson.quiz.id,
            score: grade.percent(),
            max_score: 100,
        };
        Some(self.record_quiz_score(submission).await)
    }

    /// Swaps the localized catalog. Learner state is left untouched and is
    /// not re-persisted.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the new catalog cannot be built; the previous
    /// catalog stays active.
    pub fn locale_changed(&self, locale: Locale) -> Result<(), CatalogError> {
        let content = self.catalog.catalog(locale)?;

        let mut inner = self.lock();
        if inner.catalog.locale == locale {
            return Ok(());
        }
        inner.catalog = Arc::new(content);
        inner.revision += 1;
        self.events.send_replace(inner.snapshot());
        drop(inner);

        tracing::info!(locale = %locale, "catalog locale changed");
        Ok(())
    }

    //
    // ─── READS ─────────────────────────────────────────────────────────────────
    //

    /// Receives the latest snapshot after every change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<StoreSnapshot> {
        self.events.subscribe()
    }

    #[must_use]
    pub fn snapshot(&self) -> StoreSnapshot {
        self.lock().snapshot()
    }

    #[must_use]
    pub fn state(&self) -> LearnerState {
        self.lock().state.clone()
    }

    #[must_use]
    pub fn locale(&self) -> Locale {
        self.lock().catalog.locale
    }

    #[must_use]
    pub fn catalog(&self) -> Arc<Catalog> {
        Arc::clone(&self.lock().catalog)
    }

    #[must_use]
    pub fn courses(&self) -> Vec<Course> {
        self.lock().catalog.courses.clone()
    }

    #[must_use]
    pub fn course(&self, course_id: &CourseId) -> Option<Course> {
        find_course(&self.lock().catalog.courses, course_id).cloned()
    }

    #[must_use]
    pub fn lesson(&self, course_id: &CourseId, lesson_id: &LessonId) -> Option<Lesson> {
        find_course(&self.lock().catalog.courses, course_id)
            .and_then(|course| course.lesson(lesson_id))
            .cloned()
    }

    #[must_use]
    pub fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        self.lock().catalog.leaderboard.clone()
    }

    /// Completion summary for one course, memoized per revision.
    #[must_use]
    pub fn course_progress(&self, course_id: &CourseId) -> CourseProgress {
        let mut inner = self.lock();
        let revision = inner.revision;
        if let Some(&(at, cached)) = inner.projections.get(course_id) {
            if at == revision {
                return cached;
            }
        }
        let computed = project_course(&inner.catalog.courses, &inner.state.progress, course_id);
        inner.projections.insert(course_id.clone(), (revision, computed));
        computed
    }

    #[must_use]
    pub fn dashboard(&self) -> DashboardSummary {
        let inner = self.lock();
        dashboard(&inner.catalog.courses, &inner.state)
    }
}

fn default_state(catalog: &Catalog) -> LearnerState {
    LearnerState::new(
        catalog.user.clone(),
        catalog.progress_records.clone(),
        catalog.attempts.clone(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::GeneratedCatalog;
    use storage::repository::InMemoryRepository;
    use tutor_core::time::fixed_clock;

    async fn store() -> ProgressStore {
        ProgressStore::open(
            fixed_clock(),
            Arc::new(GeneratedCatalog::new()),
            Arc::new(InMemoryRepository::new()),
            Locale::En,
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn opens_with_catalog_defaults() {
        let store = store().await;
        let state = store.state();

        assert_eq!(state.user.id.as_str(), "user-001");
        assert_eq!(state.progress.len(), 6);
        assert!(state.lesson_progress.is_empty());
        assert_eq!(state.active_course_id, None);
    }

    #[tokio::test]
    async fn projection_is_memoized_until_next_mutation() {
        let store = store().await;
        let course = CourseId::new("python-basics");

        let first = store.course_progress(&course);
        assert_eq!(first.completed, 2);
        assert_eq!(first.total, 5);
        assert_eq!(first.percentage, 40);
        assert_eq!(store.course_progress(&course), first);

        store
            .update_progress(
                &course,
                ProgressPatch::new().completed_lessons(vec![LessonId::new("python-basics-lesson-5")]),
            )
            .await;

        assert_eq!(store.course_progress(&course).percentage, 60);
    }

    #[tokio::test]
    async fn submit_quiz_grades_against_catalog() {
        let store = store().await;
        let course = CourseId::new("python-basics");
        let lesson = LessonId::new("python-basics-lesson-3");
        let answers: HashMap<String, usize> = [
            ("python-basics-lesson-3-q1".to_string(), 1),
            ("python-basics-lesson-3-q2".to_string(), 1),
            ("python-basics-lesson-3-q3".to_string(), 0),
        ]
        .into_iter()
        .collect();

        let outcome = store.submit_quiz(&course, &lesson, &answers).await.unwrap();

        assert_eq!(outcome.attempt.score, 100);
        assert!(outcome.passed);
        assert!(outcome.newly_completed);
        assert_eq!(outcome.attempt.quiz_id.as_str(), "python-basics-lesson-3-quiz");
    }

    #[tokio::test]
    async fn unknown_lesson_is_ignored() {
        let store = store().await;
        let before = store.snapshot().revision;

        let outcome = store
            .submit_quiz(&CourseId::new("python-basics"), &LessonId::new("nope"), &HashMap::new())
            .await;
        let submitted = store
            .submit_exercises(
                &CourseId::new("nope"),
                &LessonId::new("nope"),
                Vec::<(&ExerciseId, &str)>::new(),
            )
            .await;

        assert!(outcome.is_none());
        assert!(!submitted);
        assert_eq!(store.snapshot().revision, before);
    }
}
