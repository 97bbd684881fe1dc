use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use services::catalog::{CatalogProvider, GeneratedCatalog};
use services::progress_store::ProgressStore;
use storage::repository::{InMemoryRepository, SnapshotRepository, StorageError};
use storage::snapshot::SNAPSHOT_KEY;
use tutor_core::model::{CourseId, ExerciseId, ExerciseSubmission, LessonId, Locale, ProgressPatch, QuizId};
use tutor_core::time::{fixed_clock, fixed_now};
use tutor_core::{LearnerState, QuizSubmission};

const COURSE: &str = "python-basics";

fn lesson(n: usize) -> LessonId {
    LessonId::new(format!("{COURSE}-lesson-{n}"))
}

fn quiz(n: usize, score: u32) -> QuizSubmission {
    QuizSubmission {
        course_id: CourseId::new(COURSE),
        lesson_id: lesson(n),
        quiz_id: QuizId::new(format!("{COURSE}-lesson-{n}-quiz")),
        score,
        max_score: 100,
    }
}

fn catalog() -> Arc<dyn CatalogProvider> {
    Arc::new(GeneratedCatalog::new())
}

async fn open(repo: Arc<dyn SnapshotRepository>) -> ProgressStore {
    ProgressStore::open(fixed_clock(), catalog(), repo, Locale::En)
        .await
        .unwrap()
}

/// Seeded record: lessons 1-2 completed, average 78.
async fn store_with_average(average: u32) -> ProgressStore {
    let store = open(Arc::new(InMemoryRepository::new())).await;
    assert!(
        store
            .update_progress(&CourseId::new(COURSE), ProgressPatch::new().average_score(average))
            .await
    );
    store
}

#[tokio::test]
async fn failing_then_passing_quiz() {
    let store = store_with_average(80).await;
    let course = CourseId::new(COURSE);
    let attempts_before = store.state().attempts.len();

    let failed = store.record_quiz_score(quiz(3, 60)).await;

    let state = store.state();
    let record = state.progress_for(&course).unwrap();
    assert!(!failed.passed);
    assert_eq!(record.completed_lesson_ids(), &[lesson(1), lesson(2)]);
    assert_eq!(record.average_score, 70);
    assert_eq!(state.attempts.len(), attempts_before + 1);
    assert_eq!(state.attempts.last().unwrap().score, 60);

    let passed = store.record_quiz_score(quiz(4, 90)).await;

    let state = store.state();
    let record = state.progress_for(&course).unwrap();
    assert!(passed.newly_completed);
    assert!(record.is_completed(&lesson(4)));
    assert_eq!(record.average_score, 80);
    assert_eq!(store.course_progress(&course).completed, 3);
}

#[tokio::test]
async fn exercises_replace_only_exercises() {
    let store = store_with_average(80).await;
    store.record_quiz_score(quiz(1, 95)).await;
    let before = store.state().lesson(&lesson(1)).cloned().unwrap();

    let submission = ExerciseSubmission::new(ExerciseId::new("e1"), "x", fixed_now());
    store.record_exercises(lesson(1), vec![submission.clone()]).await;

    let after = store.state().lesson(&lesson(1)).cloned().unwrap();
    assert_eq!(after.exercises, vec![submission]);
    assert_eq!(after.quiz_score, before.quiz_score);
    assert_eq!(after.completed_at, before.completed_at);
    assert!(after.completed_at.is_some());
}

#[tokio::test]
async fn submit_exercises_fills_unanswered_prompts() {
    let store = store_with_average(80).await;
    let second = ExerciseId::new(format!("{}-ex-2", lesson(3)));

    let accepted = store
        .submit_exercises(&CourseId::new(COURSE), &lesson(3), [(&second, "databases")])
        .await;

    assert!(accepted);
    let record = store.state().lesson(&lesson(3)).cloned().unwrap();
    let answers: Vec<&str> = record.exercises.iter().map(|e| e.answer.as_str()).collect();
    assert_eq!(answers, vec!["", "databases", ""]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn subscribers_never_see_half_applied_submissions() {
    const WRITERS: usize = 24;
    let store = Arc::new(store_with_average(80).await);
    let base_attempts = store.state().attempts.len();
    let base_revision = store.snapshot().revision;
    let mut rx = store.subscribe();

    let watcher = tokio::spawn(async move {
        let mut last_revision = 0;
        loop {
            let snapshot = rx.borrow_and_update().clone();
            assert!(snapshot.revision >= last_revision);
            last_revision = snapshot.revision;
            let state = &snapshot.state;
            let new_attempts = state.attempts.len() - base_attempts;
            assert_eq!(new_attempts, state.lesson_progress.len());
            if new_attempts == WRITERS {
                return last_revision;
            }
            if rx.changed().await.is_err() {
                return last_revision;
            }
        }
    });

    let writers: Vec<_> = (1..=WRITERS)
        .map(|n| {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.record_quiz_score(quiz(n, 75)).await })
        })
        .collect();
    for writer in writers {
        writer.await.unwrap();
    }

    let expected = base_revision + u64::try_from(WRITERS).unwrap();
    assert_eq!(watcher.await.unwrap(), expected);
    let state = store.state();
    let record = state.progress_for(&CourseId::new(COURSE)).unwrap();
    assert_eq!(record.completed_lesson_ids().len(), WRITERS);
    assert_eq!(store.snapshot().revision, expected);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn subscriber_ends_on_the_latest_revision() {
    let store = Arc::new(open(Arc::new(InMemoryRepository::new())).await);
    let rx = store.subscribe();

    for _ in 0..50 {
        let writers: Vec<_> = (0..16)
            .map(|n| {
                let store = Arc::clone(&store);
                let course = if n % 2 == 0 { COURSE } else { "sql-basics" };
                tokio::spawn(async move { store.set_active_course(CourseId::new(course)).await })
            })
            .collect();
        for writer in writers {
            writer.await.unwrap();
        }

        let published = rx.borrow().clone();
        let current = store.snapshot();
        assert_eq!(published.revision, current.revision);
        assert_eq!(published.state.active_course_id, current.state.active_course_id);
    }
}

#[tokio::test]
async fn state_survives_restart() {
    let repo = Arc::new(InMemoryRepository::new());
    let store = open(repo.clone()).await;
    store.set_active_course(CourseId::new(COURSE)).await;
    store.record_quiz_score(quiz(3, 88)).await;
    let expected = store.state();
    drop(store);

    assert_eq!(repo.saved_at(SNAPSHOT_KEY).unwrap(), Some(fixed_now()));
    let reopened = open(repo).await;

    assert_eq!(reopened.state(), expected);
    assert_eq!(reopened.state().active_course_id, Some(CourseId::new(COURSE)));
}

struct BrokenRepository;

#[async_trait]
impl SnapshotRepository for BrokenRepository {
    async fn load_snapshot(&self, _key: &str) -> Result<Option<LearnerState>, StorageError> {
        Err(StorageError::Serialization("unexpected end of input".into()))
    }

    async fn save_snapshot(
        &self,
        _key: &str,
        _state: &LearnerState,
        _saved_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        Err(StorageError::Connection("disk full".into()))
    }

    async fn clear_snapshot(&self, _key: &str) -> Result<(), StorageError> {
        Ok(())
    }
}

#[tokio::test]
async fn storage_failures_do_not_block_progress() {
    let store = open(Arc::new(BrokenRepository)).await;
    assert_eq!(store.state().progress.len(), 6);

    let outcome = store.record_quiz_score(quiz(5, 100)).await;

    assert!(outcome.newly_completed);
    let state = store.state();
    assert!(state.progress_for(&CourseId::new(COURSE)).unwrap().is_completed(&lesson(5)));
}

#[tokio::test]
async fn locale_swap_keeps_learner_state() {
    let store = store_with_average(80).await;
    let course = CourseId::new(COURSE);
    store.record_quiz_score(quiz(3, 90)).await;
    let state_before = store.state();
    let progress_before = store.course_progress(&course);
    let title_before = store.lesson(&course, &lesson(1)).unwrap().title;
    let revision_before = store.snapshot().revision;

    store.locale_changed(Locale::Uz).unwrap();

    assert_eq!(store.locale(), Locale::Uz);
    assert_eq!(store.state(), state_before);
    assert_eq!(store.course_progress(&course), progress_before);
    assert_ne!(store.lesson(&course, &lesson(1)).unwrap().title, title_before);
    assert_eq!(store.snapshot().revision, revision_before + 1);

    store.locale_changed(Locale::Uz).unwrap();
    assert_eq!(store.snapshot().revision, revision_before + 1);
}

#[tokio::test]
async fn dashboard_aggregates_seeded_records() {
    let store = open(Arc::new(InMemoryRepository::new())).await;

    let summary = store.dashboard();

    assert_eq!(summary.enrolled_courses, 6);
    assert_eq!(summary.completed_lessons, 18);
    assert_eq!(summary.average_score, 83);
    assert_eq!(summary.attempts, 18);
    assert_eq!(summary.courses.len(), 6);
    assert_eq!(summary.courses[0].1.percentage, 40);
}

#[tokio::test]
async fn unknown_course_update_is_a_noop() {
    let store = open(Arc::new(InMemoryRepository::new())).await;
    let before = store.state();

    let applied = store
        .update_progress(&CourseId::new("missing"), ProgressPatch::new().average_score(1))
        .await;

    assert!(!applied);
    assert_eq!(store.state(), before);
}
