use chrono::Duration;
use storage::repository::{SnapshotRepository, Storage, StorageError};
use storage::snapshot::SNAPSHOT_KEY;
use storage::sqlite::SqliteRepository;
use tutor_core::model::{CourseId, LessonId, Progress, QuizId, User, UserId};
use tutor_core::time::fixed_now;
use tutor_core::{LearnerState, QuizSubmission};

fn learner() -> LearnerState {
    let user = User {
        id: UserId::new("user-001"),
        name: "Learner".into(),
        email: "learner@example.com".into(),
        role: Default::default(),
        enrolled_course_ids: vec![CourseId::new("c1")],
        badges: Vec::new(),
        rank: 18,
        streak_days: 12,
        avatar_color: "#0F766E".into(),
    };
    let mut record = Progress::new(user.id.clone(), CourseId::new("c1"));
    record.average_score = 80;
    LearnerState::new(user, vec![record], Vec::new())
}

#[tokio::test]
async fn sqlite_roundtrip_persists_snapshot() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_roundtrip?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let mut state = learner();
    state.record_quiz_score(
        QuizSubmission {
            course_id: CourseId::new("c1"),
            lesson_id: LessonId::new("l3"),
            quiz_id: QuizId::new("q3"),
            score: 90,
            max_score: 100,
        },
        fixed_now(),
    );
    repo.save_snapshot(SNAPSHOT_KEY, &state, fixed_now())
        .await
        .unwrap();

    let loaded = repo
        .load_snapshot(SNAPSHOT_KEY)
        .await
        .unwrap()
        .expect("snapshot stored");
    assert_eq!(loaded, state);
    let record = loaded.progress_for(&CourseId::new("c1")).unwrap();
    assert_eq!(record.average_score, 85);
    assert!(record.is_completed(&LessonId::new("l3")));
}

#[tokio::test]
async fn sqlite_save_overwrites_previous_snapshot() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_overwrite?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let mut state = learner();
    repo.save_snapshot(SNAPSHOT_KEY, &state, fixed_now())
        .await
        .unwrap();
    state.set_active_course(CourseId::new("c1"));
    repo.save_snapshot(SNAPSHOT_KEY, &state, fixed_now() + Duration::seconds(1))
        .await
        .unwrap();

    let loaded = repo.load_snapshot(SNAPSHOT_KEY).await.unwrap().unwrap();
    assert_eq!(loaded.active_course_id, Some(CourseId::new("c1")));

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM snapshots")
        .fetch_one(repo.pool())
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn sqlite_migrations_are_idempotent() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_migrate?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("first migrate");
    repo.migrate().await.expect("second migrate");

    assert!(repo.load_snapshot(SNAPSHOT_KEY).await.unwrap().is_none());
}

#[tokio::test]
async fn sqlite_reports_corrupt_payloads() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_corrupt?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    sqlx::query(
        "INSERT INTO snapshots (key, version, payload, updated_at) VALUES (?1, 1, 'nope', ?2)",
    )
    .bind(SNAPSHOT_KEY)
    .bind(fixed_now())
    .execute(repo.pool())
    .await
    .unwrap();

    let err = repo.load_snapshot(SNAPSHOT_KEY).await.unwrap_err();
    assert!(matches!(err, StorageError::Serialization(_)));
}

#[tokio::test]
async fn storage_sqlite_wires_snapshot_repository() {
    let storage = Storage::sqlite("sqlite:file:memdb_storage?mode=memory&cache=shared")
        .await
        .expect("storage");
    let state = learner();
    storage
        .snapshots
        .save_snapshot(SNAPSHOT_KEY, &state, fixed_now())
        .await
        .unwrap();
    storage.snapshots.clear_snapshot(SNAPSHOT_KEY).await.unwrap();
    assert!(storage.snapshots.load_snapshot(SNAPSHOT_KEY).await.unwrap().is_none());
}
