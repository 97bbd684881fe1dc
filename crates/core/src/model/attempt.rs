use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::{AttemptId, LessonId, QuizId};

/// Immutable record of one quiz submission.
///
/// Attempts are only ever appended to the history; duplicates are kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attempt {
    pub id: AttemptId,
    pub quiz_id: QuizId,
    pub score: u32,
    pub max_score: u32,
    pub completed_at: DateTime<Utc>,
}

impl Attempt {
    #[must_use]
    pub fn new(
        id: AttemptId,
        quiz_id: QuizId,
        score: u32,
        max_score: u32,
        completed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            quiz_id,
            score,
            max_score,
            completed_at,
        }
    }

    /// Attempt for a lesson quiz, id derived from the lesson and the
    /// submission time in milliseconds.
    #[must_use]
    pub fn for_lesson(
        lesson_id: &LessonId,
        quiz_id: QuizId,
        score: u32,
        max_score: u32,
        completed_at: DateTime<Utc>,
    ) -> Self {
        let id = AttemptId::new(format!("{lesson_id}-{}", completed_at.timestamp_millis()));
        Self::new(id, quiz_id, score, max_score, completed_at)
    }
}
