use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::model::catalog::Exercise;
use crate::model::ids::{CourseId, ExerciseId, LessonId, ProgressId, UserId};

//
// ─── EXERCISE SUBMISSIONS ──────────────────────────────────────────────────────
//

/// One learner answer to a lesson exercise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseSubmission {
    pub exercise_id: ExerciseId,
    pub answer: String,
    pub submitted_at: DateTime<Utc>,
}

impl ExerciseSubmission {
    #[must_use]
    pub fn new(
        exercise_id: ExerciseId,
        answer: impl Into<String>,
        submitted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            exercise_id,
            answer: answer.into(),
            submitted_at,
        }
    }

    /// Builds one submission per exercise, in catalog order.
    ///
    /// Exercises without an answer are submitted with an empty string, and a
    /// later answer for the same exercise id overwrites an earlier one.
    #[must_use]
    pub fn batch<'a>(
        exercises: &[Exercise],
        answers: impl IntoIterator<Item = (&'a ExerciseId, &'a str)>,
        submitted_at: DateTime<Utc>,
    ) -> Vec<Self> {
        let mut by_id: Vec<(&ExerciseId, &str)> = Vec::new();
        for (id, answer) in answers {
            match by_id.iter_mut().find(|(existing, _)| *existing == id) {
                Some(slot) => slot.1 = answer,
                None => by_id.push((id, answer)),
            }
        }

        exercises
            .iter()
            .map(|exercise| {
                let answer = by_id
                    .iter()
                    .find(|(id, _)| **id == exercise.id)
                    .map_or("", |(_, answer)| *answer);
                Self::new(exercise.id.clone(), answer, submitted_at)
            })
            .collect()
    }
}

//
// ─── LESSON PROGRESS ───────────────────────────────────────────────────────────
//

/// Per-lesson submissions and latest quiz result.
///
/// `completed_at` reflects whether the most recent quiz attempt passed, not
/// whether the lesson was ever passed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonProgress {
    pub lesson_id: LessonId,
    #[serde(default)]
    pub exercises: Vec<ExerciseSubmission>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quiz_score: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quiz_max_score: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl LessonProgress {
    #[must_use]
    pub fn new(lesson_id: LessonId) -> Self {
        Self {
            lesson_id,
            exercises: Vec::new(),
            quiz_score: None,
            quiz_max_score: None,
            completed_at: None,
        }
    }

    #[must_use]
    pub fn is_passing(&self) -> bool {
        self.completed_at.is_some()
    }
}

//
// ─── COURSE PROGRESS ───────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamResults {
    pub lesson_review: u32,
    pub mid_course: u32,
    #[serde(rename = "final")]
    pub final_exam: u32,
}

/// Per-course completion and scoring aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub id: ProgressId,
    pub user_id: UserId,
    pub course_id: CourseId,
    completed_lesson_ids: Vec<LessonId>,
    pub average_score: u32,
    pub next_lesson_id: Option<LessonId>,
    pub last_studied_at: Option<NaiveDate>,
    #[serde(default)]
    pub exam_results: ExamResults,
}

impl Progress {
    /// Creates an empty record for a newly enrolled course.
    #[must_use]
    pub fn new(user_id: UserId, course_id: CourseId) -> Self {
        Self {
            id: ProgressId::new(format!("progress-{course_id}")),
            user_id,
            course_id,
            completed_lesson_ids: Vec::new(),
            average_score: 0,
            next_lesson_id: None,
            last_studied_at: None,
            exam_results: ExamResults::default(),
        }
    }

    /// Completed lesson ids in first-completion order.
    #[must_use]
    pub fn completed_lesson_ids(&self) -> &[LessonId] {
        &self.completed_lesson_ids
    }

    #[must_use]
    pub fn is_completed(&self, lesson_id: &LessonId) -> bool {
        self.completed_lesson_ids.contains(lesson_id)
    }

    /// Adds a lesson to the completed set.
    ///
    /// Returns `false` if it was already present. There is no way to remove
    /// an id once added.
    pub fn mark_completed(&mut self, lesson_id: LessonId) -> bool {
        if self.is_completed(&lesson_id) {
            return false;
        }
        self.completed_lesson_ids.push(lesson_id);
        true
    }

    /// Shallow merge of the fields present in `patch`.
    ///
    /// Completed lesson ids are unioned into the existing set.
    pub fn apply_patch(&mut self, patch: ProgressPatch) {
        let ProgressPatch {
            completed_lesson_ids,
            average_score,
            next_lesson_id,
            last_studied_at,
            exam_results,
        } = patch;

        for id in completed_lesson_ids.into_iter().flatten() {
            self.mark_completed(id);
        }
        if let Some(score) = average_score {
            self.average_score = score;
        }
        if let Some(next) = next_lesson_id {
            self.next_lesson_id = Some(next);
        }
        if let Some(day) = last_studied_at {
            self.last_studied_at = Some(day);
        }
        if let Some(results) = exam_results {
            self.exam_results = results;
        }
    }
}

/// Partial update for a `Progress` record; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressPatch {
    pub completed_lesson_ids: Option<Vec<LessonId>>,
    pub average_score: Option<u32>,
    pub next_lesson_id: Option<LessonId>,
    pub last_studied_at: Option<NaiveDate>,
    pub exam_results: Option<ExamResults>,
}

impl ProgressPatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn average_score(mut self, score: u32) -> Self {
        self.average_score = Some(score);
        self
    }

    #[must_use]
    pub fn next_lesson(mut self, lesson_id: LessonId) -> Self {
        self.next_lesson_id = Some(lesson_id);
        self
    }

    #[must_use]
    pub fn last_studied_at(mut self, day: NaiveDate) -> Self {
        self.last_studied_at = Some(day);
        self
    }

    #[must_use]
    pub fn completed_lessons(mut self, ids: Vec<LessonId>) -> Self {
        self.completed_lesson_ids = Some(ids);
        self
    }

    #[must_use]
    pub fn exam_results(mut self, results: ExamResults) -> Self {
        self.exam_results = Some(results);
        self
    }
}
