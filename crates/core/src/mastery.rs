//! Learner state and the transitions that move it forward.
//!
//! Every operation takes `&mut LearnerState` and finishes the whole update
//! before returning, so a caller holding the state behind a lock publishes
//! either the old state or the new one, never a mix.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    Attempt, CourseId, ExerciseSubmission, LessonId, LessonProgress, Progress, ProgressPatch,
    QuizId, User,
};

/// Minimum raw quiz score (0-100 scale) that counts a lesson as completed.
pub const COMPLETION_THRESHOLD: u32 = 70;

/// Whether a raw score meets the completion threshold.
///
/// The score is compared as given; `max_score` plays no part.
#[must_use]
pub fn is_passing(score: u32) -> bool {
    score >= COMPLETION_THRESHOLD
}

/// Running average where each new score carries half the weight.
///
/// Rounds halves up, so `rolling_average(80, 61) == 71`.
#[must_use]
pub fn rolling_average(previous: u32, score: u32) -> u32 {
    let sum = u64::from(previous) + u64::from(score);
    u32::try_from(sum.div_ceil(2)).unwrap_or(u32::MAX)
}

/// Quiz submission as handed to `record_quiz_score`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizSubmission {
    pub course_id: CourseId,
    pub lesson_id: LessonId,
    pub quiz_id: QuizId,
    pub score: u32,
    pub max_score: u32,
}

/// What changed as a result of one quiz submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizOutcome {
    pub attempt: Attempt,
    pub passed: bool,
    /// `true` only when this submission added the lesson to the completed set.
    pub newly_completed: bool,
    /// Course average after the update, `None` if no course record matched.
    pub average_score: Option<u32>,
}

/// Everything the mastery engine owns for a single learner.
///
/// This is also the persisted snapshot: field names follow the stored layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearnerState {
    pub progress: Vec<Progress>,
    pub attempts: Vec<Attempt>,
    pub lesson_progress: BTreeMap<LessonId, LessonProgress>,
    pub active_course_id: Option<CourseId>,
    pub user: User,
}

impl LearnerState {
    #[must_use]
    pub fn new(user: User, progress: Vec<Progress>, attempts: Vec<Attempt>) -> Self {
        Self {
            progress,
            attempts,
            lesson_progress: BTreeMap::new(),
            active_course_id: None,
            user,
        }
    }

    #[must_use]
    pub fn progress_for(&self, course_id: &CourseId) -> Option<&Progress> {
        self.progress.iter().find(|record| &record.course_id == course_id)
    }

    fn progress_for_mut(&mut self, course_id: &CourseId) -> Option<&mut Progress> {
        self.progress
            .iter_mut()
            .find(|record| &record.course_id == course_id)
    }

    #[must_use]
    pub fn lesson(&self, lesson_id: &LessonId) -> Option<&LessonProgress> {
        self.lesson_progress.get(lesson_id)
    }

    /// Attempts recorded for a quiz, oldest first.
    pub fn attempts_for<'a>(&'a self, quiz_id: &'a QuizId) -> impl Iterator<Item = &'a Attempt> {
        self.attempts
            .iter()
            .filter(move |attempt| &attempt.quiz_id == quiz_id)
    }

    pub fn set_active_course(&mut self, course_id: CourseId) {
        self.active_course_id = Some(course_id);
    }

    /// Merges `patch` into the course's record.
    ///
    /// Returns `false` when no record matches, in which case nothing changes.
    pub fn update_progress(&mut self, course_id: &CourseId, patch: ProgressPatch) -> bool {
        match self.progress_for_mut(course_id) {
            Some(record) => {
                record.apply_patch(patch);
                true
            }
            None => false,
        }
    }

    pub fn add_attempt(&mut self, attempt: Attempt) {
        self.attempts.push(attempt);
    }

    /// Replaces the lesson's exercise submissions, keeping its quiz fields.
    pub fn record_exercises(&mut self, lesson_id: LessonId, submissions: Vec<ExerciseSubmission>) {
        self.lesson_progress
            .entry(lesson_id.clone())
            .or_insert_with(|| LessonProgress::new(lesson_id))
            .exercises = submissions;
    }

    /// Applies one quiz submission to history, lesson record and course record.
    ///
    /// The lesson record is rebuilt from the submission: a failing score after
    /// an earlier pass leaves `completed_at` unset, while the course keeps the
    /// lesson in its completed set.
    pub fn record_quiz_score(&mut self, submission: QuizSubmission, now: DateTime<Utc>) -> QuizOutcome {
        let QuizSubmission {
            course_id,
            lesson_id,
            quiz_id,
            score,
            max_score,
        } = submission;
        let passed = is_passing(score);

        let attempt = Attempt::for_lesson(&lesson_id, quiz_id, score, max_score, now);

        let exercises = self
            .lesson_progress
            .remove(&lesson_id)
            .map(|prior| prior.exercises)
            .unwrap_or_default();
        let lesson_record = LessonProgress {
            lesson_id: lesson_id.clone(),
            exercises,
            quiz_score: Some(score),
            quiz_max_score: Some(max_score),
            completed_at: passed.then_some(now),
        };

        let mut newly_completed = false;
        let mut average_score = None;
        if let Some(record) = self.progress_for_mut(&course_id) {
            if passed {
                newly_completed = record.mark_completed(lesson_id.clone());
            }
            record.average_score = rolling_average(record.average_score, score);
            record.last_studied_at = Some(now.date_naive());
            average_score = Some(record.average_score);
        }

        self.attempts.push(attempt.clone());
        self.lesson_progress.insert(lesson_id, lesson_record);

        QuizOutcome {
            attempt,
            passed,
            newly_completed,
            average_score,
        }
    }
}
