use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{CourseId, ExerciseId, LessonId, QuizId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("question {question_id} has no options")]
    NoOptions { question_id: String },

    #[error("question {question_id}: answer index {index} is out of range for {len} options")]
    AnswerIndexOutOfRange {
        question_id: String,
        index: usize,
        len: usize,
    },
}

//
// ─── TAGS ──────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CourseCategory {
    Programming,
    Languages,
    #[serde(rename = "School subjects")]
    SchoolSubjects,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExerciseKind {
    ShortAnswer,
    Practice,
    Quiz,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuizKind {
    LessonReview,
    MidCourse,
    Final,
}

//
// ─── EXERCISES ─────────────────────────────────────────────────────────────────
//

/// Static prompt definition attached to a lesson.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exercise {
    pub id: ExerciseId,
    pub prompt: String,
    #[serde(rename = "type")]
    pub kind: ExerciseKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

//
// ─── QUIZZES ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuizQuestionRecord {
    id: String,
    prompt: String,
    options: Vec<String>,
    answer_index: usize,
    explanation: String,
}

/// A multiple choice question whose correct option is always in range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "QuizQuestionRecord")]
pub struct QuizQuestion {
    id: String,
    prompt: String,
    options: Vec<String>,
    answer_index: usize,
    explanation: String,
}

impl QuizQuestion {
    /// Creates a validated question.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NoOptions` for an empty option list and
    /// `QuizError::AnswerIndexOutOfRange` when `answer_index >= options.len()`.
    pub fn new(
        id: impl Into<String>,
        prompt: impl Into<String>,
        options: Vec<String>,
        answer_index: usize,
        explanation: impl Into<String>,
    ) -> Result<Self, QuizError> {
        let id = id.into();
        if options.is_empty() {
            return Err(QuizError::NoOptions { question_id: id });
        }
        if answer_index >= options.len() {
            return Err(QuizError::AnswerIndexOutOfRange {
                question_id: id,
                index: answer_index,
                len: options.len(),
            });
        }
        Ok(Self {
            id,
            prompt: prompt.into(),
            options,
            answer_index,
            explanation: explanation.into(),
        })
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn answer_index(&self) -> usize {
        self.answer_index
    }

    #[must_use]
    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    #[must_use]
    pub fn is_correct(&self, selected: usize) -> bool {
        selected == self.answer_index
    }
}

impl TryFrom<QuizQuestionRecord> for QuizQuestion {
    type Error = QuizError;

    fn try_from(record: QuizQuestionRecord) -> Result<Self, Self::Error> {
        Self::new(
            record.id,
            record.prompt,
            record.options,
            record.answer_index,
            record.explanation,
        )
    }
}

/// Result of grading a set of selected options against a quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizGrade {
    pub correct: u32,
    pub total: u32,
}

impl QuizGrade {
    /// Score on the 0-100 scale used by the completion threshold.
    #[must_use]
    pub fn percent(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        (f64::from(self.correct) / f64::from(self.total) * 100.0).round() as u32
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quiz {
    pub id: QuizId,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: QuizKind,
    pub questions: Vec<QuizQuestion>,
}

impl Quiz {
    /// Grades the selected options keyed by question id.
    ///
    /// Unanswered questions count as wrong.
    #[must_use]
    pub fn grade(&self, answers: &HashMap<String, usize>) -> QuizGrade {
        let correct = self
            .questions
            .iter()
            .filter(|q| answers.get(q.id()).is_some_and(|sel| q.is_correct(*sel)))
            .count();
        QuizGrade {
            correct: u32::try_from(correct).unwrap_or(u32::MAX),
            total: u32::try_from(self.questions.len()).unwrap_or(u32::MAX),
        }
    }
}

//
// ─── LESSONS & COURSES ─────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub id: LessonId,
    pub course_id: CourseId,
    pub title: String,
    pub summary: String,
    pub duration_minutes: u32,
    pub theory: Vec<String>,
    pub examples: Vec<String>,
    pub exercises: Vec<Exercise>,
    pub quiz: Quiz,
    pub sources: Vec<String>,
}

impl Lesson {
    /// Theory lines joined into a single narration script.
    #[must_use]
    pub fn narration_text(&self) -> String {
        self.theory.join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: CourseId,
    pub title: String,
    pub category: CourseCategory,
    pub level: String,
    pub description: String,
    pub tags: Vec<String>,
    pub lessons: Vec<Lesson>,
    pub mid_course_exam: Quiz,
    pub final_exam: Quiz,
    pub total_lessons: u32,
    pub estimated_hours: u32,
}

impl Course {
    #[must_use]
    pub fn lesson(&self, id: &LessonId) -> Option<&Lesson> {
        self.lessons.iter().find(|lesson| &lesson.id == id)
    }
}

/// Finds a course by id in a catalog slice.
#[must_use]
pub fn find_course<'a>(courses: &'a [Course], id: &CourseId) -> Option<&'a Course> {
    courses.iter().find(|course| &course.id == id)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub id: String,
    pub name: String,
    pub points: u32,
}
