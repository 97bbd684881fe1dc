use serde::Serialize;

use crate::mastery::LearnerState;
use crate::model::{Course, CourseId, Progress, find_course};

/// Presentation-ready completion summary for one course.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct CourseProgress {
    pub percentage: u32,
    pub completed: u32,
    pub total: u32,
}

/// Computes the completion summary for `course_id`.
///
/// Pure: the same catalog and records always produce the same value.
/// A course without lessons reports 0%.
#[must_use]
pub fn project_course(courses: &[Course], progress: &[Progress], course_id: &CourseId) -> CourseProgress {
    let total = find_course(courses, course_id).map_or(0, |course| course.lessons.len());
    let completed = progress
        .iter()
        .find(|record| &record.course_id == course_id)
        .map_or(0, |record| record.completed_lesson_ids().len());

    let percentage = if total == 0 {
        0
    } else {
        ((completed as f64 / total as f64) * 100.0).round() as u32
    };

    CourseProgress {
        percentage,
        completed: u32::try_from(completed).unwrap_or(u32::MAX),
        total: u32::try_from(total).unwrap_or(u32::MAX),
    }
}

/// Aggregate numbers for the learner's dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardSummary {
    pub enrolled_courses: u32,
    pub completed_lessons: u32,
    /// Mean of the per-course averages, rounded; 0 with no records.
    pub average_score: u32,
    pub attempts: u32,
    pub courses: Vec<(CourseId, CourseProgress)>,
}

#[must_use]
pub fn dashboard(courses: &[Course], state: &LearnerState) -> DashboardSummary {
    let enrolled = &state.user.enrolled_course_ids;
    let per_course: Vec<(CourseId, CourseProgress)> = enrolled
        .iter()
        .map(|id| (id.clone(), project_course(courses, &state.progress, id)))
        .collect();

    let completed_lessons = state
        .progress
        .iter()
        .map(|record| record.completed_lesson_ids().len())
        .sum::<usize>();

    let average_score = if state.progress.is_empty() {
        0
    } else {
        let sum: u64 = state.progress.iter().map(|r| u64::from(r.average_score)).sum();
        let count = state.progress.len() as u64;
        u32::try_from((sum + count / 2) / count).unwrap_or(u32::MAX)
    };

    DashboardSummary {
        enrolled_courses: u32::try_from(enrolled.len()).unwrap_or(u32::MAX),
        completed_lessons: u32::try_from(completed_lessons).unwrap_or(u32::MAX),
        average_score,
        attempts: u32::try_from(state.attempts.len()).unwrap_or(u32::MAX),
        courses: per_course,
    }
}
