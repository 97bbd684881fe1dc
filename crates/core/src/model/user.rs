use serde::{Deserialize, Serialize};

use crate::model::ids::{CourseId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Role {
    #[default]
    Learner,
    Instructor,
    Admin,
}

/// Learner profile. The mastery engine reads it but never edits it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub enrolled_course_ids: Vec<CourseId>,
    #[serde(default)]
    pub badges: Vec<String>,
    #[serde(default)]
    pub rank: u32,
    #[serde(default)]
    pub streak_days: u32,
    #[serde(default)]
    pub avatar_color: String,
}

impl User {
    #[must_use]
    pub fn is_enrolled(&self, course_id: &CourseId) -> bool {
        self.enrolled_course_ids.contains(course_id)
    }
}
