mod attempt;
pub mod catalog;
mod chat;
mod ids;
mod locale;
mod progress;
mod user;

pub use attempt::Attempt;
pub use catalog::{
    Course, CourseCategory, Exercise, ExerciseKind, LeaderboardEntry, Lesson, Quiz, QuizError,
    QuizGrade, QuizKind, QuizQuestion, find_course,
};
pub use chat::{ChatMessage, ChatRole, ChatTranscript};
pub use ids::{AttemptId, CourseId, ExerciseId, LessonId, ProgressId, QuizId, UserId};
pub use locale::{Locale, LocaleError};
pub use progress::{ExamResults, ExerciseSubmission, LessonProgress, Progress, ProgressPatch};
pub use user::{Role, User};
