#![forbid(unsafe_code)]

pub mod auth;
pub mod error;
pub mod mastery;
pub mod model;
pub mod playback;
pub mod projection;
pub mod time;

pub use error::Error;
pub use mastery::{COMPLETION_THRESHOLD, LearnerState, QuizOutcome, QuizSubmission};
pub use projection::{CourseProgress, DashboardSummary};
pub use time::Clock;
