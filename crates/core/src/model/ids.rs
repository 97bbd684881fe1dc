use serde::{Deserialize, Serialize};
use std::fmt;

/// Declares a string-backed identifier.
///
/// Catalog ids are slugs (`python-basics-lesson-1`), so every id wraps a
/// `String` and serializes transparently.
macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new id from anything string-like.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the underlying string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({:?})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// Unique identifier for a Course
    CourseId
);
string_id!(
    /// Unique identifier for a Lesson
    LessonId
);
string_id!(
    /// Unique identifier for an Exercise
    ExerciseId
);
string_id!(
    /// Unique identifier for a Quiz or exam
    QuizId
);
string_id!(
    /// Unique identifier for a quiz Attempt
    AttemptId
);
string_id!(
    /// Unique identifier for a User
    UserId
);
string_id!(
    /// Unique identifier for a course Progress record
    ProgressId
);

// ─── Tests ─────────────────────────────────────────────────────────────────────
