//! Lesson viewing: timed reveal, narration and the chat gate.

mod narrator;
mod timer;
mod view;

pub use narrator::{Narrator, SilentEngine, SpeechEngine};
pub use timer::{RevealTimer, SharedPlayback};
pub use view::LessonView;
