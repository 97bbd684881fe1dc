use std::sync::{Arc, Mutex};

use tutor_core::Clock;
use tutor_core::model::{ChatMessage, Lesson, Locale};
use tutor_core::playback::{
    NarrationState, PlaybackController, PlaybackState, reveal_interval_for_rate,
};

use super::narrator::{Narrator, SpeechEngine};
use super::timer::{RevealTimer, SharedPlayback, with_playback};
use crate::chat::{ChatSession, ChatTutorService};
use crate::error::ChatError;

/// One open lesson: progressive theory reveal, narration and the tutor chat.
///
/// The chat stays locked until the learner starts the lesson once.
pub struct LessonView {
    lesson: Lesson,
    playback: SharedPlayback,
    timer: RevealTimer,
    narrator: Narrator,
    chat: ChatSession,
}

impl LessonView {
    #[must_use]
    pub fn new(
        lesson: Lesson,
        engine: Arc<dyn SpeechEngine>,
        tutor: Arc<ChatTutorService>,
        clock: Clock,
        locale: Locale,
    ) -> Self {
        let narrator = Narrator::new(engine, locale);
        let playback = Arc::new(Mutex::new(PlaybackController::new(lesson.theory.len())));
        let timer = RevealTimer::new(
            Arc::clone(&playback),
            reveal_interval_for_rate(narrator.state().rate()),
        );
        Self {
            lesson,
            playback,
            timer,
            narrator,
            chat: ChatSession::new(tutor, clock, locale),
        }
    }

    #[must_use]
    pub fn lesson(&self) -> &Lesson {
        &self.lesson
    }

    #[must_use]
    pub fn has_started(&self) -> bool {
        with_playback(&self.playback, |p| p.has_started())
    }

    #[must_use]
    pub fn playback_state(&self) -> PlaybackState {
        with_playback(&self.playback, |p| p.state())
    }

    #[must_use]
    pub fn visible_lines(&self) -> Vec<String> {
        with_playback(&self.playback, |p| p.visible_lines(&self.lesson.theory).to_vec())
    }

    #[must_use]
    pub fn progress_percent(&self) -> u32 {
        with_playback(&self.playback, |p| p.progress_percent())
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        with_playback(&self.playback, |p| p.is_complete())
    }

    #[must_use]
    pub fn narration(&self) -> &NarrationState {
        self.narrator.state()
    }

    #[must_use]
    pub fn timer(&self) -> &RevealTimer {
        &self.timer
    }

    #[must_use]
    pub fn chat_messages(&self) -> &[ChatMessage] {
        self.chat.messages()
    }

    #[must_use]
    pub fn chat_error(&self) -> Option<&str> {
        self.chat.last_error()
    }

    //
    // ─── PLAYBACK ──────────────────────────────────────────────────────────────
    //

    /// Starts reveal and narration. Later calls do nothing until a reset.
    pub fn start(&mut self) {
        if !with_playback(&self.playback, PlaybackController::start) {
            return;
        }
        tracing::debug!(lesson = %self.lesson.id, "lesson started");
        self.timer.start();

        let narration = self.narrator.state();
        if !narration.is_speaking() && narration.error().is_none() {
            self.speak_theory();
        }
    }

    /// Play/pause for the reveal. Starts the lesson if it has not started.
    pub fn toggle_play(&mut self) -> PlaybackState {
        if with_playback(&self.playback, |p| p.state() == PlaybackState::NotStarted) {
            self.start();
            return self.playback_state();
        }
        let state = with_playback(&self.playback, PlaybackController::toggle);
        match state {
            PlaybackState::Playing => self.timer.start(),
            _ => self.timer.stop(),
        }
        state
    }

    /// Back to the first line. Narration keeps its current state.
    pub fn reset(&mut self) {
        self.timer.stop();
        with_playback(&self.playback, PlaybackController::reset);
        self.timer.sync();
    }

    /// Swaps the lesson content, e.g. after a locale change.
    pub fn load(&mut self, lesson: Lesson) {
        self.timer.stop();
        self.narrator.stop();
        with_playback(&self.playback, |p| p.load(lesson.theory.len()));
        self.lesson = lesson;
        self.timer.sync();
    }

    pub fn set_locale(&mut self, locale: Locale, lesson: Lesson) {
        self.narrator.set_locale(locale);
        self.chat.set_locale(locale);
        self.load(lesson);
    }

    //
    // ─── NARRATION ─────────────────────────────────────────────────────────────
    //

    /// Narration rate also sets the reveal pace.
    pub fn set_rate(&mut self, rate: f32) {
        self.narrator.set_rate(rate);
        self.timer
            .set_interval(reveal_interval_for_rate(self.narrator.state().rate()));
    }

    /// Reads the theory aloud, starting the lesson first if needed.
    pub fn play_narration(&mut self) {
        if !self.has_started() {
            with_playback(&self.playback, PlaybackController::start);
            self.timer.start();
        }
        self.speak_theory();
    }

    pub fn pause_narration(&mut self) {
        self.narrator.pause();
    }

    pub fn resume_narration(&mut self) {
        self.narrator.resume();
    }

    pub fn stop_narration(&mut self) {
        self.narrator.stop();
    }

    /// Engine callback forwarded by the platform layer.
    pub fn narration_finished(&mut self) {
        self.narrator.finished();
    }

    /// Engine callback forwarded by the platform layer.
    pub fn narration_failed(&mut self) {
        self.narrator.failed();
    }

    fn speak_theory(&mut self) {
        if let Err(e) = self.narrator.speak(&self.lesson.narration_text()) {
            tracing::debug!(lesson = %self.lesson.id, error = %e, "narration unavailable");
        }
    }

    //
    // ─── CHAT ──────────────────────────────────────────────────────────────────
    //

    /// Asks the tutor a question about this lesson.
    ///
    /// # Errors
    ///
    /// Returns `ChatError::Locked` before the lesson has been started, or the
    /// error from the tutor service.
    pub async fn ask(&mut self, question: &str) -> Result<String, ChatError> {
        if !self.has_started() {
            return Err(ChatError::Locked);
        }
        self.chat.send(question).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::ChatConfig;
    use crate::lesson::narrator::SilentEngine;
    use crate::lesson::narrator::tests::RecordingEngine;
    use tutor_core::model::{CourseId, LessonId, Quiz, QuizId, QuizKind};
    use tutor_core::playback::NARRATION_UNSUPPORTED;
    use tutor_core::time::fixed_clock;

    fn lesson(lines: usize) -> Lesson {
        Lesson {
            id: LessonId::new("c1-lesson-1"),
            course_id: CourseId::new("c1"),
            title: "Intro".into(),
            summary: String::new(),
            duration_minutes: 18,
            theory: (1..=lines).map(|n| format!("line {n}")).collect(),
            examples: Vec::new(),
            exercises: Vec::new(),
            quiz: Quiz {
                id: QuizId::new("c1-lesson-1-quiz"),
                title: String::new(),
                kind: QuizKind::LessonReview,
                questions: Vec::new(),
            },
            sources: Vec::new(),
        }
    }

    fn tutor() -> Arc<ChatTutorService> {
        Arc::new(ChatTutorService::new(ChatConfig::new("http://127.0.0.1:9").unwrap()))
    }

    fn view(engine: Arc<dyn SpeechEngine>) -> LessonView {
        LessonView::new(lesson(4), engine, tutor(), fixed_clock(), Locale::En)
    }

    #[tokio::test]
    async fn chat_is_locked_until_start() {
        let mut view = view(Arc::new(SilentEngine));

        let err = view.ask("what is this?").await.unwrap_err();

        assert!(matches!(err, ChatError::Locked));
        assert_eq!(view.chat_messages().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn start_reveals_and_narrates() {
        let engine = Arc::new(RecordingEngine::default());
        let mut view = view(engine.clone());

        view.start();
        assert!(view.has_started());
        assert!(view.narration().is_speaking());
        assert!(engine.calls().iter().any(|c| c.starts_with("speak:en:1:")));

        tokio::time::sleep(std::time::Duration::from_millis(1700)).await;
        assert_eq!(view.visible_lines(), vec!["line 1".to_string(), "line 2".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_engine_does_not_block_reveal() {
        let mut view = view(Arc::new(SilentEngine));

        view.start();

        assert_eq!(view.playback_state(), PlaybackState::Playing);
        assert_eq!(view.narration().error(), Some(NARRATION_UNSUPPORTED));
        assert!(view.timer().is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn pause_stops_timer_and_reset_keeps_unlock() {
        let mut view = view(Arc::new(SilentEngine));
        view.start();

        assert_eq!(view.toggle_play(), PlaybackState::Paused);
        assert!(!view.timer().is_running());
        tokio::time::sleep(std::time::Duration::from_secs(5)).await;
        assert_eq!(view.visible_lines().len(), 1);

        view.reset();
        assert_eq!(view.playback_state(), PlaybackState::NotStarted);
        assert!(view.has_started());
        assert_eq!(view.progress_percent(), 25);
    }

    #[tokio::test(start_paused = true)]
    async fn rate_change_retimes_reveal() {
        let mut view = view(Arc::new(SilentEngine));
        view.set_rate(0.5);
        assert_eq!(view.timer().interval(), reveal_interval_for_rate(0.7));
        view.set_rate(1.5);
        assert_eq!(view.timer().interval(), std::time::Duration::from_millis(1067));
    }

    #[tokio::test(start_paused = true)]
    async fn loading_new_content_resets_reveal() {
        let mut view = view(Arc::new(SilentEngine));
        view.start();
        tokio::time::sleep(std::time::Duration::from_millis(1700)).await;

        view.load(lesson(2));

        assert_eq!(view.playback_state(), PlaybackState::NotStarted);
        assert_eq!(view.visible_lines(), vec!["line 1".to_string()]);
        assert!(!view.timer().is_running());
    }
}
