use std::sync::Arc;

use tutor_core::model::Locale;
use tutor_core::playback::{NARRATION_FAILED, NARRATION_UNSUPPORTED, NarrationState};

use crate::error::NarrationError;

/// Platform speech synthesis.
///
/// `speak` queues an utterance; the engine reports progress back through
/// `Narrator::finished` and `Narrator::failed`.
pub trait SpeechEngine: Send + Sync {
    fn is_supported(&self) -> bool;

    /// # Errors
    ///
    /// Returns `NarrationError::Engine` if the utterance could not be queued.
    fn speak(&self, text: &str, rate: f32, locale: Locale) -> Result<(), NarrationError>;

    fn pause(&self);

    fn resume(&self);

    fn cancel(&self);
}

/// Engine for environments without speech output.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentEngine;

impl SpeechEngine for SilentEngine {
    fn is_supported(&self) -> bool {
        false
    }

    fn speak(&self, _text: &str, _rate: f32, _locale: Locale) -> Result<(), NarrationError> {
        Err(NarrationError::Unsupported)
    }

    fn pause(&self) {}

    fn resume(&self) {}

    fn cancel(&self) {}
}

/// Keeps `NarrationState` in step with a `SpeechEngine`.
pub struct Narrator {
    engine: Arc<dyn SpeechEngine>,
    state: NarrationState,
    locale: Locale,
}

impl Narrator {
    #[must_use]
    pub fn new(engine: Arc<dyn SpeechEngine>, locale: Locale) -> Self {
        Self {
            engine,
            state: NarrationState::default(),
            locale,
        }
    }

    #[must_use]
    pub fn state(&self) -> &NarrationState {
        &self.state
    }

    pub fn set_locale(&mut self, locale: Locale) {
        self.locale = locale;
    }

    /// Applies to the next utterance.
    pub fn set_rate(&mut self, rate: f32) {
        self.state.set_rate(rate);
    }

    /// Cancels anything in flight and reads `text` aloud.
    ///
    /// # Errors
    ///
    /// Returns `NarrationError::Unsupported` without an engine,
    /// `NarrationError::EmptyText` for blank text, and the engine's error if
    /// it refuses the utterance. Engine errors also land in `state().error()`.
    pub fn speak(&mut self, text: &str) -> Result<(), NarrationError> {
        if !self.engine.is_supported() {
            self.state.on_error(NARRATION_UNSUPPORTED);
            return Err(NarrationError::Unsupported);
        }
        if text.trim().is_empty() {
            return Err(NarrationError::EmptyText);
        }

        self.stop();
        match self.engine.speak(text, self.state.rate(), self.locale) {
            Ok(()) => {
                self.state.on_start();
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "narration failed to start");
                self.state.on_error(NARRATION_FAILED);
                Err(e)
            }
        }
    }

    pub fn pause(&mut self) {
        if self.state.is_speaking() && !self.state.is_paused() {
            self.engine.pause();
            self.state.on_pause();
        }
    }

    pub fn resume(&mut self) {
        if self.state.is_paused() {
            self.engine.resume();
            self.state.on_resume();
        }
    }

    pub fn stop(&mut self) {
        if self.engine.is_supported() {
            self.engine.cancel();
        }
        self.state.stop();
    }

    /// Engine callback: the utterance reached its end.
    pub fn finished(&mut self) {
        self.state.on_end();
    }

    /// Engine callback: the utterance broke off.
    pub fn failed(&mut self) {
        self.state.on_error(NARRATION_FAILED);
    }
}

impl Drop for Narrator {
    fn drop(&mut self) {
        self.stop();
    }
}
