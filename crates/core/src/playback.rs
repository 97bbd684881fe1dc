//! Lesson playback: progressive reveal of theory lines and narration flags.

use std::time::Duration;

/// Reveal interval when no narration rate is involved.
pub const DEFAULT_REVEAL_INTERVAL: Duration = Duration::from_millis(1400);

/// Base interval scaled by the narration rate in lesson view.
pub const NARRATED_REVEAL_BASE_MS: f64 = 1600.0;

pub const MIN_NARRATION_RATE: f32 = 0.7;
pub const MAX_NARRATION_RATE: f32 = 1.5;

/// Reveal interval that keeps text roughly in step with narration speed.
///
/// Rates below `MIN_NARRATION_RATE` are treated as the minimum.
#[must_use]
pub fn reveal_interval_for_rate(rate: f32) -> Duration {
    let rate = f64::from(rate.max(MIN_NARRATION_RATE));
    Duration::from_millis((NARRATED_REVEAL_BASE_MS / rate).round() as u64)
}

//
// ─── PLAYBACK ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    NotStarted,
    Playing,
    Paused,
    Complete,
}

/// Progressive reveal over a fixed list of lines.
///
/// The visible counter starts at 1 and only grows until a reset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackController {
    line_count: usize,
    visible: usize,
    state: PlaybackState,
    has_started: bool,
}

impl PlaybackController {
    #[must_use]
    pub fn new(line_count: usize) -> Self {
        Self {
            line_count,
            visible: 1,
            state: PlaybackState::NotStarted,
            has_started: false,
        }
    }

    #[must_use]
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Session-local signal that the learner pressed start at least once.
    #[must_use]
    pub fn has_started(&self) -> bool {
        self.has_started
    }

    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.visible >= self.line_count
    }

    /// Number of lines currently shown, never more than the content length.
    #[must_use]
    pub fn visible_count(&self) -> usize {
        self.visible.min(self.line_count)
    }

    #[must_use]
    pub fn visible_lines<'a>(&self, lines: &'a [String]) -> &'a [String] {
        &lines[..self.visible_count().min(lines.len())]
    }

    #[must_use]
    pub fn progress_percent(&self) -> u32 {
        let denom = self.line_count.max(1) as f64;
        ((self.visible as f64 / denom) * 100.0).round().min(100.0) as u32
    }

    /// `NotStarted -> Playing`. Returns `true` when this call started playback.
    pub fn start(&mut self) -> bool {
        if self.state != PlaybackState::NotStarted {
            return false;
        }
        self.has_started = true;
        self.state = if self.is_complete() {
            PlaybackState::Complete
        } else {
            PlaybackState::Playing
        };
        true
    }

    /// Toggles between playing and paused, starting playback on first use.
    pub fn toggle(&mut self) -> PlaybackState {
        match self.state {
            PlaybackState::NotStarted => {
                self.start();
            }
            PlaybackState::Playing => self.state = PlaybackState::Paused,
            PlaybackState::Paused => self.state = PlaybackState::Playing,
            PlaybackState::Complete => {}
        }
        self.state
    }

    pub fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            self.state = PlaybackState::Paused;
        }
    }

    pub fn resume(&mut self) {
        if self.state == PlaybackState::Paused {
            self.state = PlaybackState::Playing;
        }
    }

    /// Reveals one more line while playing. Returns the resulting state.
    pub fn tick(&mut self) -> PlaybackState {
        if self.state != PlaybackState::Playing {
            return self.state;
        }
        if self.visible < self.line_count {
            self.visible += 1;
        }
        if self.is_complete() {
            self.state = PlaybackState::Complete;
        }
        self.state
    }

    /// Back to the first line. Narration is not restarted.
    pub fn reset(&mut self) {
        self.visible = 1;
        self.state = PlaybackState::NotStarted;
    }

    /// Swaps in new content (e.g. after a locale change) and resets.
    pub fn load(&mut self, line_count: usize) {
        self.line_count = line_count;
        self.reset();
    }
}

//
// ─── NARRATION ─────────────────────────────────────────────────────────────────
//

pub const NARRATION_UNSUPPORTED: &str = "Speech synthesis is not supported.";
pub const NARRATION_FAILED: &str = "Speech synthesis failed.";

/// Flags mirrored from the external speech engine's callbacks.
#[derive(Debug, Clone, PartialEq)]
pub struct NarrationState {
    is_speaking: bool,
    is_paused: bool,
    rate: f32,
    error: Option<String>,
}

impl Default for NarrationState {
    fn default() -> Self {
        Self {
            is_speaking: false,
            is_paused: false,
            rate: 1.0,
            error: None,
        }
    }
}

impl NarrationState {
    #[must_use]
    pub fn is_speaking(&self) -> bool {
        self.is_speaking
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.is_paused
    }

    #[must_use]
    pub fn rate(&self) -> f32 {
        self.rate
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Clamps to the supported range; non-finite input keeps the old rate.
    pub fn set_rate(&mut self, rate: f32) {
        if rate.is_finite() {
            self.rate = rate.clamp(MIN_NARRATION_RATE, MAX_NARRATION_RATE);
        }
    }

    pub fn on_start(&mut self) {
        self.is_speaking = true;
        self.is_paused = false;
        self.error = None;
    }

    pub fn on_end(&mut self) {
        self.is_speaking = false;
        self.is_paused = false;
    }

    pub fn on_error(&mut self, message: impl Into<String>) {
        self.is_speaking = false;
        self.is_paused = false;
        self.error = Some(message.into());
    }

    pub fn on_pause(&mut self) {
        self.is_paused = true;
    }

    pub fn on_resume(&mut self) {
        self.is_paused = false;
    }

    /// Clears both flags together.
    pub fn stop(&mut self) {
        self.is_speaking = false;
        self.is_paused = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_then_ticks_complete() {
        let mut playback = PlaybackController::new(3);
        assert_eq!(playback.tick(), PlaybackState::NotStarted);
        assert!(playback.start());
        assert!(!playback.start());

        assert_eq!(playback.tick(), PlaybackState::Playing);
        assert_eq!(playback.visible_count(), 2);
        assert_eq!(playback.tick(), PlaybackState::Complete);
        assert_eq!(playback.visible_count(), 3);
        assert_eq!(playback.progress_percent(), 100);
        assert_eq!(playback.tick(), PlaybackState::Complete);
    }

    #[test]
    fn paused_playback_does_not_reveal() {
        let mut playback = PlaybackController::new(4);
        playback.start();
        assert_eq!(playback.toggle(), PlaybackState::Paused);
        playback.tick();
        assert_eq!(playback.visible_count(), 1);
        assert_eq!(playback.toggle(), PlaybackState::Playing);
        playback.tick();
        assert_eq!(playback.visible_count(), 2);
    }

    #[test]
    fn toggle_starts_playback_from_not_started() {
        let mut playback = PlaybackController::new(2);
        assert_eq!(playback.toggle(), PlaybackState::Playing);
        assert!(playback.has_started());
    }

    #[test]
    fn reset_returns_to_first_line_but_remembers_start() {
        let mut playback = PlaybackController::new(3);
        playback.start();
        playback.tick();
        playback.reset();

        assert_eq!(playback.state(), PlaybackState::NotStarted);
        assert_eq!(playback.visible_count(), 1);
        assert!(playback.has_started());
        assert_eq!(playback.progress_percent(), 33);
    }

    #[test]
    fn single_line_content_completes_on_start() {
        let mut playback = PlaybackController::new(1);
        playback.start();
        assert_eq!(playback.state(), PlaybackState::Complete);
    }

    #[test]
    fn empty_content_does_not_divide_by_zero() {
        let playback = PlaybackController::new(0);
        assert_eq!(playback.visible_count(), 0);
        assert_eq!(playback.progress_percent(), 100);
        assert!(playback.visible_lines(&[]).is_empty());
    }

    #[test]
    fn reveal_interval_scales_with_rate() {
        assert_eq!(reveal_interval_for_rate(1.0), Duration::from_millis(1600));
        assert_eq!(reveal_interval_for_rate(0.1), reveal_interval_for_rate(0.7));
        assert!(reveal_interval_for_rate(1.5) < Duration::from_millis(1100));
    }

    #[test]
    fn narration_error_resets_flags() {
        let mut narration = NarrationState::default();
        narration.on_start();
        narration.on_pause();
        narration.on_error(NARRATION_FAILED);

        assert!(!narration.is_speaking());
        assert!(!narration.is_paused());
        assert_eq!(narration.error(), Some(NARRATION_FAILED));

        narration.on_start();
        assert_eq!(narration.error(), None);
    }

    #[test]
    fn stop_clears_speaking_and_paused() {
        let mut narration = NarrationState::default();
        narration.on_start();
        narration.on_pause();
        narration.stop();
        assert!(!narration.is_speaking());
        assert!(!narration.is_paused());
    }

    #[test]
    fn rate_is_clamped() {
        let mut narration = NarrationState::default();
        narration.set_rate(3.0);
        assert_eq!(narration.rate(), MAX_NARRATION_RATE);
        narration.set_rate(f32::NAN);
        assert_eq!(narration.rate(), MAX_NARRATION_RATE);
    }
}
