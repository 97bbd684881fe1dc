use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use tutor_core::playback::{PlaybackController, PlaybackState};

/// Shared handle to a lesson's reveal state.
pub type SharedPlayback = Arc<Mutex<PlaybackController>>;

/// Drives `PlaybackController::tick` on a fixed interval.
///
/// At most one task runs at a time. It stops by itself once playback leaves
/// `Playing`, and is aborted by `stop`, by `set_interval` and on drop.
pub struct RevealTimer {
    playback: SharedPlayback,
    interval: Duration,
    task: Option<JoinHandle<()>>,
    revealed: watch::Sender<usize>,
}

impl RevealTimer {
    #[must_use]
    pub fn new(playback: SharedPlayback, interval: Duration) -> Self {
        let visible = with_playback(&playback, |p| p.visible_count());
        let (revealed, _) = watch::channel(visible);
        Self {
            playback,
            interval,
            task: None,
            revealed,
        }
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Visible line count after each tick.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<usize> {
        self.revealed.subscribe()
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Spawns the tick task if playback is `Playing` and none is running.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self) {
        if self.is_running() {
            return;
        }
        if !with_playback(&self.playback, |p| p.is_playing()) {
            return;
        }

        let playback = Arc::clone(&self.playback);
        let revealed = self.revealed.clone();
        let period = self.interval;
        self.task = Some(tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let (state, visible) = with_playback(&playback, |p| (p.tick(), p.visible_count()));
                revealed.send_replace(visible);
                if state != PlaybackState::Playing {
                    tracing::debug!(?state, visible, "reveal timer finished");
                    break;
                }
            }
        }));
    }

    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    /// Restarts a running timer with the new period.
    pub fn set_interval(&mut self, interval: Duration) {
        if interval == self.interval {
            return;
        }
        self.interval = interval;
        if self.is_running() {
            self.stop();
            self.start();
        }
    }

    /// Publishes the current count after an out-of-band change such as reset.
    pub fn sync(&self) {
        let visible = with_playback(&self.playback, |p| p.visible_count());
        self.revealed.send_replace(visible);
    }
}

impl Drop for RevealTimer {
    fn drop(&mut self) {
        self.stop();
    }
}

pub(crate) fn with_playback<T>(playback: &SharedPlayback, f: impl FnOnce(&mut PlaybackController) -> T) -> T {
    let mut guard = playback.lock().unwrap_or_else(PoisonError::into_inner);
    f(&mut guard)
}
