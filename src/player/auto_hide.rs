//! Inactivity timer for on-screen controls
//!
//! Runs outside the playback state machine. The host reports pointer activity
//! and status changes; visibility is published on a watch channel. Controls
//! only hide while playing. Requires a tokio runtime.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::config::PlaybackConfig;
use crate::models::PlaybackStatus;

pub struct AutoHide {
    delay: Duration,
    visible: Arc<watch::Sender<bool>>,
    status: PlaybackStatus,
    timer: Option<CancellationToken>,
}

impl AutoHide {
    pub fn new(delay: Duration) -> Self {
        let (visible, _) = watch::channel(true);
        Self {
            delay,
            visible: Arc::new(visible),
            status: PlaybackStatus::Idle,
            timer: None,
        }
    }

    pub fn from_config(config: &PlaybackConfig) -> Self {
        Self::new(config.controls_hide_delay)
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.visible.subscribe()
    }

    pub fn is_visible(&self) -> bool {
        *self.visible.borrow()
    }

    /// Track the engine status; anything but `Playing` pins controls visible
    pub fn set_status(&mut self, status: PlaybackStatus) {
        if status == self.status {
            return;
        }
        self.status = status;
        if status == PlaybackStatus::Playing {
            self.restart_timer();
        } else {
            self.cancel_timer();
            self.visible.send_replace(true);
        }
    }

    /// Pointer moved over the player
    pub fn activity(&mut self) {
        self.visible.send_replace(true);
        if self.status == PlaybackStatus::Playing {
            self.restart_timer();
        }
    }

    /// Pointer left the player; hides at once while playing
    pub fn pointer_left(&mut self) {
        if self.status == PlaybackStatus::Playing {
            self.cancel_timer();
            self.visible.send_replace(false);
        }
    }

    fn restart_timer(&mut self) {
        self.cancel_timer();

        let token = CancellationToken::new();
        let child = token.clone();
        let visible = Arc::clone(&self.visible);
        let delay = self.delay;
        let deadline = tokio::time::Instant::now() + delay;
        tokio::spawn(async move {
            tokio::select! {
                _ = child.cancelled() => {}
                _ = tokio::time::sleep_until(deadline) => {
                    trace!("Hiding controls after {:?} of inactivity", delay);
                    visible.send_replace(false);
                }
            }
        });
        self.timer = Some(token);
    }

    fn cancel_timer(&mut self) {
        if let Some(token) = self.timer.take() {
            token.cancel();
        }
    }
}

impl Drop for AutoHide {
    fn drop(&mut self) {
        self.cancel_timer();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn settle() {
        // Let the spawned timer task observe the advanced clock.
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn hides_after_delay_while_playing() {
        let mut hide = AutoHide::new(Duration::from_secs(3));
        hide.set_status(PlaybackStatus::Playing);
        assert!(hide.is_visible());

        tokio::time::advance(Duration::from_millis(2900)).await;
        settle().await;
        assert!(hide.is_visible());

        tokio::time::advance(Duration::from_millis(200)).await;
        settle().await;
        assert!(!hide.is_visible());
    }

    #[tokio::test(start_paused = true)]
    async fn activity_resets_the_timer() {
        let mut hide = AutoHide::new(Duration::from_secs(3));
        hide.set_status(PlaybackStatus::Playing);

        tokio::time::advance(Duration::from_secs(2)).await;
        settle().await;
        hide.activity();

        tokio::time::advance(Duration::from_secs(2)).await;
        settle().await;
        assert!(hide.is_visible());

        tokio::time::advance(Duration::from_millis(1100)).await;
        settle().await;
        assert!(!hide.is_visible());

        hide.activity();
        assert!(hide.is_visible());
    }

    #[tokio::test(start_paused = true)]
    async fn stays_visible_unless_playing() {
        let mut hide = AutoHide::new(Duration::from_secs(3));
        for status in [
            PlaybackStatus::Paused,
            PlaybackStatus::Buffering,
            PlaybackStatus::Error,
        ] {
            hide.set_status(status);
            hide.activity();
            tokio::time::advance(Duration::from_secs(10)).await;
            settle().await;
            assert!(hide.is_visible(), "hidden while {status:?}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn subscribers_see_visibility_changes() {
        let mut hide = AutoHide::from_config(&PlaybackConfig::default());
        let mut rx = hide.subscribe();
        hide.set_status(PlaybackStatus::Playing);

        tokio::time::advance(Duration::from_secs(3)).await;
        settle().await;
        assert!(rx.has_changed().unwrap());
        assert!(!*rx.borrow_and_update());
    }

    #[tokio::test(start_paused = true)]
    async fn pausing_reveals_hidden_controls() {
        let mut hide = AutoHide::new(Duration::from_secs(3));
        hide.set_status(PlaybackStatus::Playing);
        hide.pointer_left();
        assert!(!hide.is_visible());

        hide.set_status(PlaybackStatus::Paused);
        assert!(hide.is_visible());

        hide.pointer_left();
        assert!(hide.is_visible());
    }
}
