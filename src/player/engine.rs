/*!
 * Playback Strategy Engine
 * ========================
 *
 * Owns the playback session and at most one live strategy instance. Every
 * input (sink signals, adaptive engine signals, UI commands) arrives as a
 * `PlayerEvent` and is applied in arrival order by `handle_event`.
 *
 * Fallback graph (each edge at most once per session):
 *
 * ```text
 *     Adaptive --fatal--> Native     only while Native has not been attempted
 *     Native  --error--> Adaptive    only while Adaptive has not been attempted and the
 *                                    URL carries an HLS marker or the sink reports a
 *                                    format/decode failure
 * ```
 *
 * The format/decode case covers manifests served from URLs without a marker,
 * so such a URL still gets one adaptive attempt before the session fails.
 * A missing adaptive engine counts as an adaptive fatal: it falls back to
 * Native only when Native has not run yet.
 *
 * Anything else ends in `Error` with a human-readable message. `Retry` clears
 * both attempt flags and classifies the URL again.
 *
 * Switching strategy, presenting a new URL and teardown all release the
 * current instance before a new one is created. Each release bumps the attempt
 * counter so adaptive events from a released instance are dropped.
 */

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::controls::{ControlCommand, InputFocus, Key, KeyBindings};
use super::events::{AdaptiveEvent, MediaEvent, PlayerEvent};
use super::sink::MediaSink;
use super::strategy::{AdaptiveBinding, AdaptiveEngineFactory, StrategyInstance};
use crate::config::PlaybackConfig;
use crate::errors::{AppResult, MediaErrorKind, PlaybackError};
use crate::models::{PlaybackSession, PlaybackStatus, StrategyKind};
use crate::streaming::{PlaybackRoute, StreamClassifier, is_adaptive_url};
use crate::utils::UrlUtils;

/// Message shown once every strategy for a URL has failed
pub const STREAM_FAILED_MESSAGE: &str =
    "Failed to load stream. The channel may be offline or the format is unsupported.";

/// What the UI renders
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlaybackSnapshot {
    pub session: Option<PlaybackSession>,
    /// Set when the presented URL is rendered by the external viewer
    pub embedded_viewer_url: Option<String>,
    pub progress_percent: f64,
    pub fullscreen: bool,
    pub picture_in_picture: bool,
}

pub struct PlaybackEngine {
    classifier: StreamClassifier,
    factory: Arc<dyn AdaptiveEngineFactory>,
    bindings: KeyBindings,
    sink: Option<Box<dyn MediaSink>>,
    session: Option<PlaybackSession>,
    instance: Option<StrategyInstance>,
    attempt: u64,
    volume: f64,
    muted: bool,
    fullscreen: bool,
    picture_in_picture: bool,
    events_tx: mpsc::UnboundedSender<PlayerEvent>,
    events_rx: mpsc::UnboundedReceiver<PlayerEvent>,
    snapshot_tx: watch::Sender<PlaybackSnapshot>,
}

impl PlaybackEngine {
    pub fn new(
        classifier: StreamClassifier,
        factory: Arc<dyn AdaptiveEngineFactory>,
        config: &PlaybackConfig,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, _) = watch::channel(PlaybackSnapshot::default());
        Self {
            classifier,
            factory,
            bindings: KeyBindings::new(config.seek_step.as_secs_f64()),
            sink: None,
            session: None,
            instance: None,
            attempt: 0,
            volume: 1.0,
            muted: false,
            fullscreen: false,
            picture_in_picture: false,
            events_tx,
            events_rx,
            snapshot_tx,
        }
    }

    /// Install the output sink. Any current session is torn down first.
    pub fn attach_sink(&mut self, sink: Box<dyn MediaSink>) {
        self.teardown();
        self.sink = Some(sink);
    }

    /// Sender for sink signals and UI commands
    pub fn event_sender(&self) -> mpsc::UnboundedSender<PlayerEvent> {
        self.events_tx.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PlaybackSnapshot> {
        self.snapshot_tx.subscribe()
    }

    pub fn session(&self) -> Option<&PlaybackSession> {
        self.session.as_ref()
    }

    pub fn status(&self) -> PlaybackStatus {
        self.session
            .as_ref()
            .map(|s| s.status)
            .unwrap_or(PlaybackStatus::Idle)
    }

    /// Kind of the live strategy instance, if any
    pub fn active_strategy(&self) -> Option<StrategyKind> {
        self.instance.as_ref().map(StrategyInstance::kind)
    }

    /// Attempt number stamped on adaptive events from the live instance
    pub fn current_attempt(&self) -> u64 {
        self.attempt
    }

    /// The terminal error, when the session is in `Error`
    pub fn terminal_error(&self) -> Option<PlaybackError> {
        self.session
            .as_ref()
            .filter(|s| s.status == PlaybackStatus::Error)
            .map(|s| {
                PlaybackError::terminal(
                    s.error_message
                        .clone()
                        .unwrap_or_else(|| STREAM_FAILED_MESSAGE.to_string()),
                )
            })
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        let embedded_viewer_url = match &self.instance {
            Some(StrategyInstance::Embedded { viewer_url }) => Some(viewer_url.clone()),
            _ => None,
        };
        PlaybackSnapshot {
            progress_percent: self
                .session
                .as_ref()
                .map(PlaybackSession::progress_percent)
                .unwrap_or(0.0),
            session: self.session.clone(),
            embedded_viewer_url,
            fullscreen: self.fullscreen,
            picture_in_picture: self.picture_in_picture,
        }
    }

    /// Replace the current session with `url` and start its first strategy
    ///
    /// Embedded URLs need no sink; everything else fails with
    /// [`PlaybackError::NoSink`] when none is attached.
    pub fn present(&mut self, url: &str, title: &str) -> AppResult<PlaybackRoute> {
        self.teardown();

        let route = self.classifier.classify(url);
        if self.sink.is_none() && route.strategy() != StrategyKind::Embedded {
            return Err(PlaybackError::NoSink.into());
        }

        info!(
            "Presenting '{}' ({}) via {:?}",
            title,
            UrlUtils::obfuscate_credentials(url),
            route.strategy()
        );
        self.session = Some(self.new_session(url, title, route.strategy()));
        self.enter(&route);
        self.publish();
        Ok(route)
    }

    /// Release the strategy instance and discard the session
    pub fn teardown(&mut self) {
        self.release_instance();
        if self.session.take().is_some() {
            debug!("Playback session discarded");
            self.publish();
        }
    }

    /// Apply one inbound event
    pub fn handle_event(&mut self, event: PlayerEvent) {
        match event {
            PlayerEvent::Media(event) => self.on_media_event(event),
            PlayerEvent::Adaptive { attempt, event } => {
                let live = attempt == self.attempt
                    && self
                        .instance
                        .as_ref()
                        .is_some_and(StrategyInstance::is_adaptive_engine);
                if live {
                    self.on_adaptive_event(event);
                } else {
                    debug!(
                        attempt,
                        current = self.attempt,
                        "Ignoring adaptive event from released instance"
                    );
                }
            }
            PlayerEvent::Control(command) => self.apply(command),
        }
        self.publish();
    }

    /// Process every event already queued, returning how many were handled
    pub fn drain_pending(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_event(event);
            handled += 1;
        }
        handled
    }

    /// Wait for the next event and apply it
    pub async fn step(&mut self) -> bool {
        match self.events_rx.recv().await {
            Some(event) => {
                self.handle_event(event);
                true
            }
            None => false,
        }
    }

    /// Process events until `shutdown` fires, then tear down
    pub async fn run(&mut self, shutdown: CancellationToken) {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                event = self.events_rx.recv() => match event {
                    Some(event) => self.handle_event(event),
                    None => break,
                },
            }
        }
        self.teardown();
    }

    /// Translate a key press into a command and apply it
    pub fn handle_key(&mut self, key: Key, focus: InputFocus) -> Option<ControlCommand> {
        let command = self.bindings.command_for(key, focus)?;
        self.apply(command);
        self.publish();
        Some(command)
    }

    /* -----------------------------
     * Strategy transitions
     * --------------------------- */

    fn new_session(&self, url: &str, title: &str, strategy: StrategyKind) -> PlaybackSession {
        let mut session = PlaybackSession::new(url, title, strategy);
        session.volume = self.volume;
        session.muted = self.muted;
        session
    }

    fn enter(&mut self, route: &PlaybackRoute) {
        match route {
            PlaybackRoute::Embedded { viewer_url, .. } => {
                self.release_instance();
                self.instance = Some(StrategyInstance::Embedded {
                    viewer_url: viewer_url.clone(),
                });
            }
            PlaybackRoute::Adaptive => self.enter_adaptive(),
            PlaybackRoute::Native => self.enter_native(),
        }
    }

    fn enter_native(&mut self) {
        self.release_instance();
        let Some(session) = self.session.as_mut() else {
            return;
        };
        reset_for_attempt(session, StrategyKind::Native);
        session.attempted_native = true;

        info!(
            attempt = self.attempt,
            "Starting native playback of {}",
            UrlUtils::obfuscate_credentials(&session.url)
        );
        if let Some(sink) = self.sink.as_mut() {
            sink.load(&session.url);
            sink.play();
        }
        self.instance = Some(StrategyInstance::Native);
    }

    fn enter_adaptive(&mut self) {
        self.release_instance();
        let Some(session) = self.session.as_mut() else {
            return;
        };
        reset_for_attempt(session, StrategyKind::Adaptive);
        session.attempted_adaptive = true;
        let url = session.url.clone();
        let attempted_native = session.attempted_native;

        if let Some(sink) = self.sink.as_mut()
            && sink.supports_native_adaptive()
        {
            info!(
                attempt = self.attempt,
                "Sink plays adaptive manifests natively, assigning {}",
                UrlUtils::obfuscate_credentials(&url)
            );
            sink.load(&url);
            self.instance = Some(StrategyInstance::Adaptive(AdaptiveBinding::SinkNative));
            return;
        }

        if !self.factory.is_supported() {
            if attempted_native {
                self.fail(PlaybackError::adaptive_fatal("adaptive engine unavailable"));
            } else {
                info!("Adaptive engine unavailable, falling back to native playback");
                self.enter_native();
            }
            return;
        }

        info!(
            attempt = self.attempt,
            "Starting adaptive playback of {}",
            UrlUtils::obfuscate_credentials(&url)
        );
        let instance = self
            .factory
            .create(&url, self.attempt, self.events_tx.clone());
        self.instance = Some(StrategyInstance::Adaptive(AdaptiveBinding::Engine(
            instance,
        )));
    }

    fn release_instance(&mut self) {
        if let Some(instance) = self.instance.take() {
            debug!(attempt = self.attempt, "Releasing {:?} strategy", instance);
            let uses_sink = instance.kind() != StrategyKind::Embedded;
            instance.release();
            if uses_sink && let Some(sink) = self.sink.as_mut() {
                sink.unload();
            }
        }
        self.attempt += 1;
    }

    fn retry(&mut self) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        if session.status != PlaybackStatus::Error {
            debug!("Retry ignored while {:?}", session.status);
            return;
        }
        let url = session.url.clone();
        let title = session.title.clone();

        info!("Retrying {}", UrlUtils::obfuscate_credentials(&url));
        let route = self.classifier.classify(&url);
        self.session = Some(self.new_session(&url, &title, route.strategy()));
        self.enter(&route);
    }

    fn fail(&mut self, cause: PlaybackError) {
        self.release_instance();
        if let Some(session) = self.session.as_mut() {
            warn!(
                "Playback of {} failed: {}",
                UrlUtils::obfuscate_credentials(&session.url),
                cause
            );
            session.status = PlaybackStatus::Error;
            session.error_message = Some(STREAM_FAILED_MESSAGE.to_string());
        }
    }

    fn on_adaptive_fatal(&mut self, details: String) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        warn!(
            "Adaptive playback of {} failed: {}",
            UrlUtils::obfuscate_credentials(&session.url),
            details
        );
        if session.attempted_native {
            self.fail(PlaybackError::adaptive_fatal(details));
        } else {
            self.enter_native();
        }
    }

    fn on_media_error(&mut self, kind: MediaErrorKind, message: String) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        match session.strategy {
            StrategyKind::Native => {
                let escalate = !session.attempted_adaptive
                    && (is_adaptive_url(&session.url) || kind.suggests_format_mismatch());
                if escalate {
                    info!(
                        "Native playback failed ({:?}: {}), trying adaptive",
                        kind, message
                    );
                    self.enter_adaptive();
                } else {
                    self.fail(PlaybackError::Media { kind, message });
                }
            }
            StrategyKind::Adaptive => {
                self.on_adaptive_fatal(format!("media error ({kind:?}): {message}"));
            }
            StrategyKind::Embedded => {}
        }
    }

    /* -----------------------------
     * Event handlers
     * --------------------------- */

    fn on_media_event(&mut self, event: MediaEvent) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        if session.strategy == StrategyKind::Embedded || session.status == PlaybackStatus::Error {
            return;
        }

        match event {
            MediaEvent::Error { kind, message } => {
                self.on_media_error(kind, message);
                return;
            }
            MediaEvent::LoadedMetadata => {
                if self
                    .instance
                    .as_ref()
                    .is_some_and(StrategyInstance::is_sink_native_adaptive)
                    && let Some(sink) = self.sink.as_mut()
                {
                    sink.play();
                }
                return;
            }
            _ => {}
        }

        let sink_paused = self.sink.as_ref().is_some_and(|s| s.is_paused());
        let Some(session) = self.session.as_mut() else {
            return;
        };
        match event {
            MediaEvent::Play => {
                if matches!(
                    session.status,
                    PlaybackStatus::Idle | PlaybackStatus::Paused | PlaybackStatus::Ended
                ) {
                    session.status = PlaybackStatus::Playing;
                }
            }
            MediaEvent::Pause => {
                if session.status != PlaybackStatus::Ended {
                    session.status = PlaybackStatus::Paused;
                }
            }
            MediaEvent::Waiting | MediaEvent::Stalled => {
                session.status = PlaybackStatus::Buffering;
            }
            MediaEvent::CanPlay => {
                if session.status == PlaybackStatus::Buffering {
                    session.status = if sink_paused {
                        PlaybackStatus::Paused
                    } else {
                        PlaybackStatus::Playing
                    };
                }
            }
            MediaEvent::Playing => session.status = PlaybackStatus::Playing,
            MediaEvent::TimeUpdate(t) => session.current_time = t,
            MediaEvent::DurationChange(d) => session.duration = d,
            MediaEvent::Ended => session.status = PlaybackStatus::Ended,
            MediaEvent::Error { .. } | MediaEvent::LoadedMetadata => {}
        }
    }

    fn on_adaptive_event(&mut self, event: AdaptiveEvent) {
        match event {
            AdaptiveEvent::ManifestParsed {
                variant_url,
                variant_count,
            } => {
                info!(
                    variant_count,
                    variant = variant_url.as_deref().unwrap_or("-"),
                    "Adaptive manifest parsed"
                );
                if let Some(sink) = self.sink.as_mut() {
                    sink.play();
                }
            }
            AdaptiveEvent::Segment(data) => {
                if let Some(sink) = self.sink.as_mut() {
                    sink.append_segment(data);
                }
            }
            AdaptiveEvent::Warning(message) => debug!("Adaptive engine: {}", message),
            AdaptiveEvent::Fatal(details) => self.on_adaptive_fatal(details),
        }
    }

    /* -----------------------------
     * Control commands
     * --------------------------- */

    fn apply(&mut self, command: ControlCommand) {
        if command == ControlCommand::Retry {
            self.retry();
            return;
        }
        if self
            .session
            .as_ref()
            .is_some_and(|s| s.strategy == StrategyKind::Embedded)
        {
            return;
        }
        let Some(sink) = self.sink.as_mut() else {
            debug!("Ignoring {:?}: no sink attached", command);
            return;
        };

        match command {
            ControlCommand::TogglePlay => {
                if sink.is_paused() {
                    sink.play();
                } else {
                    sink.pause();
                }
            }
            ControlCommand::SeekToFraction(fraction) => {
                if let Some(session) = self.session.as_mut()
                    && session.duration.is_finite()
                    && session.duration > 0.0
                    && !fraction.is_nan()
                {
                    let position = fraction.clamp(0.0, 1.0) * session.duration;
                    sink.seek(position);
                    session.current_time = position;
                }
            }
            ControlCommand::SeekBy(delta) => {
                if let Some(session) = self.session.as_mut() {
                    let target = session.current_time + delta;
                    let position = if delta >= 0.0 {
                        if !session.duration.is_finite() {
                            return;
                        }
                        target.min(session.duration)
                    } else {
                        target.max(0.0)
                    };
                    sink.seek(position);
                    session.current_time = position;
                }
            }
            ControlCommand::SetVolume(volume) => {
                if volume.is_nan() {
                    return;
                }
                let volume = volume.clamp(0.0, 1.0);
                let muted = volume == 0.0;
                sink.set_volume(volume);
                sink.set_muted(muted);
                self.volume = volume;
                self.muted = muted;
                if let Some(session) = self.session.as_mut() {
                    session.volume = volume;
                    session.muted = muted;
                }
            }
            ControlCommand::ToggleMute => {
                self.muted = !self.muted;
                sink.set_muted(self.muted);
                if let Some(session) = self.session.as_mut() {
                    session.muted = self.muted;
                }
            }
            ControlCommand::ToggleFullscreen => {
                self.fullscreen = !self.fullscreen;
                sink.set_fullscreen(self.fullscreen);
            }
            ControlCommand::TogglePictureInPicture => {
                self.picture_in_picture = !self.picture_in_picture;
                sink.set_picture_in_picture(self.picture_in_picture);
            }
            ControlCommand::Retry => {}
        }
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(self.snapshot());
    }
}

impl Drop for PlaybackEngine {
    fn drop(&mut self) {
        if let Some(instance) = self.instance.take() {
            instance.release();
        }
    }
}

fn reset_for_attempt(session: &mut PlaybackSession, strategy: StrategyKind) {
    session.strategy = strategy;
    session.status = PlaybackStatus::Buffering;
    session.error_message = None;
    session.current_time = 0.0;
    session.duration = f64::NAN;
}
