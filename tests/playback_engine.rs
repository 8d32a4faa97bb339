use std::sync::{Arc, Mutex};

use m3u_player::config::PlaybackConfig;
use m3u_player::errors::{AppError, MediaErrorKind, PlaybackError};
use m3u_player::models::{PlaybackStatus, StrategyKind};
use m3u_player::player::{
    AdaptiveEngineFactory, AdaptiveEvent, AdaptiveInstance, ControlCommand, HeadlessSink,
    InputFocus, Key, MediaEvent, PlaybackEngine, PlayerEvent, STREAM_FAILED_MESSAGE,
};
use m3u_player::streaming::{PlaybackRoute, StreamClassifier};
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

const HLS_URL: &str = "http://cdn.example.com/live/news/index.m3u8";
const PLAIN_URL: &str = "http://cdn.example.com/live/news";
const DRIVE_URL: &str = "https://drive.google.com/file/d/abc/view?usp=sharing";

type Log = Arc<Mutex<Vec<String>>>;

/// Records create/release calls in order
struct FakeFactory {
    log: Log,
    supported: bool,
}

struct FakeInstance {
    log: Log,
    attempt: u64,
    released: bool,
}

impl AdaptiveInstance for FakeInstance {
    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.log
                .lock()
                .unwrap()
                .push(format!("release:{}", self.attempt));
        }
    }
}

impl AdaptiveEngineFactory for FakeFactory {
    fn is_supported(&self) -> bool {
        self.supported
    }

    fn create(
        &self,
        _url: &str,
        attempt: u64,
        _events: UnboundedSender<PlayerEvent>,
    ) -> Box<dyn AdaptiveInstance> {
        self.log.lock().unwrap().push(format!("create:{attempt}"));
        Box::new(FakeInstance {
            log: Arc::clone(&self.log),
            attempt,
            released: false,
        })
    }
}

fn engine_with(sink: HeadlessSink, supported: bool) -> (PlaybackEngine, Log) {
    let log: Log = Arc::default();
    let factory = Arc::new(FakeFactory {
        log: Arc::clone(&log),
        supported,
    });
    let mut engine = PlaybackEngine::new(
        StreamClassifier::default(),
        factory,
        &PlaybackConfig::default(),
    );
    engine.attach_sink(Box::new(sink));
    (engine, log)
}

fn media_error(kind: MediaErrorKind) -> PlayerEvent {
    MediaEvent::Error {
        kind,
        message: "boom".to_string(),
    }
    .into()
}

fn adaptive(attempt: u64, event: AdaptiveEvent) -> PlayerEvent {
    PlayerEvent::Adaptive { attempt, event }
}

fn fatal(engine: &PlaybackEngine) -> PlayerEvent {
    adaptive(engine.current_attempt(), AdaptiveEvent::Fatal("manifest 404".into()))
}

#[test]
fn hls_url_falls_back_to_native_then_fails() {
    let sink = HeadlessSink::new();
    let (mut engine, log) = engine_with(sink.clone(), true);

    let route = engine.present(HLS_URL, "News").unwrap();
    assert_eq!(route, PlaybackRoute::Adaptive);
    assert_eq!(engine.active_strategy(), Some(StrategyKind::Adaptive));
    assert_eq!(engine.status(), PlaybackStatus::Buffering);

    engine.handle_event(fatal(&engine));
    assert_eq!(engine.active_strategy(), Some(StrategyKind::Native));
    assert_eq!(engine.status(), PlaybackStatus::Buffering);
    assert_eq!(sink.state().source.as_deref(), Some(HLS_URL));

    engine.handle_event(media_error(MediaErrorKind::Network));
    let session = engine.session().unwrap();
    assert_eq!(session.status, PlaybackStatus::Error);
    assert!(session.attempted_native && session.attempted_adaptive);
    assert_eq!(session.error_message.as_deref(), Some(STREAM_FAILED_MESSAGE));
    assert_eq!(engine.active_strategy(), None);
    assert_eq!(
        engine.terminal_error(),
        Some(PlaybackError::terminal(STREAM_FAILED_MESSAGE))
    );

    let log = log.lock().unwrap();
    assert_eq!(log.len(), 2);
    assert!(log[0].starts_with("create:"));
    assert!(log[1].starts_with("release:"));
}

#[test]
fn native_format_error_escalates_to_adaptive_once() {
    let sink = HeadlessSink::new();
    let (mut engine, log) = engine_with(sink.clone(), true);

    assert_eq!(engine.present(PLAIN_URL, "News").unwrap(), PlaybackRoute::Native);
    assert_eq!(sink.state().play_requests, 1);

    engine.handle_event(media_error(MediaErrorKind::SourceNotSupported));
    assert_eq!(engine.active_strategy(), Some(StrategyKind::Adaptive));
    assert_eq!(log.lock().unwrap().len(), 1);

    engine.handle_event(fatal(&engine));
    assert_eq!(engine.status(), PlaybackStatus::Error);
    assert_eq!(engine.active_strategy(), None);
}

#[test]
fn native_network_error_without_marker_is_terminal() {
    let (mut engine, log) = engine_with(HeadlessSink::new(), true);
    engine.present(PLAIN_URL, "News").unwrap();

    engine.handle_event(media_error(MediaErrorKind::Network));
    assert_eq!(engine.status(), PlaybackStatus::Error);
    assert!(log.lock().unwrap().is_empty());
}

#[test]
fn retry_restarts_from_classification() {
    let (mut engine, log) = engine_with(HeadlessSink::new(), true);
    engine.present(HLS_URL, "News").unwrap();
    engine.handle_event(fatal(&engine));
    engine.handle_event(media_error(MediaErrorKind::Network));
    assert_eq!(engine.status(), PlaybackStatus::Error);

    engine.handle_event(ControlCommand::Retry.into());
    let session = engine.session().unwrap();
    assert_eq!(session.status, PlaybackStatus::Buffering);
    assert_eq!(session.strategy, StrategyKind::Adaptive);
    assert!(session.attempted_adaptive && !session.attempted_native);
    assert_eq!(session.error_message, None);
    assert_eq!(log.lock().unwrap().len(), 3);

    engine.handle_event(adaptive(
        engine.current_attempt(),
        AdaptiveEvent::ManifestParsed {
            variant_url: None,
            variant_count: 0,
        },
    ));
    engine.handle_event(MediaEvent::Playing.into());
    assert_eq!(engine.status(), PlaybackStatus::Playing);
}

#[test]
fn retry_after_native_failure_reaches_playing() {
    let sink = HeadlessSink::new();
    let (mut engine, _log) = engine_with(sink.clone(), true);
    engine.present(PLAIN_URL, "News").unwrap();
    engine.handle_event(media_error(MediaErrorKind::Network));
    assert_eq!(engine.status(), PlaybackStatus::Error);

    engine.handle_event(ControlCommand::Retry.into());
    let session = engine.session().unwrap();
    assert_eq!(session.strategy, StrategyKind::Native);
    assert_eq!(session.status, PlaybackStatus::Buffering);
    assert!(session.attempted_native && !session.attempted_adaptive);
    assert_eq!(session.error_message, None);
    assert_eq!(engine.active_strategy(), Some(StrategyKind::Native));
    assert_eq!(sink.state().loads, 2);

    engine.handle_event(MediaEvent::Playing.into());
    assert_eq!(engine.status(), PlaybackStatus::Playing);
}

#[test]
fn retry_is_ignored_unless_failed() {
    let (mut engine, log) = engine_with(HeadlessSink::new(), true);
    engine.present(HLS_URL, "News").unwrap();
    let attempt = engine.current_attempt();

    engine.handle_event(ControlCommand::Retry.into());
    assert_eq!(engine.current_attempt(), attempt);
    assert_eq!(log.lock().unwrap().len(), 1);
}

#[test]
fn embedded_urls_never_buffer_or_fail() {
    let log: Log = Arc::default();
    let factory = Arc::new(FakeFactory {
        log: Arc::clone(&log),
        supported: true,
    });
    let mut engine = PlaybackEngine::new(
        StreamClassifier::default(),
        factory,
        &PlaybackConfig::default(),
    );

    let route = engine.present(DRIVE_URL, "Film").unwrap();
    let PlaybackRoute::Embedded { file_id, viewer_url } = route else {
        panic!("expected embedded route");
    };
    assert_eq!(file_id, "abc");

    engine.handle_event(MediaEvent::Waiting.into());
    engine.handle_event(media_error(MediaErrorKind::Network));
    assert_eq!(engine.status(), PlaybackStatus::Idle);

    let snapshot = engine.snapshot();
    assert_eq!(snapshot.embedded_viewer_url, Some(viewer_url));
    assert!(log.lock().unwrap().is_empty());
}

#[test]
fn non_embedded_url_requires_sink() {
    let factory = Arc::new(FakeFactory {
        log: Arc::default(),
        supported: true,
    });
    let mut engine = PlaybackEngine::new(
        StreamClassifier::default(),
        factory,
        &PlaybackConfig::default(),
    );
    let err = engine.present(PLAIN_URL, "News").unwrap_err();
    assert!(matches!(err, AppError::Playback(PlaybackError::NoSink)));
}

#[test]
fn events_from_released_instance_are_ignored() {
    let sink = HeadlessSink::new();
    let (mut engine, _log) = engine_with(sink.clone(), true);
    engine.present(HLS_URL, "News").unwrap();
    let stale = engine.current_attempt();

    engine.handle_event(fatal(&engine));
    assert_eq!(engine.active_strategy(), Some(StrategyKind::Native));

    engine.handle_event(adaptive(stale, AdaptiveEvent::Segment(vec![0u8; 188].into())));
    engine.handle_event(adaptive(stale, AdaptiveEvent::Fatal("late".into())));
    assert_eq!(sink.state().segments, 0);
    assert_eq!(engine.active_strategy(), Some(StrategyKind::Native));
    assert_eq!(engine.status(), PlaybackStatus::Buffering);
}

#[test]
fn segments_from_live_instance_reach_sink() {
    let sink = HeadlessSink::new();
    let (mut engine, _log) = engine_with(sink.clone(), true);
    engine.present(HLS_URL, "News").unwrap();
    let attempt = engine.current_attempt();

    engine.handle_event(adaptive(
        attempt,
        AdaptiveEvent::ManifestParsed {
            variant_url: Some("http://cdn.example.com/live/news/720p.m3u8".into()),
            variant_count: 3,
        },
    ));
    engine.handle_event(adaptive(attempt, AdaptiveEvent::Segment(vec![1u8; 376].into())));

    let state = sink.state();
    assert!(!state.paused);
    assert_eq!(state.segments, 1);
    assert_eq!(state.buffered_bytes, 376);
}

#[test]
fn previous_instance_is_released_before_next_is_created() {
    let (mut engine, log) = engine_with(HeadlessSink::new(), true);
    engine.present(HLS_URL, "One").unwrap();
    let first = engine.current_attempt();
    engine
        .present("http://cdn.example.com/live/sport/index.m3u8", "Two")
        .unwrap();
    let second = engine.current_attempt();
    engine.teardown();

    assert_eq!(
        *log.lock().unwrap(),
        vec![
            format!("create:{first}"),
            format!("release:{first}"),
            format!("create:{second}"),
            format!("release:{second}"),
        ]
    );
    assert_eq!(engine.session(), None);
}

#[test]
fn unsupported_adaptive_engine_goes_straight_to_native() {
    let sink = HeadlessSink::new();
    let (mut engine, log) = engine_with(sink.clone(), false);
    engine.present(HLS_URL, "News").unwrap();

    assert_eq!(engine.active_strategy(), Some(StrategyKind::Native));
    let session = engine.session().unwrap();
    assert!(session.attempted_adaptive && session.attempted_native);
    assert!(log.lock().unwrap().is_empty());
    assert_eq!(sink.state().source.as_deref(), Some(HLS_URL));
}

#[test]
fn missing_adaptive_engine_after_native_is_terminal() {
    let sink = HeadlessSink::new();
    let (mut engine, log) = engine_with(sink.clone(), false);
    engine.present(PLAIN_URL, "News").unwrap();
    assert_eq!(sink.state().loads, 1);

    engine.handle_event(media_error(MediaErrorKind::Decode));

    let session = engine.session().unwrap();
    assert_eq!(session.status, PlaybackStatus::Error);
    assert!(session.attempted_native && session.attempted_adaptive);
    assert_eq!(engine.active_strategy(), None);
    assert_eq!(sink.state().loads, 1);
    assert!(log.lock().unwrap().is_empty());
}

#[test]
fn native_adaptive_sink_plays_on_metadata() {
    let sink = HeadlessSink::with_native_adaptive();
    let (mut engine, log) = engine_with(sink.clone(), true);
    engine.present(HLS_URL, "News").unwrap();

    assert_eq!(engine.active_strategy(), Some(StrategyKind::Adaptive));
    assert!(log.lock().unwrap().is_empty());
    assert_eq!(sink.state().play_requests, 0);

    engine.handle_event(MediaEvent::LoadedMetadata.into());
    assert_eq!(sink.state().play_requests, 1);

    // Sink errors count as adaptive failures here
    engine.handle_event(media_error(MediaErrorKind::Decode));
    assert_eq!(engine.active_strategy(), Some(StrategyKind::Native));
}

#[test]
fn status_follows_media_signals() {
    let (mut engine, _log) = engine_with(HeadlessSink::new(), true);
    engine.present(PLAIN_URL, "News").unwrap();

    engine.handle_event(MediaEvent::CanPlay.into());
    assert_eq!(engine.status(), PlaybackStatus::Playing);
    engine.handle_event(MediaEvent::Stalled.into());
    assert_eq!(engine.status(), PlaybackStatus::Buffering);
    engine.handle_event(MediaEvent::Playing.into());
    assert_eq!(engine.status(), PlaybackStatus::Playing);
    engine.handle_event(MediaEvent::Pause.into());
    assert_eq!(engine.status(), PlaybackStatus::Paused);
    engine.handle_event(MediaEvent::Play.into());
    assert_eq!(engine.status(), PlaybackStatus::Playing);
    engine.handle_event(MediaEvent::Ended.into());
    engine.handle_event(MediaEvent::Pause.into());
    assert_eq!(engine.status(), PlaybackStatus::Ended);
    engine.handle_event(MediaEvent::Play.into());
    assert_eq!(engine.status(), PlaybackStatus::Playing);
}

#[test]
fn seek_and_volume_commands() {
    let sink = HeadlessSink::new();
    let (mut engine, _log) = engine_with(sink.clone(), true);
    engine.present(PLAIN_URL, "Film").unwrap();

    engine.handle_event(MediaEvent::DurationChange(200.0).into());
    engine.handle_event(ControlCommand::SeekToFraction(0.25).into());
    assert_eq!(sink.state().position, 50.0);
    assert_eq!(engine.snapshot().progress_percent, 25.0);

    engine.handle_event(ControlCommand::SeekBy(-80.0).into());
    assert_eq!(sink.state().position, 0.0);
    engine.handle_event(ControlCommand::SeekBy(500.0).into());
    assert_eq!(sink.state().position, 200.0);

    engine.handle_event(ControlCommand::SetVolume(1.7).into());
    assert_eq!(sink.state().volume, 1.0);
    engine.handle_event(ControlCommand::SetVolume(0.0).into());
    assert!(sink.state().muted);
    assert!(engine.session().unwrap().muted);

    engine.handle_event(ControlCommand::ToggleFullscreen.into());
    assert!(sink.state().fullscreen);
    assert!(engine.snapshot().fullscreen);
}

#[test]
fn live_streams_reject_forward_seek() {
    let sink = HeadlessSink::new();
    let (mut engine, _log) = engine_with(sink.clone(), true);
    engine.present(PLAIN_URL, "News").unwrap();

    engine.handle_event(MediaEvent::DurationChange(f64::INFINITY).into());
    engine.handle_event(MediaEvent::TimeUpdate(30.0).into());
    engine.handle_event(ControlCommand::SeekBy(10.0).into());
    engine.handle_event(ControlCommand::SeekToFraction(0.5).into());
    assert_eq!(sink.state().position, 0.0);
    assert_eq!(engine.snapshot().progress_percent, 0.0);

    engine.handle_event(ControlCommand::SeekBy(-10.0).into());
    assert_eq!(sink.state().position, 20.0);
}

#[test]
fn keyboard_shortcuts_respect_focus() {
    let sink = HeadlessSink::new();
    let (mut engine, _log) = engine_with(sink.clone(), true);
    engine.present(PLAIN_URL, "News").unwrap();
    assert!(!sink.state().paused);

    assert_eq!(engine.handle_key(Key::Char(' '), InputFocus::TextInput), None);
    assert!(!sink.state().paused);

    assert_eq!(
        engine.handle_key(Key::Char('k'), InputFocus::Player),
        Some(ControlCommand::TogglePlay)
    );
    assert!(sink.state().paused);

    engine.handle_key(Key::from_name("m"), InputFocus::Player);
    assert!(sink.state().muted);
}

#[test]
fn volume_carries_over_to_next_session() {
    let (mut engine, _log) = engine_with(HeadlessSink::new(), true);
    engine.present(PLAIN_URL, "One").unwrap();
    engine.handle_event(ControlCommand::SetVolume(0.4).into());

    engine.present(HLS_URL, "Two").unwrap();
    assert_eq!(engine.session().unwrap().volume, 0.4);
}

#[tokio::test]
async fn queued_events_are_applied_in_order() {
    let (mut engine, _log) = engine_with(HeadlessSink::new(), true);
    let mut snapshots = engine.subscribe();
    engine.present(PLAIN_URL, "News").unwrap();

    let tx = engine.event_sender();
    tx.send(MediaEvent::Waiting.into()).unwrap();
    tx.send(MediaEvent::Playing.into()).unwrap();
    tx.send(MediaEvent::TimeUpdate(4.5).into()).unwrap();

    assert!(engine.step().await);
    assert_eq!(engine.status(), PlaybackStatus::Buffering);
    assert_eq!(engine.drain_pending(), 2);

    assert!(snapshots.has_changed().unwrap());
    let snapshot = snapshots.borrow_and_update().clone();
    let session = snapshot.session.unwrap();
    assert_eq!(session.status, PlaybackStatus::Playing);
    assert_eq!(session.current_time, 4.5);
}

#[tokio::test]
async fn run_applies_events_until_shutdown_then_tears_down() {
    let sink = HeadlessSink::new();
    let (mut engine, log) = engine_with(sink.clone(), true);
    engine.present(HLS_URL, "News").unwrap();
    let attempt = engine.current_attempt();

    let tx = engine.event_sender();
    let shutdown = CancellationToken::new();
    let stop = shutdown.clone();
    let runner = tokio::spawn(async move {
        engine.run(stop).await;
        engine
    });

    tx.send(adaptive(attempt, AdaptiveEvent::Segment(vec![7u8; 10].into())))
        .unwrap();
    while sink.state().segments == 0 {
        tokio::task::yield_now().await;
    }
    shutdown.cancel();

    let engine = runner.await.unwrap();
    assert_eq!(engine.session(), None);
    assert_eq!(engine.active_strategy(), None);
    assert_eq!(
        *log.lock().unwrap(),
        vec![format!("create:{attempt}"), format!("release:{attempt}")]
    );
    assert_eq!(sink.state().source, None);
}
