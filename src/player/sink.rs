//! Output media sink seam
//!
//! The engine never renders media itself. A host (GUI toolkit, browser bridge,
//! test double) implements [`MediaSink`] and forwards its signals back as
//! [`MediaEvent`](super::events::MediaEvent)s.

use bytes::Bytes;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub trait MediaSink: Send {
    /// Whether the sink can play adaptive manifests by itself
    fn supports_native_adaptive(&self) -> bool {
        false
    }

    /// Assign `url` as the playable source and begin loading
    fn load(&mut self, url: &str);

    /// Drop the current source and any buffered media
    fn unload(&mut self);

    fn play(&mut self);
    fn pause(&mut self);
    fn is_paused(&self) -> bool;

    /// Move the playback position, in seconds
    fn seek(&mut self, position: f64);

    fn set_volume(&mut self, volume: f64);
    fn set_muted(&mut self, muted: bool);
    fn set_fullscreen(&mut self, fullscreen: bool);
    fn set_picture_in_picture(&mut self, enabled: bool);

    /// Feed media bytes produced by an adaptive engine
    fn append_segment(&mut self, data: Bytes);
}

/// Observable state of a [`HeadlessSink`]
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessState {
    pub source: Option<String>,
    pub paused: bool,
    pub position: f64,
    pub volume: f64,
    pub muted: bool,
    pub fullscreen: bool,
    pub picture_in_picture: bool,
    pub loads: usize,
    pub unloads: usize,
    pub play_requests: usize,
    pub segments: usize,
    pub buffered_bytes: usize,
}

impl Default for HeadlessState {
    fn default() -> Self {
        Self {
            source: None,
            paused: true,
            position: 0.0,
            volume: 1.0,
            muted: false,
            fullscreen: false,
            picture_in_picture: false,
            loads: 0,
            unloads: 0,
            play_requests: 0,
            segments: 0,
            buffered_bytes: 0,
        }
    }
}

/// Sink without any output, recording every call
///
/// Used by the `probe` command and as a test double. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct HeadlessSink {
    state: Arc<Mutex<HeadlessState>>,
    native_adaptive: bool,
}

impl HeadlessSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink that claims built-in adaptive manifest support
    pub fn with_native_adaptive() -> Self {
        Self {
            native_adaptive: true,
            ..Self::default()
        }
    }

    pub fn state(&self) -> HeadlessState {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, HeadlessState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MediaSink for HeadlessSink {
    fn supports_native_adaptive(&self) -> bool {
        self.native_adaptive
    }

    fn load(&mut self, url: &str) {
        let mut s = self.lock();
        s.source = Some(url.to_string());
        s.position = 0.0;
        s.paused = true;
        s.loads += 1;
    }

    fn unload(&mut self) {
        let mut s = self.lock();
        s.source = None;
        s.paused = true;
        s.buffered_bytes = 0;
        s.unloads += 1;
    }

    fn play(&mut self) {
        let mut s = self.lock();
        s.paused = false;
        s.play_requests += 1;
    }

    fn pause(&mut self) {
        self.lock().paused = true;
    }

    fn is_paused(&self) -> bool {
        self.lock().paused
    }

    fn seek(&mut self, position: f64) {
        self.lock().position = position;
    }

    fn set_volume(&mut self, volume: f64) {
        self.lock().volume = volume;
    }

    fn set_muted(&mut self, muted: bool) {
        self.lock().muted = muted;
    }

    fn set_fullscreen(&mut self, fullscreen: bool) {
        self.lock().fullscreen = fullscreen;
    }

    fn set_picture_in_picture(&mut self, enabled: bool) {
        self.lock().picture_in_picture = enabled;
    }

    fn append_segment(&mut self, data: Bytes) {
        let mut s = self.lock();
        s.segments += 1;
        s.buffered_bytes += data.len();
    }
}
