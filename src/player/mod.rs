//! Playback
//!
//! The [`PlaybackEngine`](engine::PlaybackEngine) drives one stream at a time
//! through native or adaptive playback and falls back between them. Sinks,
//! adaptive engines and UI controls plug in through the seams defined here.

pub mod auto_hide;
pub mod controls;
pub mod engine;
pub mod events;
pub mod hls;
pub mod sink;
pub mod strategy;

pub use auto_hide::AutoHide;
pub use controls::{ControlCommand, InputFocus, Key, KeyBindings, seek_fraction_from_pointer};
pub use engine::{PlaybackEngine, PlaybackSnapshot, STREAM_FAILED_MESSAGE};
pub use events::{AdaptiveEvent, MediaEvent, PlayerEvent};
pub use hls::{HlsAdaptiveFactory, HlsSettings};
pub use sink::{HeadlessSink, HeadlessState, MediaSink};
pub use strategy::{AdaptiveBinding, AdaptiveEngineFactory, AdaptiveInstance, StrategyInstance};
