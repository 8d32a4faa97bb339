//! Inbound messages for the playback engine
//!
//! Media sinks, adaptive engine instances and the UI all talk to the engine
//! through one ordered channel of [`PlayerEvent`]s.

use bytes::Bytes;

use super::controls::ControlCommand;
use crate::errors::MediaErrorKind;

/// Signals raised by the output media sink
#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    Play,
    Pause,
    Waiting,
    Stalled,
    CanPlay,
    Playing,
    LoadedMetadata,
    /// Periodic playback-clock callback, in seconds
    TimeUpdate(f64),
    /// New duration in seconds; non-finite for live streams
    DurationChange(f64),
    Ended,
    Error { kind: MediaErrorKind, message: String },
}

/// Signals raised by an adaptive engine instance
#[derive(Debug, Clone, PartialEq)]
pub enum AdaptiveEvent {
    /// Manifest loaded; `variant_url` is set when a master playlist was resolved
    ManifestParsed {
        variant_url: Option<String>,
        variant_count: usize,
    },
    /// Media bytes ready for the sink
    Segment(Bytes),
    /// Recoverable condition, logged only
    Warning(String),
    /// The instance cannot continue
    Fatal(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    Media(MediaEvent),
    /// Tagged with the attempt that created the instance so events from a
    /// released instance can be recognised and dropped
    Adaptive { attempt: u64, event: AdaptiveEvent },
    Control(ControlCommand),
}

impl From<MediaEvent> for PlayerEvent {
    fn from(event: MediaEvent) -> Self {
        PlayerEvent::Media(event)
    }
}

impl From<ControlCommand> for PlayerEvent {
    fn from(command: ControlCommand) -> Self {
        PlayerEvent::Control(command)
    }
}
