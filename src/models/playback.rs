use serde::Serialize;

/// How an attempt feeds the output sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// URL assigned directly to the sink
    Native,
    /// Manifest driven by an adaptive engine
    Adaptive,
    /// Rendered by an external viewer document; never tracked
    Embedded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackStatus {
    #[default]
    Idle,
    Buffering,
    Playing,
    Paused,
    Error,
    Ended,
}

/// State of the stream currently presented to the engine
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaybackSession {
    pub url: String,
    pub title: String,
    pub strategy: StrategyKind,
    pub attempted_native: bool,
    pub attempted_adaptive: bool,
    pub status: PlaybackStatus,
    pub error_message: Option<String>,
    pub current_time: f64,
    pub duration: f64,
    pub volume: f64,
    pub muted: bool,
}

impl PlaybackSession {
    pub fn new<U: Into<String>, T: Into<String>>(url: U, title: T, strategy: StrategyKind) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            strategy,
            attempted_native: false,
            attempted_adaptive: false,
            status: PlaybackStatus::Idle,
            error_message: None,
            current_time: 0.0,
            duration: f64::NAN,
            volume: 1.0,
            muted: false,
        }
    }

    /// Playback position as a percentage, 0 while the duration is unknown
    pub fn progress_percent(&self) -> f64 {
        if !self.duration.is_finite() || self.duration == 0.0 {
            return 0.0;
        }
        (self.current_time / self.duration * 100.0).clamp(0.0, 100.0)
    }
}
