//! UI control commands and keyboard shortcuts

use serde::Serialize;

/// Side-effecting commands against the current sink
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum ControlCommand {
    TogglePlay,
    /// Seek to a fraction of the duration, clamped to `[0, 1]`
    SeekToFraction(f64),
    /// Relative seek in seconds, clamped to `[0, duration]`
    SeekBy(f64),
    /// Volume in `[0, 1]`; exactly 0 also mutes
    SetVolume(f64),
    ToggleMute,
    ToggleFullscreen,
    TogglePictureInPicture,
    /// Start over after a terminal error
    Retry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    ArrowLeft,
    ArrowRight,
    Other,
}

impl Key {
    /// Map a DOM-style key name (`" "`, `"k"`, `"ArrowLeft"`, ...)
    pub fn from_name(name: &str) -> Self {
        match name {
            "ArrowLeft" => Key::ArrowLeft,
            "ArrowRight" => Key::ArrowRight,
            "Space" | "Spacebar" => Key::Char(' '),
            other => {
                let mut chars = other.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Key::Char(c),
                    _ => Key::Other,
                }
            }
        }
    }
}

/// Where keyboard focus currently sits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputFocus {
    #[default]
    Player,
    /// A text input or text area; shortcuts are suppressed
    TextInput,
}

#[derive(Debug, Clone, Copy)]
pub struct KeyBindings {
    seek_step: f64,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self { seek_step: 10.0 }
    }
}

impl KeyBindings {
    pub fn new(seek_step_secs: f64) -> Self {
        Self {
            seek_step: seek_step_secs,
        }
    }

    pub fn command_for(&self, key: Key, focus: InputFocus) -> Option<ControlCommand> {
        if focus == InputFocus::TextInput {
            return None;
        }
        match key {
            Key::Char(' ') | Key::Char('k') => Some(ControlCommand::TogglePlay),
            Key::Char('f') => Some(ControlCommand::ToggleFullscreen),
            Key::Char('m') => Some(ControlCommand::ToggleMute),
            Key::ArrowRight => Some(ControlCommand::SeekBy(self.seek_step)),
            Key::ArrowLeft => Some(ControlCommand::SeekBy(-self.seek_step)),
            _ => None,
        }
    }
}

/// Fraction of a progress track under the pointer, clamped to `[0, 1]`
///
/// `None` when the track has no width.
pub fn seek_fraction_from_pointer(pointer_x: f64, track_left: f64, track_width: f64) -> Option<f64> {
    if !track_width.is_finite() || track_width <= 0.0 {
        return None;
    }
    Some(((pointer_x - track_left) / track_width).clamp(0.0, 1.0))
}
