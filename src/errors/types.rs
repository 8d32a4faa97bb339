//! Error type definitions for the M3U player
//!
//! This module defines all error types used throughout the application,
//! keeping per-source, playback and session failures in separate enums that
//! all convert into [`AppError`].

use thiserror::Error;

/// Top-level application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Source handling errors
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Playback errors
    #[error("Playback error: {0}")]
    Playback(#[from] PlaybackError),

    /// Validation errors
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Credential check rejected by the verifier
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },
}

/// Playlist source errors
///
/// Every variant describes why one source produced zero records.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// Upstream answered with a non-success status
    #[error("HTTP error: {status} from {url}")]
    Http { status: u16, url: String },

    /// Connection, DNS, TLS or timeout failure
    #[error("Transport error: {url} - {message}")]
    Transport { url: String, message: String },

    /// Body could not be read as text
    #[error("Decode error: {url} - {message}")]
    Decode { url: String, message: String },
}

/// Kind of media-level failure reported by an output sink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaErrorKind {
    /// Fetching the media was aborted by the user agent
    Aborted,
    /// Network failure while loading
    Network,
    /// The media could be fetched but not decoded
    Decode,
    /// The resource type is not playable by the sink
    SourceNotSupported,
}

impl MediaErrorKind {
    /// Whether this failure points at a content-type mismatch rather than connectivity
    pub fn suggests_format_mismatch(self) -> bool {
        matches!(self, Self::Decode | Self::SourceNotSupported)
    }
}

/// Playback specific errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlaybackError {
    /// The adaptive engine cannot continue; triggers fallback
    #[error("Adaptive engine failure: {details}")]
    AdaptiveFatal { details: String },

    /// Output sink reported a media error
    #[error("Media error ({kind:?}): {message}")]
    Media { kind: MediaErrorKind, message: String },

    /// Both strategies exhausted or no alternative left
    #[error("{message}")]
    Terminal { message: String },

    /// Command issued with no output sink attached
    #[error("No media sink attached")]
    NoSink,
}

/// Convenience methods for creating common error types
impl AppError {
    /// Create a validation error with a custom message
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an unauthorized error
    pub fn unauthorized<S: Into<String>>(message: S) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

}

impl SourceError {
    /// Create an HTTP status error
    pub fn http<U: Into<String>>(status: u16, url: U) -> Self {
        Self::Http {
            status,
            url: url.into(),
        }
    }

    /// Create a transport error
    pub fn transport<U: Into<String>, M: Into<String>>(url: U, message: M) -> Self {
        Self::Transport {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a decode error
    pub fn decode<U: Into<String>, M: Into<String>>(url: U, message: M) -> Self {
        Self::Decode {
            url: url.into(),
            message: message.into(),
        }
    }
}

impl PlaybackError {
    /// Create an adaptive fatal error
    pub fn adaptive_fatal<S: Into<String>>(details: S) -> Self {
        Self::AdaptiveFatal {
            details: details.into(),
        }
    }

    /// Create a terminal error
    pub fn terminal<S: Into<String>>(message: S) -> Self {
        Self::Terminal {
            message: message.into(),
        }
    }
}
