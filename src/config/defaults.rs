/// Configuration default values
///
/// This module contains all the default values for configuration options,
/// making them easily changeable in one central location.
// Fetch defaults
pub const DEFAULT_CONNECT_TIMEOUT: &str = "10s";
pub const DEFAULT_USER_AGENT: &str = concat!("m3u-player/", env!("CARGO_PKG_VERSION"));

// Playback defaults
pub const DEFAULT_SEGMENT_TIMEOUT: &str = "15s";
pub const DEFAULT_CONTROLS_HIDE_DELAY: &str = "3s";
pub const DEFAULT_SEEK_STEP: &str = "10s";
pub const DEFAULT_MAX_PLAYLIST_BYTES: usize = 256 * 1024;
pub const DEFAULT_MAX_CONSECUTIVE_ERRORS: usize = 3;

// Catalog browsing defaults
pub const DEFAULT_PAGE_SIZE: usize = 24;

// Embedded viewer defaults
pub const DEFAULT_VIEWER_ENDPOINT: &str = "https://sh20raj.github.io/DrivePlyr/fluid.html";

/// Parse one of the duration constants above.
///
/// The constants are fixed literals, so a parse failure falls back to zero
/// rather than panicking.
pub(crate) fn duration(value: &str) -> std::time::Duration {
    humantime::parse_duration(value).unwrap_or_default()
}
