/*!
 * Streaming
 * =========
 *
 * URL classification for the playback engine and the HLS manifest helpers used
 * by the adaptive engine.
 */

pub mod classification;
pub mod manifest;

pub use classification::{PlaybackRoute, StreamClassifier, extract_shared_file_id, is_adaptive_url};
