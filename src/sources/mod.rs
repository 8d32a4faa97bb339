//! Playlist source handling
//!
//! This module contains the pieces that turn configured playlist URLs into
//! channel records: the M3U parser, the fetcher seam with its HTTP
//! implementation, and the configured source directory.

pub mod directory;
pub mod fetcher;
pub mod m3u;
pub mod traits;

pub use fetcher::HttpPlaylistFetcher;
pub use m3u::parse_playlist;
pub use traits::{PlaylistFetcher, SourceDirectory};
