//! Centralized error handling for the M3U player
//!
//! This module unifies error types across the ingestion pipeline, the playback
//! engine and the credential session so callers see one consistent surface.
//!
//! # Error Categories
//!
//! - **Source Errors**: a single playlist source could not be fetched or decoded.
//!   These are absorbed by the aggregator and never reach the caller.
//! - **Playback Errors**: adaptive engine failures (recovered by fallback) and
//!   terminal playback failures (surfaced with a retry affordance).
//! - **Unauthorized**: the credential verifier rejected a login.
//! - **Configuration Errors**: invalid or unreadable configuration.
//!
//! # Usage
//!
//! ```rust
//! use m3u_player::errors::{AppError, AppResult};
//!
//! fn example_function() -> AppResult<String> {
//!     Err(AppError::validation("empty playlist url"))
//! }
//! ```

pub mod types;

pub use types::*;

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Convenience type alias for Source Results
pub type SourceResult<T> = Result<T, SourceError>;
