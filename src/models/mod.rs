//! Core data models
//!
//! Channel records and catalogs produced by the ingestion pipeline, plus the
//! playback session owned by the playback engine.

pub mod catalog;
pub mod playback;

pub use catalog::*;
pub use playback::*;
