//! Catalog ingestion
//!
//! Turns N independently hosted playlists into one ordered, deduplicated
//! catalog. See [`aggregator::CatalogAggregator`].

pub mod aggregator;

pub use aggregator::{AggregationReport, CatalogAggregator, SourceReport, merge_sources};
