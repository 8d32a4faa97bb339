//! Source trait definitions
//!
//! The network and configuration collaborators of the ingestion pipeline are
//! modelled as traits so the aggregator can be driven by in-memory doubles.

use async_trait::async_trait;

use crate::errors::{AppResult, SourceResult};
use crate::models::{CatalogType, PlaylistSource};

/// Retrieves one playlist document
///
/// Implementations report failure through [`SourceError`](crate::errors::SourceError);
/// callers decide whether that failure is fatal.
#[async_trait]
pub trait PlaylistFetcher: Send + Sync {
    /// Fetch the document at `url` and return its text
    async fn fetch(&self, url: &str) -> SourceResult<String>;
}

/// Supplies the ordered playlist sources for a catalog type
#[async_trait]
pub trait SourceDirectory: Send + Sync {
    async fn sources(&self, catalog_type: CatalogType) -> AppResult<Vec<PlaylistSource>>;
}
