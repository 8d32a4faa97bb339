//! Configured playlist sources

use async_trait::async_trait;

use super::traits::SourceDirectory;
use crate::config::Config;
use crate::errors::AppResult;
use crate::models::{CatalogType, PlaylistSource};

impl Config {
    /// Ordered sources for one catalog type, skipping blank entries
    pub fn playlist_sources(&self, catalog_type: CatalogType) -> Vec<PlaylistSource> {
        let urls = match catalog_type {
            CatalogType::Tv => &self.sources.tv,
            CatalogType::Movie => &self.sources.movie,
        };
        urls.iter()
            .map(|url| url.trim())
            .filter(|url| !url.is_empty())
            .map(|url| PlaylistSource::new(url, catalog_type))
            .collect()
    }
}

#[async_trait]
impl SourceDirectory for Config {
    async fn sources(&self, catalog_type: CatalogType) -> AppResult<Vec<PlaylistSource>> {
        Ok(self.playlist_sources(catalog_type))
    }
}
