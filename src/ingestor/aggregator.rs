//! Playlist aggregation
//!
//! Fetches every configured source concurrently, parses each document, and
//! merges the results into one catalog. A failing source contributes zero
//! records and never affects the others. The merge waits for every fetch to
//! settle and follows configured source order, not completion order.

use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::errors::{AppResult, SourceError};
use crate::models::{Catalog, CatalogType, ChannelRecord, PlaylistSource};
use crate::sources::{PlaylistFetcher, SourceDirectory, parse_playlist};
use crate::utils::UrlUtils;

/// Outcome of one source within an aggregation call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceReport {
    pub url: String,
    /// Records parsed from this source before deduplication
    pub records: usize,
    pub error: Option<SourceError>,
}

impl SourceReport {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Catalog plus per-source diagnostics, in configured source order
#[derive(Debug, Clone)]
pub struct AggregationReport {
    pub catalog: Catalog,
    pub sources: Vec<SourceReport>,
    pub duplicates_removed: usize,
}

/// Builds catalogs from playlist sources
pub struct CatalogAggregator {
    fetcher: Arc<dyn PlaylistFetcher>,
}

impl CatalogAggregator {
    pub fn new(fetcher: Arc<dyn PlaylistFetcher>) -> Self {
        Self { fetcher }
    }

    /// Aggregate sources into a deduplicated catalog
    pub async fn aggregate(&self, sources: &[PlaylistSource]) -> Catalog {
        self.aggregate_with_report(sources).await.catalog
    }

    /// Aggregate the sources a directory lists for `catalog_type`
    pub async fn aggregate_catalog(
        &self,
        directory: &dyn SourceDirectory,
        catalog_type: CatalogType,
    ) -> AppResult<AggregationReport> {
        let sources = directory.sources(catalog_type).await?;
        info!(
            "Aggregating {} {} playlist source(s)",
            sources.len(),
            catalog_type
        );
        Ok(self.aggregate_with_report(&sources).await)
    }

    /// Aggregate sources and report what each one contributed
    pub async fn aggregate_with_report(&self, sources: &[PlaylistSource]) -> AggregationReport {
        let started = Instant::now();

        // join_all keeps input order, so results line up with `sources`.
        let outcomes = join_all(sources.iter().map(|source| self.fetch_one(source))).await;

        let mut reports = Vec::with_capacity(outcomes.len());
        let mut parsed = Vec::with_capacity(outcomes.len());
        for (source, outcome) in sources.iter().zip(outcomes) {
            let safe_url = UrlUtils::obfuscate_credentials(&source.url);
            match outcome {
                Ok(records) => {
                    reports.push(SourceReport {
                        url: safe_url,
                        records: records.len(),
                        error: None,
                    });
                    parsed.push(records);
                }
                Err(e) => {
                    warn!("Skipping playlist source {}: {}", safe_url, e);
                    reports.push(SourceReport {
                        url: safe_url,
                        records: 0,
                        error: Some(e),
                    });
                }
            }
        }

        let (catalog, duplicates_removed) = merge_sources(parsed);
        let failed = reports.iter().filter(|r| !r.is_success()).count();
        info!(
            "Aggregated {} channels from {} source(s) ({} failed, {} duplicates removed) in {:?}",
            catalog.len(),
            reports.len(),
            failed,
            duplicates_removed,
            started.elapsed()
        );

        AggregationReport {
            catalog,
            sources: reports,
            duplicates_removed,
        }
    }

    async fn fetch_one(&self, source: &PlaylistSource) -> Result<Vec<ChannelRecord>, SourceError> {
        let text = self.fetcher.fetch(&source.url).await?;
        let records = parse_playlist(&text);
        debug!(
            "Parsed {} records from {}",
            records.len(),
            UrlUtils::obfuscate_credentials(&source.url)
        );
        Ok(records)
    }
}

/// Concatenate per-source records in order, keeping the first occurrence of
/// each `(name, stream_url)` pair
pub fn merge_sources(per_source: Vec<Vec<ChannelRecord>>) -> (Catalog, usize) {
    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut merged = Vec::new();
    let mut duplicates = 0usize;

    for record in per_source.into_iter().flatten() {
        let (name, url) = record.dedup_key();
        if seen.insert((name.to_string(), url.to_string())) {
            merged.push(record);
        } else {
            duplicates += 1;
        }
    }

    (Catalog::from_records(merged), duplicates)
}
