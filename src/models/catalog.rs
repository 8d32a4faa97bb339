use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::AppError;

/// Group assigned to records whose marker line carries no `group-title`
pub const DEFAULT_GROUP: &str = "Uncategorized";

/// One playable entry parsed from a playlist document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRecord {
    /// Slug of the name plus its position in the parse pass. Only unique
    /// within a single document.
    pub id: String,
    pub name: String,
    pub logo_url: String,
    pub group: String,
    pub stream_url: String,
    pub epg_id: String,
    pub epg_name: String,
}

impl ChannelRecord {
    /// Identity used when merging sources
    pub fn dedup_key(&self) -> (&str, &str) {
        (&self.name, &self.stream_url)
    }
}

/// Partition of playlist sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogType {
    Tv,
    Movie,
}

impl fmt::Display for CatalogType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogType::Tv => write!(f, "tv"),
            CatalogType::Movie => write!(f, "movie"),
        }
    }
}

impl FromStr for CatalogType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tv" => Ok(CatalogType::Tv),
            "movie" | "movies" => Ok(CatalogType::Movie),
            other => Err(AppError::validation(format!(
                "Unknown catalog type '{other}', expected 'tv' or 'movie'"
            ))),
        }
    }
}

/// A configured playlist location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistSource {
    pub url: String,
    pub catalog_type: CatalogType,
}

impl PlaylistSource {
    pub fn new<U: Into<String>>(url: U, catalog_type: CatalogType) -> Self {
        Self {
            url: url.into(),
            catalog_type,
        }
    }
}

/// Ordered, deduplicated set of channel records from one aggregation call
///
/// Only the aggregator builds catalogs; once returned they are read-only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Catalog {
    records: Vec<ChannelRecord>,
}

impl Catalog {
    pub(crate) fn from_records(records: Vec<ChannelRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[ChannelRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ChannelRecord> {
        self.records.iter()
    }

    pub fn into_records(self) -> Vec<ChannelRecord> {
        self.records
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a ChannelRecord;
    type IntoIter = std::slice::Iter<'a, ChannelRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
