use serde::Serialize;

use crate::models::{Catalog, ChannelRecord};

/// One page of a result list. Pages are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

/// Records whose name contains `query`, ignoring case. An empty query matches all.
pub fn search<'a>(catalog: &'a Catalog, query: &str) -> Vec<&'a ChannelRecord> {
    let query = query.trim().to_lowercase();
    catalog
        .iter()
        .filter(|r| query.is_empty() || r.name.to_lowercase().contains(&query))
        .collect()
}

/// Records belonging to exactly `group`
pub fn in_group<'a>(catalog: &'a Catalog, group: &str) -> Vec<&'a ChannelRecord> {
    catalog.iter().filter(|r| r.group == group).collect()
}

/// Slice `items` into pages of `page_size`
///
/// `page` is clamped into `1..=total_pages`; an empty list yields a single
/// empty page.
pub fn paginate<T: Clone>(items: &[T], page: usize, page_size: usize) -> Page<T> {
    let page_size = page_size.max(1);
    let total_pages = items.len().div_ceil(page_size);
    let page = page.clamp(1, total_pages.max(1));
    let start = (page - 1) * page_size;
    let end = (start + page_size).min(items.len());

    Page {
        items: items.get(start..end).map(<[T]>::to_vec).unwrap_or_default(),
        page,
        total_pages,
        total_items: items.len(),
    }
}
