use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::models::Catalog;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub name: String,
    pub count: usize,
}

/// Count records per group
///
/// Groups starting with a digit come first; each partition is ordered
/// case-insensitively.
pub fn group_counts(catalog: &Catalog) -> Vec<CategoryCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for record in catalog {
        *counts.entry(record.group.as_str()).or_default() += 1;
    }

    let mut groups: Vec<CategoryCount> = counts
        .into_iter()
        .map(|(name, count)| CategoryCount {
            name: name.to_string(),
            count,
        })
        .collect();
    groups.sort_by(|a, b| compare_group_names(&a.name, &b.name));
    groups
}

/// Keep categories whose name contains `query`, ignoring case
pub fn filter_categories(categories: &[CategoryCount], query: &str) -> Vec<CategoryCount> {
    let query = query.trim().to_lowercase();
    categories
        .iter()
        .filter(|c| query.is_empty() || c.name.to_lowercase().contains(&query))
        .cloned()
        .collect()
}

fn starts_with_digit(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_ascii_digit())
}

fn compare_group_names(a: &str, b: &str) -> Ordering {
    starts_with_digit(b)
        .cmp(&starts_with_digit(a))
        .then_with(|| a.to_lowercase().cmp(&b.to_lowercase()))
        .then_with(|| a.cmp(b))
}
