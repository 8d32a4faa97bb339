//! Derived catalog views
//!
//! Pure functions over a [`Catalog`](crate::models::Catalog): category counts,
//! name search, group filtering and pagination. Nothing here is cached.

pub mod browse;
pub mod categories;

pub use browse::{Page, in_group, paginate, search};
pub use categories::{CategoryCount, filter_categories, group_counts};
