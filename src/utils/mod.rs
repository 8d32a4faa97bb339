//! Shared helpers

pub mod time;
pub mod url;

pub use self::time::format_time;
pub use self::url::UrlUtils;
