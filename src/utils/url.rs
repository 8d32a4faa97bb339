//! URL utilities for consistent URL handling

use regex::Regex;
use std::sync::LazyLock;
use url::Url;

/// Credential query parameters whose values are masked before a URL is logged
static SENSITIVE_PARAMS: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?i)([?&](?:username|password|passwd|user|pass|pwd)=)[^&]*").ok()
});

/// URL utilities for consistent URL handling
pub struct UrlUtils;

impl UrlUtils {
    /// Obfuscate credentials embedded in a URL for safe logging
    ///
    /// Masks `user:pass@` userinfo and the values of common credential query
    /// parameters (matched case-insensitively).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use m3u_player::utils::url::UrlUtils;
    ///
    /// assert_eq!(
    ///     UrlUtils::obfuscate_credentials("http://h/get.php?username=bob&password=pw&type=m3u"),
    ///     "http://h/get.php?username=****&password=****&type=m3u"
    /// );
    /// ```
    pub fn obfuscate_credentials(url: &str) -> String {
        let mut obfuscated = url.to_string();

        if let Ok(parsed) = Url::parse(url)
            && (!parsed.username().is_empty() || parsed.password().is_some())
        {
            let mut new_url = parsed.clone();
            let _ = new_url.set_username("****");
            let _ = new_url.set_password(Some("****"));
            obfuscated = new_url.to_string();
        }

        if let Some(re) = SENSITIVE_PARAMS.as_ref() {
            obfuscated = re.replace_all(&obfuscated, "${1}****").into_owned();
        }

        obfuscated
    }

    /// Resolve a manifest-relative URI against the manifest URL
    ///
    /// Absolute URIs are returned unchanged; relative and root-relative URIs
    /// are joined onto `base`. Falls back to plain directory concatenation
    /// when `base` does not parse.
    pub fn resolve(base: &str, reference: &str) -> String {
        if reference.starts_with("http://") || reference.starts_with("https://") {
            return reference.to_string();
        }
        if let Ok(base_url) = Url::parse(base) {
            if let Ok(joined) = base_url.join(reference) {
                return joined.to_string();
            }
        } else if let Some(pos) = base.rfind('/') {
            return format!("{}{}", &base[..=pos], reference);
        }
        reference.to_string()
    }
}
