/*!
 * Stream Classification
 * =====================
 *
 * Decides how a selected stream URL should be played:
 *
 *   1. Embedded  - a file-sharing link with a recognisable file id. Rendered by an
 *                  external viewer document; the playback engine never sees it.
 *   2. Adaptive  - the lowercased URL contains an HLS marker (`.m3u8`, `.m3u`, `m3u8`).
 *   3. Native    - everything else is assigned directly to the media sink.
 *
 * Classification is a pure string decision. Nothing is fetched here; content
 * sniffing happens later through fallback in the playback engine.
 *
 * Viewer URL:
 *   `<endpoint>?id=<base64(JSON {"id":[fileId]})>` using standard padded base64,
 *   appended verbatim.
 */

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;
use tracing::debug;

use crate::config::ViewerConfig;
use crate::models::StrategyKind;
use crate::utils::UrlUtils;

/// Substrings that mark a URL as an adaptive manifest
const ADAPTIVE_MARKERS: [&str; 3] = [".m3u8", ".m3u", "m3u8"];

/// File-sharing link shapes, checked in order; capture group 1 is the file id
static SHARED_FILE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"drive\.google\.com/file/d/([^/]+)",
        r"drive\.google\.com/open\?id=([^&]+)",
        r"docs\.google\.com/file/d/([^/]+)",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

/// Initial playback decision for a URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "route", rename_all = "lowercase")]
pub enum PlaybackRoute {
    Embedded { file_id: String, viewer_url: String },
    Adaptive,
    Native,
}

impl PlaybackRoute {
    pub fn strategy(&self) -> StrategyKind {
        match self {
            PlaybackRoute::Embedded { .. } => StrategyKind::Embedded,
            PlaybackRoute::Adaptive => StrategyKind::Adaptive,
            PlaybackRoute::Native => StrategyKind::Native,
        }
    }
}

/// Classifies stream URLs into playback routes
#[derive(Debug, Clone)]
pub struct StreamClassifier {
    viewer_endpoint: String,
}

impl Default for StreamClassifier {
    fn default() -> Self {
        Self::new(&ViewerConfig::default())
    }
}

impl StreamClassifier {
    pub fn new(config: &ViewerConfig) -> Self {
        Self {
            viewer_endpoint: config.endpoint.clone(),
        }
    }

    pub fn classify(&self, url: &str) -> PlaybackRoute {
        let route = if let Some(file_id) = extract_shared_file_id(url) {
            let viewer_url = self.viewer_url(&file_id);
            PlaybackRoute::Embedded {
                file_id,
                viewer_url,
            }
        } else if is_adaptive_url(url) {
            PlaybackRoute::Adaptive
        } else {
            PlaybackRoute::Native
        };

        debug!(
            "Classified {} as {:?}",
            UrlUtils::obfuscate_credentials(url),
            route.strategy()
        );
        route
    }

    /// External viewer URL for a shared file id
    pub fn viewer_url(&self, file_id: &str) -> String {
        let payload = serde_json::json!({ "id": [file_id] }).to_string();
        format!("{}?id={}", self.viewer_endpoint, STANDARD.encode(payload))
    }
}

/// Whether the URL looks like an adaptive manifest
pub fn is_adaptive_url(url: &str) -> bool {
    let lower = url.to_lowercase();
    ADAPTIVE_MARKERS.iter().any(|m| lower.contains(m))
}

/// File id from the first matching file-sharing pattern
pub fn extract_shared_file_id(url: &str) -> Option<String> {
    SHARED_FILE_PATTERNS
        .iter()
        .find_map(|re| re.captures(url))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}
