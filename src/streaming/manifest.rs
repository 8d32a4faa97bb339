/*!
 * HLS Manifest Handling
 * =====================
 *
 * Lightweight, line-oriented inspection of HLS playlists plus bounded network
 * helpers used by the adaptive engine.
 *
 *   - analyze_playlist()       master vs media, encryption, fMP4, target duration
 *   - parse_master_variants()  BANDWIDTH / RESOLUTION per #EXT-X-STREAM-INF
 *   - parse_media_playlist()   segment URIs, MEDIA-SEQUENCE, ENDLIST
 *   - fetch_playlist_bounded() body capped at `max_bytes`, whole request bounded
 *   - fetch_segment()          whole request bounded
 *
 * No decryption or transmuxing happens here.
 */

use bytes::Bytes;
use futures::StreamExt;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

/// Target duration assumed when a media playlist omits it
pub const DEFAULT_TARGET_DURATION: f32 = 6.0;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ManifestError {
    #[error("HTTP request failed: {0}")]
    Http(String),
    #[error("HTTP status {status} for {url}")]
    Status { status: u16, url: String },
    #[error("I/O error: {0}")]
    Io(String),
    #[error("Timeout after {0:?}")]
    Timeout(Duration),
}

impl ManifestError {
    fn from_reqwest(e: reqwest::Error, timeout: Duration) -> Self {
        if e.is_timeout() {
            ManifestError::Timeout(timeout)
        } else {
            ManifestError::Http(e.to_string())
        }
    }
}

/// Fetch playlist text, reading at most `max_bytes` of the body
pub async fn fetch_playlist_bounded(
    client: &Client,
    url: &str,
    timeout: Duration,
    max_bytes: usize,
) -> Result<String, ManifestError> {
    let resp = client
        .get(url)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| ManifestError::from_reqwest(e, timeout))?;

    if !resp.status().is_success() {
        return Err(ManifestError::Status {
            status: resp.status().as_u16(),
            url: url.to_string(),
        });
    }

    let mut body = resp.bytes_stream();
    let mut collected: Vec<u8> = Vec::with_capacity(8192);
    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(|e| {
            if e.is_timeout() {
                ManifestError::Timeout(timeout)
            } else {
                ManifestError::Io(e.to_string())
            }
        })?;
        if collected.len() + chunk.len() > max_bytes {
            // Truncate; a partial playlist is still parseable
            collected.extend_from_slice(&chunk[..(max_bytes - collected.len())]);
            break;
        }
        collected.extend_from_slice(&chunk);
    }

    Ok(String::from_utf8_lossy(&collected).to_string())
}

/// Fetch one media segment
pub async fn fetch_segment(
    client: &Client,
    url: &str,
    timeout: Duration,
) -> Result<Bytes, ManifestError> {
    let resp = client
        .get(url)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| ManifestError::from_reqwest(e, timeout))?;

    if !resp.status().is_success() {
        return Err(ManifestError::Status {
            status: resp.status().as_u16(),
            url: url.to_string(),
        });
    }

    resp.bytes()
        .await
        .map_err(|e| ManifestError::from_reqwest(e, timeout))
}

/* -----------------------------
 * Playlist Analysis
 * --------------------------- */

#[derive(Debug, Default, Clone, PartialEq)]
pub struct PlaylistAnalysis {
    pub is_hls: bool,
    pub is_master: bool,
    pub is_media: bool,
    pub variant_count: usize,
    pub segment_count: usize,
    pub target_duration: Option<f32>,
    pub is_encrypted: bool,
    pub uses_fmp4: bool,
}

pub fn analyze_playlist(text: &str) -> PlaylistAnalysis {
    let mut a = PlaylistAnalysis::default();

    for raw_line in text.lines() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with("#EXTM3U") {
            a.is_hls = true;
            continue;
        }
        if line.starts_with("#EXT-X-STREAM-INF") {
            a.is_master = true;
            a.variant_count += 1;
            continue;
        }
        if let Some(v) = line.strip_prefix("#EXT-X-TARGETDURATION:") {
            a.target_duration = v.trim().parse::<f32>().ok();
            continue;
        }
        if line.starts_with("#EXT-X-KEY") && !line.contains("METHOD=NONE") {
            a.is_encrypted = true;
            continue;
        }
        if line.starts_with("#EXT-X-MAP") {
            a.uses_fmp4 = true;
            continue;
        }
        if line.starts_with('#') {
            continue;
        }
        if !a.is_master {
            a.is_media = true;
            a.segment_count += 1;
        }
    }

    a
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasterVariant {
    pub bandwidth: u64,
    pub resolution: Option<(u32, u32)>,
    pub uri: String,
}

pub fn parse_master_variants(text: &str) -> Vec<MasterVariant> {
    let mut out = Vec::new();
    let mut pending: Option<(u64, Option<(u32, u32)>)> = None;
    for raw in text.lines() {
        let line = raw.trim();
        if let Some(attrs) = line.strip_prefix("#EXT-X-STREAM-INF:") {
            let mut bw: u64 = 0;
            let mut res: Option<(u32, u32)> = None;
            for part in attrs.split(',') {
                let kv = part.trim();
                if let Some(v) = kv.strip_prefix("BANDWIDTH=") {
                    bw = v.parse::<u64>().unwrap_or(bw);
                } else if let Some(v) = kv.strip_prefix("RESOLUTION=")
                    && let Some((w, h)) = v.split_once('x')
                    && let (Ok(wi), Ok(hi)) = (w.parse::<u32>(), h.parse::<u32>())
                {
                    res = Some((wi, hi));
                }
            }
            pending = Some((bw, res));
            continue;
        }
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((bandwidth, resolution)) = pending.take() {
            out.push(MasterVariant {
                bandwidth,
                resolution,
                uri: line.to_string(),
            });
        }
    }
    out
}

/// Highest-bandwidth variant; the first listed wins ties
pub fn select_variant(variants: &[MasterVariant]) -> Option<&MasterVariant> {
    variants
        .iter()
        .rev()
        .max_by_key(|v| v.bandwidth)
}

#[derive(Debug, Clone, PartialEq)]
pub struct MediaPlaylist {
    pub segments: Vec<String>,
    pub target_duration: Option<f32>,
    pub media_sequence: Option<u64>,
    /// `#EXT-X-ENDLIST` seen: no further segments will appear
    pub ended: bool,
}

pub fn parse_media_playlist(text: &str) -> MediaPlaylist {
    let mut target_duration = None;
    let mut segments = Vec::new();
    let mut media_sequence: Option<u64> = None;
    let mut ended = false;

    for raw_line in text.lines() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(v) = line.strip_prefix("#EXT-X-TARGETDURATION:") {
            target_duration = v.trim().parse::<f32>().ok();
            continue;
        }
        if let Some(v) = line.strip_prefix("#EXT-X-MEDIA-SEQUENCE:") {
            media_sequence = v.trim().parse::<u64>().ok();
            continue;
        }
        if line.starts_with("#EXT-X-ENDLIST") {
            ended = true;
            continue;
        }
        if line.starts_with('#') {
            continue;
        }
        segments.push(line.to_string());
    }

    MediaPlaylist {
        segments,
        target_duration,
        media_sequence,
        ended,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MASTER: &str = "#EXTM3U
#EXT-X-STREAM-INF:BANDWIDTH=800000,RESOLUTION=640x360
low/index.m3u8
#EXT-X-STREAM-INF:BANDWIDTH=2500000,RESOLUTION=1280x720,CODECS=\"avc1.4d401f,mp4a.40.2\"
mid/index.m3u8
#EXT-X-STREAM-INF:BANDWIDTH=2500000,RESOLUTION=1280x720
mid-backup/index.m3u8
";

    const MEDIA: &str = "#EXTM3U
#EXT-X-VERSION:3
#EXT-X-TARGETDURATION:4
#EXT-X-MEDIA-SEQUENCE:120
#EXTINF:4.0,
seg120.ts
#EXTINF:4.0,
seg121.ts
";

    #[test]
    fn analyzes_master() {
        let a = analyze_playlist(MASTER);
        assert!(a.is_hls);
        assert!(a.is_master);
        assert!(!a.is_media);
        assert_eq!(a.variant_count, 3);
    }

    #[test]
    fn analyzes_media() {
        let a = analyze_playlist(MEDIA);
        assert!(a.is_media);
        assert_eq!(a.segment_count, 2);
        assert_eq!(a.target_duration, Some(4.0));
        assert!(!a.is_encrypted);

        let enc = analyze_playlist("#EXTM3U\n#EXT-X-KEY:METHOD=AES-128,URI=\"k\"\n#EXT-X-MAP:URI=\"i.mp4\"\ns.m4s");
        assert!(enc.is_encrypted);
        assert!(enc.uses_fmp4);
    }

    #[test]
    fn html_is_not_hls() {
        assert!(!analyze_playlist("<html><body>Forbidden</body></html>").is_hls);
    }

    #[test]
    fn parses_variants_and_selects_highest_bandwidth() {
        let variants = parse_master_variants(MASTER);
        assert_eq!(variants.len(), 3);
        assert_eq!(variants[0].resolution, Some((640, 360)));
        assert_eq!(variants[1].bandwidth, 2_500_000);

        let best = select_variant(&variants).unwrap();
        assert_eq!(best.uri, "mid/index.m3u8");
        assert!(select_variant(&[]).is_none());
    }

    #[test]
    fn parses_media_playlist() {
        let media = parse_media_playlist(MEDIA);
        assert_eq!(media.segments, vec!["seg120.ts", "seg121.ts"]);
        assert_eq!(media.media_sequence, Some(120));
        assert_eq!(media.target_duration, Some(4.0));
        assert!(!media.ended);

        let vod = parse_media_playlist("#EXTM3U\n#EXTINF:10,\na.ts\n#EXT-X-ENDLIST\n");
        assert!(vod.ended);
        assert_eq!(vod.media_sequence, None);
    }
}
