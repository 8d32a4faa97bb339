//! M3U playlist parsing
//!
//! Turns one extended-M3U document into channel records in document order.
//! Parsing never fails: marker lines without a following URI are dropped and
//! unknown tags are ignored.

use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use crate::models::{ChannelRecord, DEFAULT_GROUP};

const EXTINF_PREFIX: &str = "#EXTINF:";
const UNKNOWN_NAME: &str = "Unknown";

static TVG_LOGO: LazyLock<Option<Regex>> = LazyLock::new(|| attribute_regex("tvg-logo"));
static GROUP_TITLE: LazyLock<Option<Regex>> = LazyLock::new(|| attribute_regex("group-title"));
static TVG_ID: LazyLock<Option<Regex>> = LazyLock::new(|| attribute_regex("tvg-id"));
static TVG_NAME: LazyLock<Option<Regex>> = LazyLock::new(|| attribute_regex("tvg-name"));

fn attribute_regex(key: &str) -> Option<Regex> {
    Regex::new(&format!(r#"{}="([^"]*)""#, regex::escape(key))).ok()
}

/// Metadata from a marker line, waiting for its URI line
#[derive(Debug)]
struct PartialChannel {
    name: String,
    logo_url: String,
    group: String,
    epg_id: String,
    epg_name: String,
    line_num: usize,
}

/// Parse playlist text into channel records
///
/// Records are returned in document order with ids of the form
/// `slug(name)-index`, where `index` counts emitted records from zero.
pub fn parse_playlist(content: &str) -> Vec<ChannelRecord> {
    let mut records = Vec::new();
    let mut pending: Option<PartialChannel> = None;
    let mut dropped = 0usize;

    for (line_num, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if line.starts_with(EXTINF_PREFIX) {
            if let Some(previous) = pending.replace(parse_extinf_line(line, line_num + 1)) {
                dropped += 1;
                debug!(
                    "Dropping '{}' at line {}: no stream URL before next entry",
                    previous.name, previous.line_num
                );
            }
            continue;
        }

        if line.starts_with('#') {
            continue;
        }

        if let Some(partial) = pending.take() {
            let id = slug(&format!("{}-{}", partial.name, records.len()));
            records.push(ChannelRecord {
                id,
                name: partial.name,
                logo_url: partial.logo_url,
                group: partial.group,
                stream_url: line.to_string(),
                epg_id: partial.epg_id,
                epg_name: partial.epg_name,
            });
        }
    }

    if let Some(previous) = pending {
        dropped += 1;
        debug!(
            "Dropping '{}' at line {}: playlist ended before stream URL",
            previous.name, previous.line_num
        );
    }

    debug!(
        "Parsed {} channel records ({} incomplete entries skipped)",
        records.len(),
        dropped
    );
    records
}

/// Parse an EXTINF line.
///
/// Format: `#EXTINF:-1 tvg-id="id" tvg-logo="logo" group-title="group",Display Name`.
/// The display name is whatever follows the last comma; attributes are
/// matched independently anywhere on the line.
fn parse_extinf_line(line: &str, line_num: usize) -> PartialChannel {
    let name = match line.rfind(',') {
        Some(pos) => line[pos + 1..].trim(),
        None => line,
    };
    let name = if name.is_empty() { UNKNOWN_NAME } else { name };

    let group = capture(GROUP_TITLE.as_ref(), line);

    PartialChannel {
        name: name.to_string(),
        logo_url: capture(TVG_LOGO.as_ref(), line),
        group: if group.is_empty() {
            DEFAULT_GROUP.to_string()
        } else {
            group
        },
        epg_id: capture(TVG_ID.as_ref(), line),
        epg_name: capture(TVG_NAME.as_ref(), line),
        line_num,
    }
}

fn capture(re: Option<&Regex>, line: &str) -> String {
    re.and_then(|re| re.captures(line))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

fn slug(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join("-").to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_entry_with_attributes() {
        let text = "#EXTM3U\n#EXTINF:-1 tvg-logo=\"L\" group-title=\"G\",Name\nhttp://x\n";
        let records = parse_playlist(text);
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.name, "Name");
        assert_eq!(r.logo_url, "L");
        assert_eq!(r.group, "G");
        assert_eq!(r.stream_url, "http://x");
        assert_eq!(r.id, "name-0");
        assert_eq!(r.epg_id, "");
        assert_eq!(r.epg_name, "");
    }

    #[test]
    fn epg_attributes_and_default_group() {
        let text = "#EXTINF:-1 tvg-id=\"bbc1.uk\" tvg-name=\"BBC One\",BBC One HD\nhttp://a/1.ts";
        let records = parse_playlist(text);
        assert_eq!(records[0].epg_id, "bbc1.uk");
        assert_eq!(records[0].epg_name, "BBC One");
        assert_eq!(records[0].group, "Uncategorized");
        assert_eq!(records[0].id, "bbc-one-hd-0");
    }

    #[test]
    fn empty_group_title_falls_back_to_default() {
        let records = parse_playlist("#EXTINF:-1 group-title=\"\",A\nhttp://a");
        assert_eq!(records[0].group, DEFAULT_GROUP);
    }

    #[test]
    fn entry_without_uri_at_end_is_dropped() {
        let records = parse_playlist("#EXTM3U\n#EXTINF:-1,Lonely");
        assert!(records.is_empty());
    }

    #[test]
    fn entry_followed_by_another_marker_is_dropped() {
        let text = "#EXTINF:-1,First\n#EXTINF:-1,Second\nhttp://second\n";
        let records = parse_playlist(text);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Second");
        assert_eq!(records[0].id, "second-0");
    }

    #[test]
    fn comments_between_marker_and_uri_are_skipped() {
        let text = "#EXTINF:-1,News\n#EXTVLCOPT:http-user-agent=x\n\n  http://news  \n";
        let records = parse_playlist(text);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].stream_url, "http://news");
    }

    #[test]
    fn name_is_text_after_last_comma() {
        let records = parse_playlist("#EXTINF:-1 group-title=\"A,B\",Movies, Classics\nhttp://m");
        assert_eq!(records[0].name, "Classics");
        assert_eq!(records[0].group, "A,B");
    }

    #[test]
    fn blank_name_becomes_unknown() {
        let records = parse_playlist("#EXTINF:-1,   \nhttp://u");
        assert_eq!(records[0].name, "Unknown");
        assert_eq!(records[0].id, "unknown-0");
    }

    #[test]
    fn ids_follow_emitted_position() {
        let text = "#EXTINF:-1,Orphan\n#EXTINF:-1,Sky  Sports 1\nhttp://a\n#EXTINF:-1,CNN\nhttp://b\n";
        let ids: Vec<_> = parse_playlist(text).into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["sky-sports-1-0", "cnn-1"]);
    }

    #[test]
    fn bare_uri_lines_without_marker_are_ignored() {
        let records = parse_playlist("#EXTM3U\nhttp://stray\n#EXTINF:-1,A\nhttp://a\n");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].stream_url, "http://a");
    }

    #[test]
    fn garbage_input_yields_nothing() {
        assert!(parse_playlist("").is_empty());
        assert!(parse_playlist("<html>not a playlist</html>").is_empty());
    }
}
