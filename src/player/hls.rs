/*!
 * HLS Adaptive Engine
 * ===================
 *
 * Default `AdaptiveEngineFactory`. Each instance is one tokio task that:
 *
 *   1. Fetches the manifest (bounded by `segment_timeout` and `max_playlist_bytes`).
 *   2. Resolves a master playlist to its highest-bandwidth variant.
 *   3. Reports `ManifestParsed`, then polls the media playlist and fetches unseen
 *      segments in order, forwarding each as `AdaptiveEvent::Segment`.
 *   4. Reports `Fatal` when the manifest is unusable or after
 *      `max_consecutive_errors` consecutive playlist/segment failures.
 *
 * Segment dedup prefers EXT-X-MEDIA-SEQUENCE and falls back to URIs when no
 * sequence is given or it would overflow.
 * Polling stops at EXT-X-ENDLIST. `release()` cancels the task at its next
 * await point; no request outlives the instance.
 */

use rand::{Rng, rng};
use reqwest::Client;
use std::collections::HashSet;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::events::{AdaptiveEvent, PlayerEvent};
use super::strategy::{AdaptiveEngineFactory, AdaptiveInstance};
use crate::config::{FetchConfig, PlaybackConfig};
use crate::streaming::manifest::{
    DEFAULT_TARGET_DURATION, analyze_playlist, fetch_playlist_bounded, fetch_segment,
    parse_master_variants, parse_media_playlist, select_variant,
};
use crate::utils::UrlUtils;

/// Minimum poll interval guard
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(800);

#[derive(Debug, Clone)]
pub struct HlsSettings {
    pub segment_timeout: Duration,
    pub max_playlist_bytes: usize,
    pub max_consecutive_errors: usize,
}

impl From<&PlaybackConfig> for HlsSettings {
    fn from(config: &PlaybackConfig) -> Self {
        Self {
            segment_timeout: config.segment_timeout,
            max_playlist_bytes: config.max_playlist_bytes,
            max_consecutive_errors: config.max_consecutive_errors.max(1),
        }
    }
}

pub struct HlsAdaptiveFactory {
    client: Client,
    settings: HlsSettings,
}

impl HlsAdaptiveFactory {
    pub fn new(fetch: &FetchConfig, playback: &PlaybackConfig) -> Self {
        let client = Client::builder()
            .connect_timeout(fetch.connect_timeout)
            .user_agent(fetch.user_agent.clone())
            .build()
            .unwrap_or_else(|_| Client::new());
        Self::with_client(client, HlsSettings::from(playback))
    }

    pub fn with_client(client: Client, settings: HlsSettings) -> Self {
        Self { client, settings }
    }
}

impl AdaptiveEngineFactory for HlsAdaptiveFactory {
    fn create(
        &self,
        url: &str,
        attempt: u64,
        events: UnboundedSender<PlayerEvent>,
    ) -> Box<dyn AdaptiveInstance> {
        let token = CancellationToken::new();
        let session = HlsSession {
            client: self.client.clone(),
            settings: self.settings.clone(),
            manifest_url: url.to_string(),
            attempt,
            events: events.clone(),
            token: token.clone(),
        };
        let handle = tokio::spawn(async move {
            // A worker that dies must still hand the engine a fallback trigger
            if let Err(e) = tokio::spawn(session.run()).await
                && e.is_panic()
            {
                warn!(attempt, "HLS worker panicked");
                let _ = events.send(PlayerEvent::Adaptive {
                    attempt,
                    event: AdaptiveEvent::Fatal("adaptive worker stopped unexpectedly".to_string()),
                });
            }
        });
        Box::new(HlsInstance {
            token,
            handle: Some(handle),
        })
    }
}

pub struct HlsInstance {
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl AdaptiveInstance for HlsInstance {
    fn release(&mut self) {
        self.token.cancel();
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for HlsInstance {
    fn drop(&mut self) {
        self.release();
    }
}

struct HlsSession {
    client: Client,
    settings: HlsSettings,
    manifest_url: String,
    attempt: u64,
    events: UnboundedSender<PlayerEvent>,
    token: CancellationToken,
}

impl HlsSession {
    /// Emit an event; false once the engine is gone
    fn emit(&self, event: AdaptiveEvent) -> bool {
        self.events
            .send(PlayerEvent::Adaptive {
                attempt: self.attempt,
                event,
            })
            .is_ok()
    }

    /// Run `fut` unless the instance is released first
    async fn or_cancel<F: Future>(&self, fut: F) -> Option<F::Output> {
        tokio::select! {
            _ = self.token.cancelled() => None,
            out = fut => Some(out),
        }
    }

    async fn fetch_text(&self, url: &str) -> Option<Result<String, String>> {
        self.or_cancel(fetch_playlist_bounded(
            &self.client,
            url,
            self.settings.segment_timeout,
            self.settings.max_playlist_bytes,
        ))
        .await
        .map(|r| r.map_err(|e| e.to_string()))
    }

    async fn run(self) {
        let safe_url = UrlUtils::obfuscate_credentials(&self.manifest_url);
        info!(attempt = self.attempt, "Loading HLS manifest {}", safe_url);

        let Some(manifest) = self.fetch_text(&self.manifest_url).await else {
            return;
        };
        let manifest = match manifest {
            Ok(text) => text,
            Err(e) => {
                self.emit(AdaptiveEvent::Fatal(format!("manifest load failed: {e}")));
                return;
            }
        };

        let analysis = analyze_playlist(&manifest);
        if !analysis.is_hls {
            self.emit(AdaptiveEvent::Fatal(
                "manifest is not an HLS playlist".to_string(),
            ));
            return;
        }

        let (media_url, variant_url, initial_media) = if analysis.is_master {
            let variants = parse_master_variants(&manifest);
            let Some(best) = select_variant(&variants) else {
                self.emit(AdaptiveEvent::Fatal(
                    "master playlist lists no variants".to_string(),
                ));
                return;
            };
            let variant = UrlUtils::resolve(&self.manifest_url, &best.uri);
            debug!(
                bandwidth = best.bandwidth,
                variants = variants.len(),
                "Selected variant {}",
                UrlUtils::obfuscate_credentials(&variant)
            );
            (variant.clone(), Some(variant), None)
        } else {
            (self.manifest_url.clone(), None, Some(manifest))
        };

        if analysis.is_encrypted || analysis.uses_fmp4 {
            self.emit(AdaptiveEvent::Warning(format!(
                "manifest uses encryption={} fmp4={}; segments are forwarded as-is",
                analysis.is_encrypted, analysis.uses_fmp4
            )));
        }

        if !self.emit(AdaptiveEvent::ManifestParsed {
            variant_url,
            variant_count: analysis.variant_count,
        }) {
            return;
        }

        self.poll_media(&media_url, initial_media).await;
    }

    async fn poll_media(&self, media_url: &str, mut prefetched: Option<String>) {
        let mut target_duration = DEFAULT_TARGET_DURATION;
        let mut seen_segments: HashSet<String> = HashSet::new();
        let mut seen_sequences: HashSet<u64> = HashSet::new();
        let mut consecutive_errors = 0usize;

        while !self.token.is_cancelled() {
            let started = Instant::now();

            let text = match prefetched.take() {
                Some(text) => text,
                None => match self.fetch_text(media_url).await {
                    None => return,
                    Some(Ok(text)) => text,
                    Some(Err(e)) => {
                        consecutive_errors += 1;
                        warn!(attempt = consecutive_errors, "Media playlist fetch error: {}", e);
                        if !self.within_error_budget(consecutive_errors, &e) {
                            return;
                        }
                        if self.or_cancel(tokio::time::sleep(MIN_POLL_INTERVAL)).await.is_none() {
                            return;
                        }
                        continue;
                    }
                },
            };

            let media = parse_media_playlist(&text);
            if let Some(td) = media.target_duration {
                target_duration = td;
            }

            let mut new_any = false;
            for (idx, uri) in media.segments.iter().enumerate() {
                let sequence = media
                    .media_sequence
                    .and_then(|base| base.checked_add(idx as u64));
                let fresh = match sequence {
                    Some(seq) => seen_sequences.insert(seq),
                    None => seen_segments.insert(uri.clone()),
                };
                if !fresh {
                    continue;
                }
                new_any = true;

                let segment_url = UrlUtils::resolve(media_url, uri);
                let fetched = self
                    .or_cancel(fetch_segment(
                        &self.client,
                        &segment_url,
                        self.settings.segment_timeout,
                    ))
                    .await;
                match fetched {
                    None => return,
                    Some(Ok(bytes)) => {
                        consecutive_errors = 0;
                        debug!(sequence, size = bytes.len(), "Fetched segment");
                        if !self.emit(AdaptiveEvent::Segment(bytes)) {
                            return;
                        }
                    }
                    Some(Err(e)) => {
                        consecutive_errors += 1;
                        warn!(attempt = consecutive_errors, sequence, "Segment fetch error: {}", e);
                        if !self.within_error_budget(consecutive_errors, &e.to_string()) {
                            return;
                        }
                    }
                }
            }

            if media.ended {
                debug!("Playlist ended, stopping poll loop");
                return;
            }

            let elapsed = started.elapsed();
            let mut interval_ms = ((target_duration * 1000.0) * 0.5)
                .clamp(800.0, (target_duration * 1000.0).max(1500.0));
            if !new_any {
                let jitter: f32 = rng().random_range(0.85..1.15);
                interval_ms = (interval_ms * 0.8 * jitter).max(700.0);
            }
            let interval = Duration::from_millis(interval_ms as u64);
            let wait = interval.saturating_sub(elapsed).max(MIN_POLL_INTERVAL.min(interval));
            if self.or_cancel(tokio::time::sleep(wait)).await.is_none() {
                return;
            }
        }
    }

    /// Emit `Fatal` once the error budget is spent; true while still within it
    fn within_error_budget(&self, consecutive_errors: usize, last_error: &str) -> bool {
        if consecutive_errors < self.settings.max_consecutive_errors {
            return true;
        }
        self.emit(AdaptiveEvent::Fatal(format!(
            "{consecutive_errors} consecutive failures, last: {last_error}"
        )));
        false
    }
}
