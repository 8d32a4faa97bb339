//! HTTP playlist retrieval

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use super::traits::PlaylistFetcher;
use crate::config::FetchConfig;
use crate::errors::{SourceError, SourceResult};
use crate::utils::UrlUtils;

/// Fetches playlist documents with reqwest
///
/// Only the connect phase is bounded unless `request_timeout` is configured.
#[derive(Debug, Clone)]
pub struct HttpPlaylistFetcher {
    client: Client,
    request_timeout: Option<Duration>,
}

impl HttpPlaylistFetcher {
    pub fn new(config: &FetchConfig) -> Self {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            request_timeout: config.request_timeout,
        }
    }

    /// Wrap an existing client, e.g. one shared with the playback engine
    pub fn with_client(client: Client, request_timeout: Option<Duration>) -> Self {
        Self {
            client,
            request_timeout,
        }
    }
}

#[async_trait]
impl PlaylistFetcher for HttpPlaylistFetcher {
    async fn fetch(&self, url: &str) -> SourceResult<String> {
        let safe_url = UrlUtils::obfuscate_credentials(url);
        debug!("Fetching playlist from {}", safe_url);

        let mut request = self.client.get(url);
        if let Some(timeout) = self.request_timeout {
            request = request.timeout(timeout);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SourceError::transport(&safe_url, e.to_string()))?;

        if !response.status().is_success() {
            return Err(SourceError::http(response.status().as_u16(), safe_url));
        }

        let text = response
            .text()
            .await
            .map_err(|e| SourceError::decode(&safe_url, e.to_string()))?;

        debug!("Fetched {} bytes from {}", text.len(), safe_url);
        Ok(text)
    }
}
