//! Application configuration
//!
//! Loaded from a TOML file (`--config`, `CONFIG_FILE`, or `config.toml`). A
//! default file is written when none exists. Durations accept humantime
//! strings (`"15s"`) or plain integer seconds.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

pub mod defaults;
pub mod duration_serde;

use defaults::*;

use crate::errors::{AppError, AppResult};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub playback: PlaybackConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub viewer: ViewerConfig,
}

/// Ordered playlist URLs per catalog type. Order here is merge order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourcesConfig {
    #[serde(default)]
    pub tv: Vec<String>,
    #[serde(default)]
    pub movie: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    #[serde(
        default = "default_connect_timeout",
        with = "duration_serde::duration"
    )]
    pub connect_timeout: Duration,
    /// Whole-request bound for playlist retrieval. Unset leaves it to the
    /// network stack.
    #[serde(
        default,
        with = "duration_serde::option_duration",
        skip_serializing_if = "Option::is_none"
    )]
    pub request_timeout: Option<Duration>,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Bound on every manifest and segment request made by the adaptive engine
    #[serde(
        default = "default_segment_timeout",
        with = "duration_serde::duration"
    )]
    pub segment_timeout: Duration,
    #[serde(
        default = "default_controls_hide_delay",
        with = "duration_serde::duration"
    )]
    pub controls_hide_delay: Duration,
    #[serde(default = "default_seek_step", with = "duration_serde::duration")]
    pub seek_step: Duration,
    #[serde(default = "default_max_playlist_bytes")]
    pub max_playlist_bytes: usize,
    #[serde(default = "default_max_consecutive_errors")]
    pub max_consecutive_errors: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewerConfig {
    #[serde(default = "default_viewer_endpoint")]
    pub endpoint: String,
}

fn default_connect_timeout() -> Duration {
    defaults::duration(DEFAULT_CONNECT_TIMEOUT)
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_segment_timeout() -> Duration {
    defaults::duration(DEFAULT_SEGMENT_TIMEOUT)
}

fn default_controls_hide_delay() -> Duration {
    defaults::duration(DEFAULT_CONTROLS_HIDE_DELAY)
}

fn default_seek_step() -> Duration {
    defaults::duration(DEFAULT_SEEK_STEP)
}

fn default_max_playlist_bytes() -> usize {
    DEFAULT_MAX_PLAYLIST_BYTES
}

fn default_max_consecutive_errors() -> usize {
    DEFAULT_MAX_CONSECUTIVE_ERRORS
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_viewer_endpoint() -> String {
    DEFAULT_VIEWER_ENDPOINT.to_string()
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            connect_timeout: default_connect_timeout(),
            request_timeout: None,
            user_agent: default_user_agent(),
        }
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            segment_timeout: default_segment_timeout(),
            controls_hide_delay: default_controls_hide_delay(),
            seek_step: default_seek_step(),
            max_playlist_bytes: default_max_playlist_bytes(),
            max_consecutive_errors: default_max_consecutive_errors(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            endpoint: default_viewer_endpoint(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_file =
            std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".to_string());
        Self::load_from_file(&config_file)
    }

    pub fn load_from_file(config_file: &str) -> Result<Self> {
        if std::path::Path::new(&config_file).exists() {
            let contents = std::fs::read_to_string(config_file)?;
            let config: Self = toml::from_str(&contents)?;
            config.validate()?;
            Ok(config)
        } else {
            let default_config = Self::default();
            let contents = toml::to_string_pretty(&default_config)?;
            std::fs::write(config_file, contents)?;
            info!("Created default config file: {}", config_file);
            Ok(default_config)
        }
    }
}

impl Config {
    /// Reject values the engine cannot work with
    pub fn validate(&self) -> AppResult<()> {
        if self.catalog.page_size == 0 {
            return Err(AppError::configuration("catalog.page_size must be at least 1"));
        }
        if self.playback.max_consecutive_errors == 0 {
            return Err(AppError::configuration(
                "playback.max_consecutive_errors must be at least 1",
            ));
        }
        if self.playback.segment_timeout.is_zero() {
            return Err(AppError::configuration(
                "playback.segment_timeout must be greater than zero",
            ));
        }
        if url::Url::parse(&self.viewer.endpoint).is_err() {
            return Err(AppError::configuration(format!(
                "viewer.endpoint is not a valid URL: {}",
                self.viewer.endpoint
            )));
        }
        Ok(())
    }
}
