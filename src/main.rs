use anyhow::Result;
use clap::{Parser, Subcommand};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use m3u_player::{
    catalog::{filter_categories, group_counts, in_group, paginate, search},
    config::Config,
    ingestor::{AggregationReport, CatalogAggregator},
    models::{CatalogType, PlaybackStatus},
    player::{HeadlessSink, HlsAdaptiveFactory, PlaybackEngine},
    sources::HttpPlaylistFetcher,
    streaming::{PlaybackRoute, StreamClassifier},
};

#[derive(Parser)]
#[command(name = "m3u-player")]
#[command(version = "0.1.0")]
#[command(about = "Aggregates M3U playlists into a channel catalog and probes stream playback")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Aggregate the configured sources and print one page of channels
    Catalog {
        /// Catalog type (tv or movie)
        #[arg(short = 't', long = "type", default_value = "tv")]
        catalog_type: String,

        /// Case-insensitive name filter
        #[arg(short, long)]
        search: Option<String>,

        /// Only channels in this group
        #[arg(short, long)]
        group: Option<String>,

        /// 1-based page number
        #[arg(short, long, default_value_t = 1)]
        page: usize,
    },

    /// Aggregate the configured sources and print group counts
    Categories {
        #[arg(short = 't', long = "type", default_value = "tv")]
        catalog_type: String,

        /// Case-insensitive group name filter
        #[arg(short, long)]
        filter: Option<String>,
    },

    /// Print how a stream URL would be played
    Classify { url: String },

    /// Play a URL against a headless sink and report what happened
    Probe {
        url: String,

        /// Stop after this many adaptive segments
        #[arg(long, default_value_t = 3)]
        segments: usize,

        /// Give up after this long
        #[arg(long, default_value = "30s", value_parser = humantime::parse_duration)]
        timeout: Duration,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_filter = format!("m3u_player={}", cli.log_level);
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| log_filter.into());
    let registry = tracing_subscriber::registry().with(env_filter);
    if cli.json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    info!("Starting M3U Player v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::load_from_file(&cli.config)?;
    info!("Configuration loaded from: {}", cli.config);

    match cli.command {
        Command::Catalog {
            catalog_type,
            search: query,
            group,
            page,
        } => {
            let report = aggregate(&config, catalog_type.parse()?).await?;
            let mut matches = match group.as_deref() {
                Some(group) => in_group(&report.catalog, group),
                None => report.catalog.iter().collect(),
            };
            if let Some(query) = query.as_deref() {
                let hits = search(&report.catalog, query);
                matches.retain(|r| hits.contains(r));
            }
            let page = paginate(&matches, page, config.catalog.page_size);
            print_json(&json!({
                "page": page,
                "sources": source_summary(&report),
                "duplicates_removed": report.duplicates_removed,
            }))?;
        }
        Command::Categories {
            catalog_type,
            filter,
        } => {
            let report = aggregate(&config, catalog_type.parse()?).await?;
            let counts = group_counts(&report.catalog);
            let counts = match filter.as_deref() {
                Some(q) => filter_categories(&counts, q),
                None => counts,
            };
            print_json(&json!({
                "total": report.catalog.len(),
                "categories": counts,
            }))?;
        }
        Command::Classify { url } => {
            let route = StreamClassifier::new(&config.viewer).classify(&url);
            print_json(&route)?;
        }
        Command::Probe {
            url,
            segments,
            timeout,
        } => probe(&config, &url, segments, timeout).await?,
    }

    Ok(())
}

async fn aggregate(config: &Config, catalog_type: CatalogType) -> Result<AggregationReport> {
    let fetcher = Arc::new(HttpPlaylistFetcher::new(&config.fetch));
    let aggregator = CatalogAggregator::new(fetcher);
    Ok(aggregator.aggregate_catalog(config, catalog_type).await?)
}

fn source_summary(report: &AggregationReport) -> serde_json::Value {
    report
        .sources
        .iter()
        .map(|s| {
            json!({
                "url": s.url,
                "records": s.records,
                "error": s.error.as_ref().map(ToString::to_string),
            })
        })
        .collect()
}

async fn probe(config: &Config, url: &str, max_segments: usize, timeout: Duration) -> Result<()> {
    let factory = Arc::new(HlsAdaptiveFactory::new(&config.fetch, &config.playback));
    let mut engine = PlaybackEngine::new(
        StreamClassifier::new(&config.viewer),
        factory,
        &config.playback,
    );
    let sink = HeadlessSink::new();
    engine.attach_sink(Box::new(sink.clone()));

    let route = engine.present(url, url)?;
    if matches!(route, PlaybackRoute::Adaptive) {
        let deadline = tokio::time::sleep(timeout);
        tokio::pin!(deadline);

        loop {
            if engine.status() == PlaybackStatus::Error || sink.state().segments >= max_segments {
                break;
            }
            tokio::select! {
                _ = &mut deadline => {
                    warn!("Probe timed out after {:?}", timeout);
                    break;
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Interrupted");
                    break;
                }
                more = engine.step() => if !more { break },
            }
        }
    } else {
        info!("{:?} route needs a real output to play, reporting classification only", route.strategy());
    }

    let snapshot = engine.snapshot();
    let state = sink.state();
    engine.teardown();

    print_json(&json!({
        "route": route,
        "snapshot": snapshot,
        "segments": state.segments,
        "buffered_bytes": state.buffered_bytes,
        "loads": state.loads,
    }))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
