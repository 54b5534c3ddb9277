use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::info;

mod config;
mod data;
mod fetcher;
mod page;
mod player;
mod recordings;
mod refresh;
mod render;
mod web;

use config::Config;
use fetcher::{DataFetcher, DataSource, FileDataSource, HttpDataSource};
use page::Page;
use recordings::{NoRecordings, RecordingLookup, RecordingsDir};
use refresh::{spawn_refresh, FootballApi};
use web::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise tracing / logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    config.validate()?;

    let files = FileDataSource::new(&config.fixture_cache_path, &config.streams_path);

    // The page reads from an upstream server when one is configured, from
    // the local files otherwise.
    let source: Arc<dyn DataSource> = match &config.upstream_url {
        Some(url) => {
            info!("Page data from upstream {}", url);
            Arc::new(HttpDataSource::new(url)?)
        }
        None => {
            info!(
                "Page data from {} and {}",
                config.fixture_cache_path, config.streams_path
            );
            Arc::new(files.clone())
        }
    };

    let recordings_dir = config.recordings_dir.as_ref().map(PathBuf::from);
    let recordings: Arc<dyn RecordingLookup> = match &recordings_dir {
        Some(dir) => {
            info!("Recordings served from {}", dir.display());
            Arc::new(RecordingsDir::new(dir))
        }
        None => Arc::new(NoRecordings),
    };

    // Fixture cache refresh
    match config.football_api_key() {
        Some(key) => {
            let api = FootballApi::new(
                &config.football_api_url,
                key.to_string(),
                &config.football_season,
                &config.football_team,
            )?;
            spawn_refresh(
                api,
                PathBuf::from(&config.fixture_cache_path),
                Duration::from_secs(config.refresh_interval_secs),
            );
        }
        None => info!("No football API key set, fixture cache refresh disabled"),
    }

    let state = AppState {
        page: RwLock::new(Page::new(recordings, config.schedule_history)),
        fetcher: DataFetcher::new(source),
        files,
    };
    let app = web::router(state, PathBuf::from(&config.static_dir), recordings_dir);

    let addr: SocketAddr = config.listen_addr.parse()?;
    info!("Listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;

    axum::serve(listener, app).await?;

    Ok(())
}
