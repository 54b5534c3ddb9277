use clap::Parser;
use std::net::SocketAddr;

/// Football fixtures schedule and stream player
#[derive(Parser, Debug, Clone)]
#[command(name = "matchday-stream", version, about)]
pub struct Config {
    /// Listen address for the page and data endpoints
    #[arg(long, env = "LISTEN_ADDR", default_value = "0.0.0.0:8080")]
    pub listen_addr: String,

    /// Base URL of a server exposing `fixtures` and `streams/all`.
    /// When unset the page reads the local cache and catalog files directly.
    #[arg(long, env = "UPSTREAM_URL")]
    pub upstream_url: Option<String>,

    /// Fixture cache file written by the refresh task
    #[arg(long, env = "FIXTURE_CACHE_PATH", default_value = "fixtures.json")]
    pub fixture_cache_path: String,

    /// Streams catalog file served on `streams/all`
    #[arg(long, env = "STREAMS_PATH", default_value = "streams.json")]
    pub streams_path: String,

    /// Directory served under /static
    #[arg(long, env = "STATIC_DIR", default_value = "www")]
    pub static_dir: String,

    /// Directory holding fixture recordings (hls/<id>.m3u8, dash/<id>.mpd)
    #[arg(long, env = "RECORDINGS_DIR")]
    pub recordings_dir: Option<String>,

    /// Only show this many played fixtures before the upcoming one
    #[arg(long, env = "SCHEDULE_HISTORY")]
    pub schedule_history: Option<usize>,

    /// api-football base URL
    #[arg(
        long,
        env = "FOOTBALL_API_URL",
        default_value = "https://api-football-v1.p.rapidapi.com"
    )]
    pub football_api_url: String,

    /// api-football RapidAPI key; the fixture refresh is disabled without it
    #[arg(long, env = "FOOTBALL_API_KEY")]
    pub football_api_key: Option<String>,

    /// Season to fetch fixtures for
    #[arg(long, env = "FOOTBALL_SEASON", default_value = "2022")]
    pub football_season: String,

    /// api-football team id
    #[arg(long, env = "FOOTBALL_TEAM", default_value = "11075")]
    pub football_team: String,

    /// Fixture cache refresh interval in seconds
    #[arg(long, env = "REFRESH_INTERVAL_SECS", default_value = "3600")]
    pub refresh_interval_secs: u64,
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.listen_addr.parse::<SocketAddr>().is_err() {
            anyhow::bail!("listen_addr '{}' is not a valid socket address", self.listen_addr);
        }
        if let Some(upstream) = &self.upstream_url {
            if url::Url::parse(upstream).is_err() {
                anyhow::bail!("upstream_url '{}' is not a valid URL", upstream);
            }
        }
        if url::Url::parse(&self.football_api_url).is_err() {
            anyhow::bail!("football_api_url '{}' is not a valid URL", self.football_api_url);
        }
        if self.refresh_interval_secs == 0 {
            anyhow::bail!("refresh_interval_secs must be positive");
        }
        Ok(())
    }

    /// The API key, if one is set and non-empty.
    pub fn football_api_key(&self) -> Option<&str> {
        self.football_api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }
}
