//! Background refresh of the fixture cache file from api-football.
//!
//! The cache holds the payload served by the `fixtures` endpoint:
//! `{ "<league>": [ {home, away, venue, score, timestamp, fixture_id}, ... ] }`.

use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;

/// Client for the api-football fixtures endpoint (RapidAPI).
#[derive(Clone)]
pub struct FootballApi {
    http: Client,
    api_url: String,
    /// `X-RapidAPI-Host` value: the API URL's host name, without port
    host: String,
    api_key: String,
    season: String,
    team: String,
}

impl FootballApi {
    pub fn new(api_url: &str, api_key: String, season: &str, team: &str) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to build HTTP client")?;
        let host = Url::parse(api_url)
            .with_context(|| format!("invalid football API URL {}", api_url))?
            .host_str()
            .with_context(|| format!("football API URL {} has no host", api_url))?
            .to_string();
        Ok(FootballApi {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            host,
            api_key,
            season: season.to_string(),
            team: team.to_string(),
        })
    }

    /// Fetch the season's fixtures, grouped per league.
    pub async fn fetch_fixtures(&self) -> Result<Value> {
        let url = format!("{}/v3/fixtures", self.api_url);
        debug!("Downloading fixtures from {} (season={}, team={})", url, self.season, self.team);

        let resp = self
            .http
            .get(&url)
            .query(&[("season", self.season.as_str()), ("team", self.team.as_str())])
            .header("X-RapidAPI-Host", &self.host)
            .header("X-RapidAPI-Key", &self.api_key)
            .send()
            .await
            .context("football API request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("football API error {}: {}", status, body);
        }

        let raw: Value = resp
            .json()
            .await
            .context("not a valid json response body")?;
        to_cache_model(&raw)
    }
}

/// Convert an api-football `/v3/fixtures` response into the cache payload.
pub fn to_cache_model(raw: &Value) -> Result<Value> {
    let items = raw["response"]
        .as_array()
        .with_context(|| format!("no 'response' array in {}", raw))?;

    let mut leagues: Map<String, Value> = Map::new();
    for fixt in items {
        let league = match fixt["league"]["name"].as_str() {
            Some(l) => l,
            None => {
                warn!("Skipping fixture without league: {}", fixt["fixture"]["id"]);
                continue;
            }
        };

        let score = match (fixt["goals"]["home"].as_u64(), fixt["goals"]["away"].as_u64()) {
            (Some(h), Some(a)) => format!("{} - {}", h, a),
            _ => String::new(),
        };

        let entry = json!({
            "home": fixt["teams"]["home"]["name"],
            "away": fixt["teams"]["away"]["name"],
            "venue": fixt["fixture"]["venue"]["name"],
            "score": score,
            "timestamp": fixt["fixture"]["timestamp"],
            "fixture_id": fixt["fixture"]["id"],
        });

        if let Some(list) = leagues
            .entry(league.to_string())
            .or_insert_with(|| Value::Array(vec![]))
            .as_array_mut()
        {
            list.push(entry);
        }
    }

    Ok(Value::Object(leagues))
}

/// Write the cache through a temp file so readers never see a partial file.
pub async fn write_cache(path: &Path, payload: &Value) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let tmp = path.with_extension("json.tmp");
    let bytes = serde_json::to_vec(payload)?;
    tokio::fs::write(&tmp, bytes)
        .await
        .with_context(|| format!("writing {}", tmp.display()))?;
    tokio::fs::rename(&tmp, path)
        .await
        .with_context(|| format!("renaming {} to {}", tmp.display(), path.display()))?;
    Ok(())
}

/// One refresh round: fetch, convert, overwrite the cache.
pub async fn refresh_once(api: &FootballApi, cache_path: &Path) -> Result<usize> {
    let payload = api.fetch_fixtures().await?;
    let count = payload
        .as_object()
        .map(|o| o.values().filter_map(Value::as_array).map(Vec::len).sum())
        .unwrap_or(0);
    write_cache(cache_path, &payload).await?;
    Ok(count)
}

/// Spawns the periodic refresh. The first round runs immediately. Failures
/// are logged and the previous cache file stays in place.
pub fn spawn_refresh(api: FootballApi, cache_path: PathBuf, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            "Fixture refresh started (cache={}, interval={:?})",
            cache_path.display(),
            every
        );
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            interval.tick().await;
            match refresh_once(&api, &cache_path).await {
                Ok(n) => info!("Fixture cache refreshed: {} fixtures", n),
                Err(e) => warn!("Fixture refresh failed, keeping previous cache: {:#}", e),
            }
        }
    })
}
