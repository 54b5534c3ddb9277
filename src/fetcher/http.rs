use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::provider::DataSource;
use super::FetchError;
use crate::data::{parse_fixtures_response, parse_streams_response, Leagues, Stream};

/// Reads both endpoints from a running server.
pub struct HttpDataSource {
    http: Client,
    fixtures_url: Url,
    streams_url: Url,
}

impl HttpDataSource {
    pub fn new(base_url: &str) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .context("Failed to build HTTP client")?;

        // Url::join drops the last path segment unless the base ends in '/'
        let mut base = base_url.to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base = Url::parse(&base).with_context(|| format!("Invalid upstream URL '{}'", base_url))?;

        Ok(HttpDataSource {
            http,
            fixtures_url: base.join("fixtures")?,
            streams_url: base.join("streams/all")?,
        })
    }

    async fn get_json(&self, url: &Url) -> Result<Value, FetchError> {
        debug!("GET {}", url);
        let resp = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|source| FetchError::Network {
                url: url.to_string(),
                source,
            })?;

        if !resp.status().is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: resp.status().as_u16(),
            });
        }

        resp.json::<Value>().await.map_err(|e| FetchError::Parse {
            origin: url.to_string(),
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl DataSource for HttpDataSource {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch_fixtures(&self) -> Result<Leagues, FetchError> {
        let raw = self.get_json(&self.fixtures_url).await?;
        parse_fixtures_response(&raw).map_err(|e| FetchError::Parse {
            origin: self.fixtures_url.to_string(),
            reason: e.to_string(),
        })
    }

    async fn fetch_streams(&self) -> Result<Vec<Stream>, FetchError> {
        let raw = self.get_json(&self.streams_url).await?;
        parse_streams_response(&raw).map_err(|e| FetchError::Parse {
            origin: self.streams_url.to_string(),
            reason: e.to_string(),
        })
    }
}
