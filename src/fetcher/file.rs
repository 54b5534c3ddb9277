use async_trait::async_trait;
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::provider::DataSource;
use super::FetchError;
use crate::data::{parse_fixtures_response, parse_streams_response, Leagues, Stream};

/// Reads the fixture cache file and the streams catalog from disk. Also backs
/// the server's own `fixtures` and `streams/all` endpoints.
#[derive(Debug, Clone)]
pub struct FileDataSource {
    fixtures_path: PathBuf,
    streams_path: PathBuf,
}

impl FileDataSource {
    pub fn new(fixtures_path: impl Into<PathBuf>, streams_path: impl Into<PathBuf>) -> Self {
        FileDataSource {
            fixtures_path: fixtures_path.into(),
            streams_path: streams_path.into(),
        }
    }

    /// Raw fixture cache, `{}` until the refresh task has written it.
    pub async fn fixtures_json(&self) -> Result<Value, FetchError> {
        read_json(&self.fixtures_path, Value::Object(Default::default())).await
    }

    /// Raw streams catalog, `[]` when there is none.
    pub async fn streams_json(&self) -> Result<Value, FetchError> {
        read_json(&self.streams_path, Value::Array(vec![])).await
    }
}

async fn read_json(path: &Path, missing: Value) -> Result<Value, FetchError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(b) => b,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("{} not found, serving empty payload", path.display());
            return Ok(missing);
        }
        Err(source) => {
            return Err(FetchError::Io {
                path: path.display().to_string(),
                source,
            })
        }
    };
    serde_json::from_slice(&bytes).map_err(|e| FetchError::Parse {
        origin: path.display().to_string(),
        reason: e.to_string(),
    })
}

#[async_trait]
impl DataSource for FileDataSource {
    fn name(&self) -> &str {
        "files"
    }

    async fn fetch_fixtures(&self) -> Result<Leagues, FetchError> {
        let raw = self.fixtures_json().await?;
        parse_fixtures_response(&raw).map_err(|e| FetchError::Parse {
            origin: self.fixtures_path.display().to_string(),
            reason: e.to_string(),
        })
    }

    async fn fetch_streams(&self) -> Result<Vec<Stream>, FetchError> {
        let raw = self.streams_json().await?;
        parse_streams_response(&raw).map_err(|e| FetchError::Parse {
            origin: self.streams_path.display().to_string(),
            reason: e.to_string(),
        })
    }
}
