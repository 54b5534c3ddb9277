pub mod file;
pub mod http;
pub mod provider;

pub use file::FileDataSource;
pub use http::HttpDataSource;
pub use provider::DataSource;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::data::{Leagues, PageData, Stream};

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("invalid payload from {origin}: {reason}")]
    Parse { origin: String, reason: String },
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Which halves of the page data a load replaced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub fixtures_replaced: bool,
    pub streams_replaced: bool,
}

/// Results of one fetch round, not yet applied to page state.
#[derive(Debug)]
pub struct FetchOutcome {
    /// Order in which the load started; 1 for the first
    seq: u64,
    source: String,
    fixtures: Result<Leagues, FetchError>,
    streams: Result<Vec<Stream>, FetchError>,
}

impl FetchOutcome {
    /// Apply only when no later-started load was applied already. `applied`
    /// holds the sequence number of the last applied load.
    pub fn apply_if_newer(self, data: &mut PageData, applied: &mut u64) -> Option<LoadReport> {
        if self.seq <= *applied {
            debug!(
                "[{}] dropping load #{}, #{} already applied",
                self.source, self.seq, applied
            );
            return None;
        }
        *applied = self.seq;
        Some(self.apply(data))
    }

    /// Replace each collection that fetched successfully; keep the previous
    /// one otherwise.
    pub fn apply(self, data: &mut PageData) -> LoadReport {
        let mut report = LoadReport::default();

        match self.fixtures {
            Ok(leagues) => {
                data.leagues = leagues;
                report.fixtures_replaced = true;
            }
            Err(e) => warn!("[{}] fixtures fetch failed, keeping previous: {}", self.source, e),
        }

        match self.streams {
            Ok(streams) => {
                data.streams = streams;
                report.streams_replaced = true;
            }
            Err(e) => warn!("[{}] streams fetch failed, keeping previous: {}", self.source, e),
        }

        info!(
            "Page data loaded ({} leagues, {} streams, {:?})",
            data.leagues.len(),
            data.streams.len(),
            report
        );
        report
    }
}

/// Issues both reads of a page load concurrently.
#[derive(Clone)]
pub struct DataFetcher {
    source: Arc<dyn DataSource>,
    loads: Arc<AtomicU64>,
}

impl DataFetcher {
    pub fn new(source: Arc<dyn DataSource>) -> Self {
        DataFetcher {
            source,
            loads: Arc::new(AtomicU64::new(0)),
        }
    }

    pub async fn fetch(&self) -> FetchOutcome {
        let seq = self.loads.fetch_add(1, Ordering::Relaxed) + 1;
        let (fixtures, streams) =
            tokio::join!(self.source.fetch_fixtures(), self.source.fetch_streams());
        FetchOutcome {
            seq,
            source: self.source.name().to_string(),
            fixtures,
            streams,
        }
    }
}
