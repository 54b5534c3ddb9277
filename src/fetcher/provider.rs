use async_trait::async_trait;

use super::FetchError;
use crate::data::{Leagues, Stream};

/// Where the page reads fixtures and streams from.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// The `fixtures` endpoint, league name -> fixtures.
    async fn fetch_fixtures(&self) -> Result<Leagues, FetchError>;

    /// The `streams/all` endpoint.
    async fn fetch_streams(&self) -> Result<Vec<Stream>, FetchError>;

    /// Human-readable name for logging.
    fn name(&self) -> &str;
}
