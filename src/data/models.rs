use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;

/// League name -> fixtures in arrival order
pub type Leagues = BTreeMap<String, Vec<Fixture>>;

/// Goals per side; either side is `None` before kickoff
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub home: Option<u32>,
    pub away: Option<u32>,
}

impl Score {
    #[cfg(test)]
    pub fn new(home: u32, away: u32) -> Self {
        Score {
            home: Some(home),
            away: Some(away),
        }
    }

    /// `"h - a"` when both sides are known.
    pub fn display(&self) -> Option<String> {
        match (self.home, self.away) {
            (Some(h), Some(a)) => Some(format!("{} - {}", h, a)),
            _ => None,
        }
    }
}

/// A scheduled match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fixture {
    pub league: String,
    pub home: String,
    pub away: String,
    pub venue: String,
    pub score: Score,
    pub kickoff: DateTime<Utc>,
    /// Upstream sports-data API id, used to locate recordings
    pub fixture_id: Option<u32>,
}

impl Fixture {
    pub fn key(&self) -> Option<FixtureKey> {
        self.fixture_id.map(|fixture_id| FixtureKey {
            league: self.league.clone(),
            fixture_id,
        })
    }
}

/// Opaque reference from a rendered schedule row back to its fixture
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FixtureKey {
    pub league: String,
    pub fixture_id: u32,
}

/// Playable rendition format
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Hls,
    Dash,
    Mp4,
    Other(String),
}

impl MediaType {
    /// Parse a type tag as sent by the streams endpoint. Accepts short names
    /// ("hls") as well as MIME types ("application/x-mpegURL").
    pub fn from_tag(tag: &str) -> Self {
        let normalized: String = tag
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "hls" | "application/x-mpegurl" | "application/vnd.apple.mpegurl" => MediaType::Hls,
            "dash" | "application/dash+xml" => MediaType::Dash,
            "mp4" | "video/mp4" => MediaType::Mp4,
            _ => MediaType::Other(tag.trim().to_string()),
        }
    }

    /// Infer the type from a URL or file extension.
    pub fn from_url(url: &str) -> Option<Self> {
        let path = url.split(['?', '#']).next().unwrap_or(url);
        let ext = path.rsplit_once('.')?.1.to_lowercase();
        match ext.as_str() {
            "m3u8" | "m3u" => Some(MediaType::Hls),
            "mpd" | "dash" => Some(MediaType::Dash),
            "mp4" => Some(MediaType::Mp4),
            _ => None,
        }
    }

    pub fn mime(&self) -> &str {
        match self {
            MediaType::Hls => "application/x-mpegURL",
            MediaType::Dash => "application/dash+xml",
            MediaType::Mp4 => "video/mp4",
            MediaType::Other(s) => s,
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaType::Hls => f.write_str("hls"),
            MediaType::Dash => f.write_str("dash"),
            MediaType::Mp4 => f.write_str("mp4"),
            MediaType::Other(s) => f.write_str(s),
        }
    }
}

/// One playable rendition of a stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    #[serde(rename = "type")]
    pub media_type: MediaType,
    pub url: String,
}

impl Source {
    pub fn new(media_type: MediaType, url: impl Into<String>) -> Self {
        Source {
            media_type,
            url: url.into(),
        }
    }
}

/// A watchable video item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stream {
    pub description: String,
    pub date: DateTime<Utc>,
    pub live: bool,
    /// Most preferred rendition first
    pub sources: Vec<Source>,
}

impl Stream {
    /// Content-derived key. Two streams with the same description, date,
    /// live flag and sources get the same key, whatever their position.
    pub fn key(&self) -> StreamKey {
        let mut hasher = Sha256::new();
        hasher.update(self.description.as_bytes());
        hasher.update([0]);
        hasher.update(self.date.timestamp().to_be_bytes());
        hasher.update([self.live as u8]);
        for source in &self.sources {
            hasher.update(source.media_type.to_string().as_bytes());
            hasher.update([0]);
            hasher.update(source.url.as_bytes());
            hasher.update([0]);
        }
        let digest = hasher.finalize();
        let hex: String = digest[..8].iter().map(|b| format!("{:02x}", b)).collect();
        StreamKey(hex)
    }
}

/// Opaque reference from a rendered stream row back to its stream
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StreamKey(String);

impl StreamKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for StreamKey {
    fn from(s: String) -> Self {
        StreamKey(s)
    }
}

impl fmt::Display for StreamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
