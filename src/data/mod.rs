pub mod models;

pub use models::{Fixture, FixtureKey, Leagues, MediaType, Score, Source, Stream, StreamKey};

use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// The page's view of both endpoints. Each half is replaced wholesale.
#[derive(Debug, Clone, Default)]
pub struct PageData {
    pub leagues: Leagues,
    pub streams: Vec<Stream>,
}

impl PageData {
    /// Stream at a list position; negative or past-the-end yields `None`.
    pub fn stream_at(&self, index: i64) -> Option<&Stream> {
        usize::try_from(index).ok().and_then(|i| self.streams.get(i))
    }

    pub fn stream_by_key(&self, key: &StreamKey) -> Option<&Stream> {
        self.streams.iter().find(|s| &s.key() == key)
    }

    pub fn fixture_by_key(&self, key: &FixtureKey) -> Option<&Fixture> {
        self.leagues
            .get(&key.league)?
            .iter()
            .find(|f| f.fixture_id == Some(key.fixture_id))
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("expected {expected} at top level, got {got}")]
    UnexpectedShape { expected: &'static str, got: String },
}

fn shape_of(v: &Value) -> String {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
    .to_string()
}

// ── Fixtures ──────────────────────────────────────────────────────────────────

/// Parse the `fixtures` payload: `{ "<league>": [ {fixture}, ... ], ... }`.
///
/// Entries without team names or a kickoff timestamp are skipped.
pub fn parse_fixtures_response(raw: &Value) -> Result<Leagues, ParseError> {
    let obj = raw.as_object().ok_or_else(|| ParseError::UnexpectedShape {
        expected: "object",
        got: shape_of(raw),
    })?;

    let mut leagues = Leagues::new();
    for (league, entries) in obj {
        let fixtures: Vec<Fixture> = entries
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| parse_fixture(league, item))
                    .collect()
            })
            .unwrap_or_default();
        debug!("league '{}': {} fixtures", league, fixtures.len());
        leagues.insert(league.clone(), fixtures);
    }
    Ok(leagues)
}

fn parse_fixture(league: &str, item: &Value) -> Option<Fixture> {
    let home = item["home"].as_str()?.to_string();
    let away = item["away"].as_str()?.to_string();
    let venue = item["venue"].as_str().unwrap_or("").to_string();
    let kickoff = epoch_field(&item["timestamp"])?;
    let fixture_id = as_u64(&item["fixture_id"]).and_then(|v| u32::try_from(v).ok());

    Some(Fixture {
        league: league.to_string(),
        home,
        away,
        venue,
        score: parse_score(item),
        kickoff,
        fixture_id,
    })
}

/// Score as `"h - a"`, `goals: {home, away}` or `home_goals`/`away_goals`.
fn parse_score(item: &Value) -> Score {
    if let Some(s) = item["score"].as_str() {
        return parse_score_text(s);
    }
    if item["goals"].is_object() {
        return Score {
            home: as_u32(&item["goals"]["home"]),
            away: as_u32(&item["goals"]["away"]),
        };
    }
    if item["score"].is_object() {
        return Score {
            home: as_u32(&item["score"]["home"]),
            away: as_u32(&item["score"]["away"]),
        };
    }
    Score {
        home: as_u32(&item["home_goals"]),
        away: as_u32(&item["away_goals"]),
    }
}

fn parse_score_text(s: &str) -> Score {
    let mut parts = s.split(['-', '–', ':']);
    let home = parts.next().and_then(|p| p.trim().parse().ok());
    let away = parts.next().and_then(|p| p.trim().parse().ok());
    Score { home, away }
}

// ── Streams ───────────────────────────────────────────────────────────────────

/// Parse the `streams/all` payload: an array of stream objects (an object
/// keyed by id is accepted too, taken in key order).
pub fn parse_streams_response(raw: &Value) -> Result<Vec<Stream>, ParseError> {
    let items: Vec<&Value> = match raw {
        Value::Array(a) => a.iter().collect(),
        Value::Object(o) => o.values().collect(),
        other => {
            return Err(ParseError::UnexpectedShape {
                expected: "array",
                got: shape_of(other),
            })
        }
    };

    Ok(items.into_iter().filter_map(parse_stream).collect())
}

fn parse_stream(item: &Value) -> Option<Stream> {
    let description = item["description"]
        .as_str()
        .or_else(|| item["title"].as_str())?
        .to_string();
    let date = epoch_field(&item["date"]).or_else(|| epoch_field(&item["timestamp"]))?;
    let live = item["live"].as_bool().unwrap_or(false);
    let sources = item["sources"]
        .as_array()
        .map(|a| a.iter().filter_map(parse_source).collect())
        .unwrap_or_default();

    Some(Stream {
        description,
        date,
        live,
        sources,
    })
}

fn parse_source(item: &Value) -> Option<Source> {
    let url = item["url"].as_str()?.to_string();
    let media_type = item["type"]
        .as_str()
        .or_else(|| item["typ"].as_str())
        .map(MediaType::from_tag)
        .or_else(|| MediaType::from_url(&url))?;
    Some(Source { media_type, url })
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn as_u64(v: &Value) -> Option<u64> {
    v.as_u64()
        .or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
}

fn as_u32(v: &Value) -> Option<u32> {
    as_u64(v).and_then(|n| u32::try_from(n).ok())
}

/// Epoch seconds as an integer, a float (fraction dropped) or a numeric string.
fn epoch_field(v: &Value) -> Option<DateTime<Utc>> {
    let secs = v
        .as_i64()
        .or_else(|| v.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
        .or_else(|| {
            v.as_str().and_then(|s| {
                let s = s.trim();
                s.parse()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
            })
        })?;
    Utc.timestamp_opt(secs, 0).single()
}
