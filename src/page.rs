//! Page controller: holds the latest data snapshot and renders the page for
//! one visitor's playback selection.
//!
//! Playback state never lives here. Each request builds a fresh
//! [`PlaybackSelector`] from the [`Selection`] carried in its URL, so one
//! visitor's choice is invisible to every other visitor.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::data::{FixtureKey, PageData, StreamKey};
use crate::fetcher::{FetchOutcome, LoadReport};
use crate::player::{PlaybackSelector, Player, PlayerSession, PlayerSource, SelectError, Title};
use crate::recordings::RecordingLookup;
use crate::render::{render_league_tables, render_schedule, render_streams, schedule_rows, stream_rows};

/// What the browser needs to drive video.js
#[derive(Debug, Clone, Serialize)]
pub struct PlayerState {
    pub title: Option<Title>,
    pub visible: bool,
    pub playing: bool,
    pub sources: Vec<PlayerSource>,
}

pub type Session = PlaybackSelector<PlayerSession>;

/// A visitor's playback choice, as query parameters of the page URL.
/// At most one of stream key, index or fixture is honoured, in that order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Selection {
    pub stream: Option<String>,
    pub index: Option<i64>,
    pub league: Option<String>,
    pub fixture: Option<u32>,
}

impl Selection {
    pub fn stream(key: &StreamKey) -> Self {
        Selection {
            stream: Some(key.as_str().to_string()),
            ..Default::default()
        }
    }

    pub fn index(index: i64) -> Self {
        Selection {
            index: Some(index),
            ..Default::default()
        }
    }

    pub fn fixture(key: &FixtureKey) -> Self {
        Selection {
            league: Some(key.league.clone()),
            fixture: Some(key.fixture_id),
            ..Default::default()
        }
    }

    /// Page URL that replays this selection.
    pub fn location(&self) -> String {
        let mut query = url::form_urlencoded::Serializer::new(String::new());
        if let Some(key) = &self.stream {
            query.append_pair("stream", key);
        } else if let Some(index) = self.index {
            query.append_pair("index", &index.to_string());
        } else if let (Some(league), Some(id)) = (&self.league, self.fixture) {
            query.append_pair("league", league);
            query.append_pair("fixture", &id.to_string());
        }
        let query = query.finish();
        if query.is_empty() {
            "/".to_string()
        } else {
            format!("/?{}", query)
        }
    }
}

pub struct Page {
    data: PageData,
    /// Sequence number of the last applied load
    applied: u64,
    recordings: Arc<dyn RecordingLookup>,
    history: Option<usize>,
}

impl Page {
    pub fn new(recordings: Arc<dyn RecordingLookup>, history: Option<usize>) -> Self {
        Page {
            data: PageData::default(),
            applied: 0,
            recordings,
            history,
        }
    }

    pub fn data(&self) -> &PageData {
        &self.data
    }

    /// Apply a finished load unless a later-started one was applied first.
    pub fn apply_load(&mut self, outcome: FetchOutcome) -> Option<LoadReport> {
        outcome.apply_if_newer(&mut self.data, &mut self.applied)
    }

    /// A player nobody has selected anything on yet: hidden, no sources.
    pub fn session(&self) -> Session {
        PlaybackSelector::new(PlayerSession::default())
    }

    /// Run `selection` against the current snapshot. An empty selection is a
    /// no-op; a failed one leaves `session` untouched.
    pub fn select(&self, session: &mut Session, selection: &Selection) -> Result<(), SelectError> {
        if let Some(key) = &selection.stream {
            session.select_stream_by_key(&self.data, &StreamKey::from(key.clone()))?;
        } else if let Some(index) = selection.index {
            session.select_stream(&self.data, index)?;
        } else if let (Some(league), Some(fixture_id)) = (&selection.league, selection.fixture) {
            let key = FixtureKey {
                league: league.clone(),
                fixture_id,
            };
            session.select_fixture(&self.data, &key, self.recordings.as_ref())?;
        }
        Ok(())
    }

    pub fn player_state(&self, session: &Session) -> PlayerState {
        let player = session.player();
        PlayerState {
            title: session.title().cloned(),
            visible: session.is_video_visible(),
            playing: player.is_playing(),
            sources: player.sources().to_vec(),
        }
    }

    /// `<tr>` rows of one league's schedule table.
    pub fn schedule_fragment(&self, league: &str, now: DateTime<Utc>) -> String {
        let rows = schedule_rows(
            &self.data.leagues,
            league,
            now,
            self.recordings.as_ref(),
            self.history,
        );
        render_schedule(&rows)
    }

    /// `<tr>` rows of the streams table.
    pub fn streams_fragment(&self) -> String {
        render_streams(&stream_rows(&self.data.streams))
    }

    pub fn render(&self, session: &Session, now: DateTime<Utc>) -> String {
        let title = session.title().map(Title::to_html).unwrap_or_default();
        let player_class = if session.is_video_visible() {
            ""
        } else {
            " d-none"
        };
        let autoplay = session.player().current_source().is_some();
        // TODO: show a countdown to kickoff of the upcoming fixture next to the title
        format!(
            r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1, shrink-to-fit=no">
<link rel="stylesheet" href="https://cdn.jsdelivr.net/npm/bootstrap@4.3.1/dist/css/bootstrap.min.css">
<link rel="stylesheet" href="https://vjs.zencdn.net/7.18.1/video-js.css">
<title>Matchday Streaming</title>
<style>tr.disabled {{ opacity: .5; }}</style>
</head>
<body>
<nav class="navbar navbar-expand-md navbar-dark bg-dark"><a class="navbar-brand" href="/">Matchday Streaming</a></nav>
<div class="container pt-4">
  <div id="video_container" class="row{player_class}">
    <h4 id="current_title" class="col-12">{title}</h4>
    <div class="col-12 embed-responsive embed-responsive-16by9">
      <video-js id="video_player" class="vjs-default-skin embed-responsive-item" controls preload="auto" data-autoplay="{autoplay}">{sources}</video-js>
    </div>
  </div>
  <div class="row pt-5">
    <h4 class="col-12">Streams</h4>
    <table class="table table-responsive-md table-hover">
      <thead><tr><th scope="col">Date</th><th scope="col">Description</th><th scope="col"></th></tr></thead>
      <tbody id="streams_table">{streams}</tbody>
    </table>
  </div>
  <div class="row pt-5"><div class="col-12" id="schedule">{schedule}</div></div>
</div>
<script src="https://vjs.zencdn.net/7.18.1/video.min.js"></script>
<script src="/static/player.js"></script>
</body>
</html>"#,
            player_class = player_class,
            title = title,
            autoplay = autoplay,
            sources = session.player().source_tags(),
            streams = self.streams_fragment(),
            schedule = render_league_tables(
                &self.data.leagues,
                now,
                self.recordings.as_ref(),
                self.history
            ),
        )
    }
}
