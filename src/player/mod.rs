//! Playback selection: resolve a clicked row, update the title and hand an
//! ordered source list to the embedded player.

pub mod session;

pub use session::PlayerSession;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::data::{FixtureKey, PageData, Source, Stream, StreamKey};
use crate::recordings::{recording_sources, RecordingLookup};
use crate::render::escape;

/// One entry of the player's source list, in the shape video.js expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerSource {
    #[serde(rename = "type")]
    pub mime: String,
    pub src: String,
}

impl From<&Source> for PlayerSource {
    fn from(s: &Source) -> Self {
        PlayerSource {
            mime: s.media_type.mime().to_string(),
            src: s.url.clone(),
        }
    }
}

/// The embedded video player. Sources are tried in the order given.
pub trait Player: Send + Sync {
    fn set_sources(&mut self, sources: Vec<PlayerSource>);
    fn play(&mut self);
    fn current_source(&self) -> Option<&PlayerSource>;
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectError {
    #[error("no such stream: {0}")]
    NoSuchStream(String),
    #[error("no recording for fixture {league}/{fixture_id}")]
    NoSuchFixture { league: String, fixture_id: u32 },
}

/// Text above the player
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Title {
    pub text: String,
    pub live: bool,
}

impl Title {
    pub fn to_html(&self) -> String {
        let mut out = escape(&self.text);
        if self.live {
            out.push_str(r#" <span class="badge badge-danger">Live</span>"#);
        }
        out
    }
}

pub struct PlaybackSelector<P: Player> {
    player: P,
    title: Option<Title>,
    video_visible: bool,
}

impl<P: Player> PlaybackSelector<P> {
    pub fn new(player: P) -> Self {
        PlaybackSelector {
            player,
            title: None,
            video_visible: false,
        }
    }

    /// Select the stream at `index` of the current list. Out-of-range indexes
    /// leave the player untouched.
    pub fn select_stream(&mut self, data: &PageData, index: i64) -> Result<&Title, SelectError> {
        let stream = data
            .stream_at(index)
            .ok_or_else(|| SelectError::NoSuchStream(index.to_string()))?;
        Ok(self.play_stream(stream))
    }

    /// Select a stream by the key rendered into its row.
    pub fn select_stream_by_key(
        &mut self,
        data: &PageData,
        key: &StreamKey,
    ) -> Result<&Title, SelectError> {
        let stream = data
            .stream_by_key(key)
            .ok_or_else(|| SelectError::NoSuchStream(key.to_string()))?;
        Ok(self.play_stream(stream))
    }

    /// Play the recording of a finished fixture.
    pub fn select_fixture(
        &mut self,
        data: &PageData,
        key: &FixtureKey,
        recordings: &dyn RecordingLookup,
    ) -> Result<&Title, SelectError> {
        let fixture = data
            .fixture_by_key(key)
            .filter(|f| recordings.has_recording(f))
            .ok_or_else(|| SelectError::NoSuchFixture {
                league: key.league.clone(),
                fixture_id: key.fixture_id,
            })?;
        let title = Title {
            text: format!("{} - {}", fixture.home, fixture.away),
            live: false,
        };
        Ok(self.apply(title, &recording_sources(key.fixture_id)))
    }

    fn play_stream(&mut self, stream: &Stream) -> &Title {
        let title = Title {
            text: stream.description.clone(),
            live: stream.live,
        };
        self.apply(title, &stream.sources)
    }

    fn apply(&mut self, title: Title, sources: &[Source]) -> &Title {
        info!("Playing '{}' ({} sources)", title.text, sources.len());
        self.player
            .set_sources(sources.iter().map(PlayerSource::from).collect());
        self.player.play();
        debug!("Player current source: {:?}", self.player.current_source());
        self.video_visible = true;
        self.title.insert(title)
    }

    pub fn title(&self) -> Option<&Title> {
        self.title.as_ref()
    }

    pub fn is_video_visible(&self) -> bool {
        self.video_visible
    }

    pub fn player(&self) -> &P {
        &self.player
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Fixture, Leagues, MediaType, Score};
    use crate::recordings::NoRecordings;
    use chrono::{TimeZone, Utc};

    fn scenario() -> PageData {
        PageData {
            leagues: Leagues::new(),
            streams: vec![
                Stream {
                    description: "Match A".into(),
                    date: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
                    live: false,
                    sources: vec![Source::new(MediaType::Hls, "a.m3u8")],
                },
                Stream {
                    description: "Match B".into(),
                    date: Utc.timestamp_opt(1_700_500_000, 0).unwrap(),
                    live: true,
                    sources: vec![
                        Source::new(MediaType::Hls, "b.m3u8"),
                        Source::new(MediaType::Dash, "b.mpd"),
                    ],
                },
            ],
        }
    }

    fn selector() -> PlaybackSelector<PlayerSession> {
        PlaybackSelector::new(PlayerSession::default())
    }

    #[test]
    fn test_select_live_stream() {
        let data = scenario();
        let mut sel = selector();
        assert!(!sel.is_video_visible());

        let title = sel.select_stream(&data, 1).unwrap().clone();
        assert_eq!(title.text, "Match B");
        assert!(title.live);
        assert!(title.to_html().ends_with(r#"<span class="badge badge-danger">Live</span>"#));
        assert_eq!(
            sel.player().sources(),
            &[
                PlayerSource {
                    mime: "application/x-mpegURL".into(),
                    src: "b.m3u8".into()
                },
                PlayerSource {
                    mime: "application/dash+xml".into(),
                    src: "b.mpd".into()
                },
            ]
        );
        assert!(sel.player().is_playing());
        assert!(sel.is_video_visible());
    }

    #[test]
    fn test_select_plain_stream_has_no_badge() {
        let data = scenario();
        let mut sel = selector();
        let title = sel.select_stream(&data, 0).unwrap();
        assert_eq!(title.to_html(), "Match A");
    }

    #[test]
    fn test_out_of_range_leaves_player_untouched() {
        let data = scenario();
        let mut sel = selector();
        sel.select_stream(&data, 0).unwrap();

        assert_eq!(
            sel.select_stream(&data, 2),
            Err(SelectError::NoSuchStream("2".into()))
        );
        assert!(sel.select_stream(&data, -1).is_err());
        assert_eq!(sel.title().map(|t| t.text.as_str()), Some("Match A"));
        assert_eq!(sel.player().current_source().map(|s| s.src.as_str()), Some("a.m3u8"));
    }

    #[test]
    fn test_out_of_range_before_any_selection_keeps_hidden() {
        let mut sel = selector();
        assert!(sel.select_stream(&PageData::default(), 0).is_err());
        assert!(!sel.is_video_visible());
        assert!(sel.player().current_source().is_none());
    }

    #[test]
    fn test_second_selection_replaces_sources() {
        let data = scenario();
        let mut sel = selector();
        sel.select_stream(&data, 1).unwrap();
        sel.select_stream(&data, 0).unwrap();
        assert_eq!(sel.player().sources().len(), 1);
        assert!(sel.is_video_visible());
    }

    #[test]
    fn test_key_survives_list_replacement() {
        let data = scenario();
        let key = data.streams[1].key();

        // list replaced between render and click: Match B moved to the front
        let mut replaced = scenario();
        replaced.streams.reverse();
        let mut sel = selector();
        let title = sel.select_stream_by_key(&replaced, &key).unwrap();
        assert_eq!(title.text, "Match B");

        // and dropped entirely
        replaced.streams.remove(0);
        assert!(sel.select_stream_by_key(&replaced, &key).is_err());
        assert_eq!(sel.title().map(|t| t.text.as_str()), Some("Match B"));
    }

    #[test]
    fn test_select_fixture_requires_recording() {
        let mut data = scenario();
        data.leagues.insert(
            "EPL".into(),
            vec![Fixture {
                league: "EPL".into(),
                home: "Arsenal".into(),
                away: "Chelsea".into(),
                venue: "Emirates".into(),
                score: Score::new(1, 1),
                kickoff: Utc.timestamp_opt(1_600_000_000, 0).unwrap(),
                fixture_id: Some(5),
            }],
        );
        let key = FixtureKey {
            league: "EPL".into(),
            fixture_id: 5,
        };

        struct Recorded;
        impl RecordingLookup for Recorded {
            fn has_recording(&self, _f: &Fixture) -> bool {
                true
            }
        }

        let mut sel = selector();
        assert!(sel.select_fixture(&data, &key, &NoRecordings).is_err());
        assert!(!sel.is_video_visible());

        let title = sel.select_fixture(&data, &key, &Recorded).unwrap();
        assert_eq!(title.text, "Arsenal - Chelsea");
        assert_eq!(sel.player().sources()[0].src, "recordings/hls/5.m3u8");
        assert_eq!(sel.player().sources()[1].src, "recordings/dash/5.mpd");
    }
}
