use std::path::PathBuf;

use crate::data::{Fixture, MediaType, Source};

/// Predicate telling the schedule whether a fixture has a recording to watch.
pub trait RecordingLookup: Send + Sync {
    fn has_recording(&self, fixture: &Fixture) -> bool;
}

/// Default lookup: nothing is recorded.
pub struct NoRecordings;

impl RecordingLookup for NoRecordings {
    fn has_recording(&self, _fixture: &Fixture) -> bool {
        false
    }
}

/// Recordings laid out as `<root>/hls/<fixture_id>.m3u8` and
/// `<root>/dash/<fixture_id>.mpd`.
pub struct RecordingsDir {
    root: PathBuf,
}

impl RecordingsDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        RecordingsDir { root: root.into() }
    }

    fn hls_path(&self, id: u32) -> PathBuf {
        self.root.join("hls").join(format!("{}.m3u8", id))
    }

    fn dash_path(&self, id: u32) -> PathBuf {
        self.root.join("dash").join(format!("{}.mpd", id))
    }
}

impl RecordingLookup for RecordingsDir {
    fn has_recording(&self, fixture: &Fixture) -> bool {
        match fixture.fixture_id {
            Some(id) => self.hls_path(id).exists() || self.dash_path(id).exists(),
            None => false,
        }
    }
}

/// Player sources for a recorded fixture, HLS first.
pub fn recording_sources(fixture_id: u32) -> Vec<Source> {
    vec![
        Source::new(MediaType::Hls, format!("recordings/hls/{}.m3u8", fixture_id)),
        Source::new(MediaType::Dash, format!("recordings/dash/{}.mpd", fixture_id)),
    ]
}
