use serde::Serialize;

use super::{Player, PlayerSource};
use crate::render::escape;

/// Server-side view of the browser's video.js player. The page renders the
/// recorded source list into the `<video-js>` element.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PlayerSession {
    sources: Vec<PlayerSource>,
    playing: bool,
}

impl PlayerSession {
    pub fn sources(&self) -> &[PlayerSource] {
        &self.sources
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// `<source>` children for the video element, in preference order.
    pub fn source_tags(&self) -> String {
        self.sources
            .iter()
            .map(|s| format!(r#"<source src="{}" type="{}">"#, escape(&s.src), escape(&s.mime)))
            .collect()
    }
}

impl Player for PlayerSession {
    fn set_sources(&mut self, sources: Vec<PlayerSource>) {
        self.sources = sources;
        self.playing = false;
    }

    fn play(&mut self) {
        self.playing = !self.sources.is_empty();
    }

    fn current_source(&self) -> Option<&PlayerSource> {
        self.sources.first()
    }
}
