use std::fmt::Write;

use super::{escape, format_day};
use crate::data::{Stream, StreamKey};

pub const LIVE_CLASS: &str = "btn btn-danger";
pub const WATCH_CLASS: &str = "btn btn-outline-primary";

#[derive(Debug, Clone, PartialEq)]
pub struct StreamRow {
    pub position: usize,
    pub date: String,
    pub description: String,
    pub live: bool,
    /// "Live" or "Watch"
    pub label: &'static str,
    pub class: &'static str,
    /// `None` when the stream has nothing to play
    pub key: Option<StreamKey>,
}

pub fn stream_rows(streams: &[Stream]) -> Vec<StreamRow> {
    streams
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let (label, class) = if s.live {
                ("Live", LIVE_CLASS)
            } else {
                ("Watch", WATCH_CLASS)
            };
            StreamRow {
                position: i,
                date: format_day(&s.date),
                description: s.description.clone(),
                live: s.live,
                label,
                class,
                key: (!s.sources.is_empty()).then(|| s.key()),
            }
        })
        .collect()
}

pub fn render_streams(rows: &[StreamRow]) -> String {
    let mut out = String::new();
    for row in rows {
        let _ = write!(
            out,
            "<tr><td>{}</td><td>{}</td>",
            escape(&row.date),
            escape(&row.description)
        );
        match &row.key {
            Some(key) => {
                let _ = write!(
                    out,
                    r#"<td><form method="post" action="/play/stream/{}"><button type="submit" class="{}">{}</button></form></td>"#,
                    key, row.class, row.label
                );
            }
            None => out.push_str("<td></td>"),
        }
        out.push_str("</tr>");
    }
    out
}
