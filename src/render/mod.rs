//! Pure renderers: data -> row descriptors -> HTML fragments.
//!
//! Row builders take a consistent snapshot and never touch shared state, so
//! rendering the same input twice yields byte-identical output.

pub mod schedule;
pub mod streams;

pub use schedule::{render_league_tables, render_schedule, schedule_rows};
pub use streams::{render_streams, stream_rows};

use chrono::{DateTime, Utc};

/// Day, short month and year, e.g. `14 Nov 2023`.
pub fn format_day(ts: &DateTime<Utc>) -> String {
    ts.format("%-d %b %Y").to_string()
}

/// 24-hour clock, e.g. `22:13`.
pub fn format_time(ts: &DateTime<Utc>) -> String {
    ts.format("%H:%M").to_string()
}

/// Percent-encode one URL path segment (spaces as `%20`, never `+`).
pub fn path_segment(s: &str) -> String {
    url::form_urlencoded::byte_serialize(s.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// Minimal HTML text/attribute escaping for values coming from upstream APIs.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
