use chrono::{DateTime, Utc};
use std::fmt::Write;

use super::{escape, format_day, format_time, path_segment};
use crate::data::{Fixture, FixtureKey, Leagues};
use crate::recordings::RecordingLookup;

/// Placeholder shown when the score is not known yet.
pub const NO_SCORE: &str = "–";

/// One rendered fixture row
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleRow {
    /// Position in the league's fixture list
    pub position: usize,
    pub date: String,
    pub time: String,
    pub home: String,
    pub away: String,
    pub venue: String,
    pub score: String,
    /// Already kicked off before the upcoming fixture
    pub disabled: bool,
    pub upcoming: bool,
    /// Present only when a recording exists
    pub watch: Option<FixtureKey>,
}

/// Position of the first fixture whose kickoff is strictly after `now`.
pub fn upcoming_index(fixtures: &[Fixture], now: DateTime<Utc>) -> Option<usize> {
    let now_ms = now.timestamp_millis();
    fixtures
        .iter()
        .position(|f| f.kickoff.timestamp() * 1000 > now_ms)
}

/// Build the rows for one league.
///
/// With `history = Some(n)` only the last `n` fixtures before the upcoming one
/// are kept. Without an upcoming fixture every row is kept and none is
/// disabled.
pub fn schedule_rows(
    leagues: &Leagues,
    league: &str,
    now: DateTime<Utc>,
    recordings: &dyn RecordingLookup,
    history: Option<usize>,
) -> Vec<ScheduleRow> {
    let fixtures = match leagues.get(league) {
        Some(f) => f.as_slice(),
        None => return vec![],
    };

    let upcoming = upcoming_index(fixtures, now);
    let start = match (upcoming, history) {
        (Some(u), Some(h)) => u.saturating_sub(h),
        _ => 0,
    };

    fixtures
        .iter()
        .enumerate()
        .skip(start)
        .map(|(i, f)| {
            let disabled = upcoming.is_some_and(|u| i < u);
            let watch = if !disabled && recordings.has_recording(f) {
                f.key()
            } else {
                None
            };
            ScheduleRow {
                position: i,
                date: format_day(&f.kickoff),
                time: format_time(&f.kickoff),
                home: f.home.clone(),
                away: f.away.clone(),
                venue: f.venue.clone(),
                score: f.score.display().unwrap_or_else(|| NO_SCORE.to_string()),
                disabled,
                upcoming: upcoming == Some(i),
                watch,
            }
        })
        .collect()
}

/// Render schedule rows as the `<tbody>` content of the schedule table.
pub fn render_schedule(rows: &[ScheduleRow]) -> String {
    let mut out = String::new();
    for row in rows {
        let class = if row.disabled {
            r#" class="disabled text-muted""#
        } else if row.upcoming {
            r#" class="table-active""#
        } else {
            ""
        };
        let _ = write!(
            out,
            r#"<tr{}><th scope="row"><div>{}</div><div>{}</div></th><td>{}</td><td>{}</td><td>{}</td><td>{}</td>"#,
            class,
            escape(&row.date),
            escape(&row.time),
            escape(&row.home),
            escape(&row.away),
            escape(&row.venue),
            escape(&row.score),
        );
        match (&row.watch, row.disabled) {
            (Some(key), false) => {
                let _ = write!(
                    out,
                    r#"<td><form method="post" action="/play/fixture/{}/{}"><button type="submit" class="btn btn-outline-primary">Watch</button></form></td>"#,
                    escape(&path_segment(&key.league)),
                    key.fixture_id,
                );
            }
            _ => out.push_str("<td></td>"),
        }
        out.push_str("</tr>");
    }
    out
}

/// One heading plus table per league, in league-name order.
pub fn render_league_tables(
    leagues: &Leagues,
    now: DateTime<Utc>,
    recordings: &dyn RecordingLookup,
    history: Option<usize>,
) -> String {
    let mut out = String::new();
    for league in leagues.keys() {
        let rows = schedule_rows(leagues, league, now, recordings, history);
        let _ = write!(
            out,
            r#"<h4>{}</h4><table class="table table-responsive-md table-hover"><thead><tr><th scope="col">Date</th><th scope="col">Home</th><th scope="col">Away</th><th scope="col">Venue</th><th scope="col">Score</th><th scope="col">Watch</th></tr></thead><tbody>{}</tbody></table>"#,
            escape(league),
            render_schedule(&rows),
        );
    }
    out
}
