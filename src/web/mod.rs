use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::{cors::CorsLayer, services::ServeDir};
use tracing::warn;

use crate::data::{FixtureKey, StreamKey};
use crate::fetcher::{DataFetcher, FileDataSource};
use crate::page::{Page, Selection};
use crate::player::SelectError;

pub struct AppState {
    /// Latest data snapshot, shared by all visitors. Holds no playback state.
    pub page: RwLock<Page>,
    pub fetcher: DataFetcher,
    /// Backs the `fixtures` and `streams/all` endpoints
    pub files: FileDataSource,
}

/// Build the Axum router for the page, its fragments and the data endpoints.
pub fn router(state: AppState, static_dir: PathBuf, recordings_dir: Option<PathBuf>) -> Router {
    let mut app = Router::new()
        .route("/", get(index_handler))
        .route("/fixtures", get(fixtures_handler))
        .route("/streams/all", get(streams_handler))
        .route("/streams/table", get(streams_table_handler))
        .route("/schedule/:league", get(schedule_handler))
        .route("/player", get(player_handler))
        .route("/play/stream/:key", post(play_stream_handler))
        .route("/play/index/:index", post(play_index_handler))
        .route("/play/fixture/:league/:fixture_id", post(play_fixture_handler))
        .nest_service("/static", ServeDir::new(static_dir));

    if let Some(dir) = recordings_dir {
        app = app.nest_service("/recordings", ServeDir::new(dir));
    }

    app.layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

/// GET /?stream=..|index=..|league=..&fixture=.. : load both endpoints, then
/// render this visitor's selection from one snapshot.
async fn index_handler(
    State(state): State<Arc<AppState>>,
    Query(selection): Query<Selection>,
) -> impl IntoResponse {
    let outcome = state.fetcher.fetch().await;
    let mut page = state.page.write().await;
    page.apply_load(outcome);
    let page = page.downgrade();

    let mut session = page.session();
    if let Err(e) = page.select(&mut session, &selection) {
        warn!("Selection {} no longer resolves: {}", selection.location(), e);
    }
    Html(page.render(&session, Utc::now()))
}

/// GET /fixtures
async fn fixtures_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    state
        .files
        .fixtures_json()
        .await
        .map(Json)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}

/// GET /streams/all
async fn streams_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    state
        .files
        .streams_json()
        .await
        .map(Json)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}

/// GET /streams/table
async fn streams_table_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Html(state.page.read().await.streams_fragment())
}

/// GET /schedule/:league
async fn schedule_handler(
    State(state): State<Arc<AppState>>,
    Path(league): Path<String>,
) -> impl IntoResponse {
    Html(state.page.read().await.schedule_fragment(&league, Utc::now()))
}

/// GET /player?stream=.. : player state for a selection, as JSON.
async fn player_handler(
    State(state): State<Arc<AppState>>,
    Query(selection): Query<Selection>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let page = state.page.read().await;
    let mut session = page.session();
    page.select(&mut session, &selection).map_err(not_found)?;
    Ok(Json(page.player_state(&session)))
}

fn not_found(e: SelectError) -> (StatusCode, String) {
    warn!("Playback selection rejected: {}", e);
    (StatusCode::NOT_FOUND, e.to_string())
}

/// Check `selection` against the current snapshot and send the visitor to
/// the page URL carrying it.
async fn play(state: &AppState, selection: Selection) -> Result<Redirect, (StatusCode, String)> {
    let page = state.page.read().await;
    let mut session = page.session();
    page.select(&mut session, &selection).map_err(not_found)?;
    Ok(Redirect::to(&selection.location()))
}

/// POST /play/stream/:key
async fn play_stream_handler(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<Redirect, (StatusCode, String)> {
    play(&state, Selection::stream(&StreamKey::from(key))).await
}

/// POST /play/index/:index, redirected by key so a later reload cannot
/// shift it onto another stream.
async fn play_index_handler(
    State(state): State<Arc<AppState>>,
    Path(index): Path<i64>,
) -> Result<Redirect, (StatusCode, String)> {
    let selection = {
        let page = state.page.read().await;
        page.data()
            .stream_at(index)
            .map(|stream| Selection::stream(&stream.key()))
            .ok_or_else(|| not_found(SelectError::NoSuchStream(index.to_string())))?
    };
    play(&state, selection).await
}

/// POST /play/fixture/:league/:fixture_id
async fn play_fixture_handler(
    State(state): State<Arc<AppState>>,
    Path(key): Path<FixtureKey>,
) -> Result<Redirect, (StatusCode, String)> {
    play(&state, Selection::fixture(&key)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recordings::{NoRecordings, RecordingsDir};
    use std::fs;

    fn tmp_dir(name: &str) -> PathBuf {
        let p = std::env::temp_dir().join(format!("matchday_web_{}", name));
        let _ = fs::remove_dir_all(&p);
        fs::create_dir_all(&p).unwrap();
        p
    }

    const STREAMS: &str = r#"[
        {"description": "Match A", "live": false, "date": 1700000000,
         "sources": [{"type": "hls", "url": "a.m3u8"}]},
        {"description": "Match B", "live": true, "date": 1700500000,
         "sources": [{"type": "hls", "url": "b.m3u8"}, {"type": "dash", "url": "b.mpd"}]}
    ]"#;

    const FIXTURES: &str = r#"{"EPL": [
        {"home": "Arsenal", "away": "Chelsea", "venue": "Emirates", "score": "1 - 0", "timestamp": 1600000000, "fixture_id": 7},
        {"home": "Spurs", "away": "Leeds", "venue": "Tottenham", "score": "", "timestamp": 4000000000, "fixture_id": 8}
    ]}"#;

    async fn spawn(dir: &std::path::Path, recordings: Option<PathBuf>) -> String {
        let files = FileDataSource::new(dir.join("fixtures.json"), dir.join("streams.json"));
        let lookup: Arc<dyn crate::recordings::RecordingLookup> = match &recordings {
            Some(root) => Arc::new(RecordingsDir::new(root)),
            None => Arc::new(NoRecordings),
        };
        let state = AppState {
            page: RwLock::new(Page::new(lookup, None)),
            fetcher: DataFetcher::new(Arc::new(files.clone())),
            files,
        };
        let app = router(state, dir.join("static"), recordings);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn client() -> reqwest::Client {
        reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_data_endpoints_serve_files() {
        let dir = tmp_dir("endpoints");
        let base = spawn(&dir, None).await;
        let c = client();

        // nothing written yet
        let body: serde_json::Value = c
            .get(format!("{}/fixtures", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body, serde_json::json!({}));

        fs::write(dir.join("streams.json"), STREAMS).unwrap();
        let body: serde_json::Value = c
            .get(format!("{}/streams/all", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body.as_array().map(|a| a.len()), Some(2));
    }

    fn location(resp: &reqwest::Response) -> String {
        resp.headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .unwrap()
            .to_string()
    }

    const HIDDEN: &str = r#"id="video_container" class="row d-none""#;
    const SHOWN: &str = r#"id="video_container" class="row""#;

    #[tokio::test]
    async fn test_page_then_play_by_key() {
        let dir = tmp_dir("play");
        fs::write(dir.join("streams.json"), STREAMS).unwrap();
        fs::write(dir.join("fixtures.json"), FIXTURES).unwrap();
        let base = spawn(&dir, None).await;
        let c = client();

        let html = c.get(&base).send().await.unwrap().text().await.unwrap();
        assert!(html.contains("Match A"));
        assert!(html.contains("Spurs"));
        assert!(html.contains(r#"class="disabled text-muted""#));
        assert!(html.contains(HIDDEN));

        let table = c
            .get(format!("{}/streams/table", base))
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        let start = table.find("/play/stream/").unwrap() + "/play/stream/".len();
        let key = table[start..].split('"').next().unwrap().to_string();

        let resp = c
            .post(format!("{}/play/stream/{}", base, key))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::SEE_OTHER);
        let to = location(&resp);
        assert_eq!(to, format!("/?stream={}", key));

        let html = c
            .get(format!("{}{}", base, to))
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert!(html.contains(SHOWN));
        assert!(html.contains(r#"<h4 id="current_title" class="col-12">Match A</h4>"#));

        let state: serde_json::Value = c
            .get(format!("{}/player?stream={}", base, key))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(state["title"]["text"], "Match A");
        assert_eq!(state["visible"], true);
        assert_eq!(state["sources"][0]["src"], "a.m3u8");
    }

    #[tokio::test]
    async fn test_selection_is_per_visitor() {
        let dir = tmp_dir("visitors");
        fs::write(dir.join("streams.json"), STREAMS).unwrap();
        let base = spawn(&dir, None).await;
        let (a, b) = (client(), client());

        a.get(&base).send().await.unwrap();
        let resp = a.post(format!("{}/play/index/1", base)).send().await.unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::SEE_OTHER);
        let to = location(&resp);

        let html = b.get(&base).send().await.unwrap().text().await.unwrap();
        assert!(html.contains(HIDDEN));
        assert!(!html.contains("<source "));
        let state: serde_json::Value = b
            .get(format!("{}/player", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(state["visible"], false);
        assert!(state["title"].is_null());

        let html = a
            .get(format!("{}{}", base, to))
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert!(html.contains(SHOWN));
        assert!(html.contains(r#"Match B <span class="badge badge-danger">Live</span>"#));
    }

    #[tokio::test]
    async fn test_unknown_selection_is_404() {
        let dir = tmp_dir("unknown");
        fs::write(dir.join("streams.json"), STREAMS).unwrap();
        let base = spawn(&dir, None).await;
        let c = client();
        c.get(&base).send().await.unwrap();

        let resp = c
            .post(format!("{}/play/stream/deadbeef", base))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);

        let resp = c.post(format!("{}/play/index/5", base)).send().await.unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);
        let resp = c.post(format!("{}/play/index/-1", base)).send().await.unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);

        let resp = c.post(format!("{}/play/index/1", base)).send().await.unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::SEE_OTHER);
        let to = location(&resp);
        assert!(to.starts_with("/?stream="));

        let state: serde_json::Value = c
            .get(format!("{}/player{}", base, &to[1..]))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(state["title"]["text"], "Match B");
        assert_eq!(state["title"]["live"], true);
        assert_eq!(state["sources"][1]["type"], "application/dash+xml");

        // a stale link renders the page with the player still hidden
        let html = c
            .get(format!("{}/?stream=deadbeef", base))
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert!(html.contains(HIDDEN));
        let resp = c
            .get(format!("{}/player?stream=deadbeef", base))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_play_recorded_fixture() {
        let dir = tmp_dir("recorded");
        fs::write(dir.join("fixtures.json"), FIXTURES).unwrap();
        let rec = dir.join("recordings");
        fs::create_dir_all(rec.join("hls")).unwrap();
        fs::write(rec.join("hls").join("8.m3u8"), "#EXTM3U\n").unwrap();
        let base = spawn(&dir, Some(rec)).await;
        let c = client();

        let html = c.get(&base).send().await.unwrap().text().await.unwrap();
        assert!(html.contains(r#"action="/play/fixture/EPL/8""#));
        assert!(!html.contains(r#"action="/play/fixture/EPL/7""#));

        let resp = c
            .post(format!("{}/play/fixture/EPL/8", base))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::SEE_OTHER);
        assert_eq!(location(&resp), "/?league=EPL&fixture=8");

        let state: serde_json::Value = c
            .get(format!("{}/player?league=EPL&fixture=8", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(state["title"]["text"], "Spurs - Leeds");
        assert_eq!(state["sources"][0]["src"], "recordings/hls/8.m3u8");

        let playlist = c
            .get(format!("{}/recordings/hls/8.m3u8", base))
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert!(playlist.starts_with("#EXTM3U"));

        let resp = c
            .post(format!("{}/play/fixture/EPL/7", base))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);
    }
}
