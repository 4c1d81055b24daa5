use anicatalog::anilist::{GraphQlTransport, Operation};
use anicatalog::app::{build_router, AppState};
use anicatalog::config::Config;
use anicatalog::query::QueryVariables;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tower::util::ServiceExt;

/// Answers each operation from a queue of canned results; the last result of
/// a queue is repeated once the others are used up.
#[derive(Default)]
struct FakeAniList {
    responses: Mutex<HashMap<Operation, VecDeque<Result<Value, String>>>>,
    calls: Mutex<Vec<(Operation, QueryVariables)>>,
}

impl FakeAniList {
    fn push(&self, operation: Operation, result: Result<Value, String>) {
        self.responses
            .lock()
            .unwrap()
            .entry(operation)
            .or_default()
            .push_back(result);
    }

    fn calls(&self) -> Vec<(Operation, QueryVariables)> {
        self.calls.lock().unwrap().clone()
    }

    fn last_variables(&self) -> QueryVariables {
        self.calls().last().expect("at least one call").1.clone()
    }
}

#[async_trait::async_trait]
impl GraphQlTransport for FakeAniList {
    async fn execute(&self, operation: Operation, variables: &QueryVariables) -> anyhow::Result<Value> {
        self.calls
            .lock()
            .unwrap()
            .push((operation, variables.clone()));
        let mut responses = self.responses.lock().unwrap();
        let queue = responses
            .get_mut(&operation)
            .ok_or_else(|| anyhow::anyhow!("no fixture for {}", operation))?;
        let next = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };
        match next {
            Some(Ok(data)) => Ok(data),
            Some(Err(message)) => Err(anyhow::anyhow!(message)),
            None => Err(anyhow::anyhow!("no fixture for {}", operation)),
        }
    }
}

fn media(id: i32, title: &str) -> Value {
    json!({
        "id": id,
        "title": { "userPreferred": title, "english": null, "native": null },
        "coverImage": { "extraLarge": null, "large": format!("https://img.anili.st/{}.jpg", id), "medium": null },
        "averageScore": 82,
        "genres": ["Action", "Comedy"],
        "description": "<i>A hunter</i> &amp; a devil.<br><br>(Source: Publisher)",
        "bannerImage": null,
        "status": "RELEASING",
        "episodes": 12,
        "format": "TV",
        "startDate": { "year": 2024, "month": 1, "day": 7 }
    })
}

fn page(media: Vec<Value>) -> Value {
    json!({
        "Page": {
            "pageInfo": {
                "total": media.len(),
                "currentPage": 1,
                "lastPage": 1,
                "hasNextPage": false,
                "perPage": 20
            },
            "media": media
        }
    })
}

async fn app_with(fake: Arc<FakeAniList>) -> (Router, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        theme_file: dir.path().join("theme.json"),
        ..Config::default()
    };
    let state = AppState::new(config, fake).await;
    (build_router(state), dir)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let res = app.clone().oneshot(request).await.unwrap();
    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| json!(String::from_utf8_lossy(&bytes)))
    };
    (status, body)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

async fn post(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Request::post(uri).body(Body::empty()).unwrap()).await
}

fn sorted_keys(vars: &QueryVariables) -> Vec<String> {
    let mut keys: Vec<String> = vars.keys().map(str::to_string).collect();
    keys.sort();
    keys
}

#[tokio::test]
async fn genre_selection_sends_only_chosen_filters() {
    let fake = Arc::new(FakeAniList::default());
    fake.push(Operation::Search, Ok(page(vec![media(1, "Chainsaw Man")])));
    let (app, _dir) = app_with(fake.clone()).await;

    let (status, body) = get(&app, "/api/search?genres=Action,Comedy&year=all&status=all").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["title"], "Advanced Search");
    assert_eq!(body["query"], "genres=Action%2CComedy");
    assert_eq!(body["data"]["media"][0]["title"], "Chainsaw Man");

    let vars = fake.last_variables();
    assert_eq!(sorted_keys(&vars), ["genre", "page", "perPage", "sort"]);
    assert_eq!(vars.get("genre"), Some(&json!(["Action", "Comedy"])));
    assert_eq!(vars.get("sort"), Some(&json!(["POPULARITY_DESC"])));
    assert_eq!(vars.get("page"), Some(&json!(1)));
    assert_eq!(vars.get("perPage"), Some(&json!(20)));
}

#[tokio::test]
async fn animations_with_no_results_is_empty_not_failure() {
    let fake = Arc::new(FakeAniList::default());
    fake.push(Operation::Search, Ok(page(vec![])));
    let (app, _dir) = app_with(fake.clone()).await;

    let (status, body) = get(&app, "/api/animations").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "empty");
    assert_eq!(body["error"], Value::Null);
    assert_eq!(body["title"], "All Animations");
    assert_eq!(body["query"], "");
    assert_eq!(sorted_keys(&fake.last_variables()), ["page", "perPage", "sort"]);
}

#[tokio::test]
async fn failure_after_success_keeps_previous_results() {
    let fake = Arc::new(FakeAniList::default());
    fake.push(Operation::Popular, Ok(page(vec![media(5, "Frieren")])));
    fake.push(
        Operation::Popular,
        Err("AniList GetPopularAnime HTTP error (status 500): oops".into()),
    );
    let (app, _dir) = app_with(fake.clone()).await;

    let (status, first) = get(&app, "/api/popular").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["status"], "success");
    assert_eq!(first["stale"], false);

    let (status, second) = get(&app, "/api/popular?page=2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["status"], "failure");
    assert_eq!(second["stale"], true);
    assert!(second["error"].as_str().unwrap().contains("status 500"));
    assert_eq!(second["data"]["media"][0]["title"], "Frieren");
    assert_eq!(fake.last_variables().get("page"), Some(&json!(2)));
}

#[tokio::test]
async fn failure_with_nothing_to_show_is_bad_gateway() {
    let fake = Arc::new(FakeAniList::default());
    fake.push(Operation::MediaDetail, Err("connection refused".into()));
    let (app, _dir) = app_with(fake).await;

    let (status, body) = get(&app, "/api/anime/16498").await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["status"], "failure");
    assert_eq!(body["data"], Value::Null);
    assert_eq!(body["error"], "connection refused");
}

#[tokio::test]
async fn retry_reissues_the_last_schedule_request() {
    let fake = Arc::new(FakeAniList::default());
    fake.push(Operation::AiringSchedule, Err("timeout".into()));
    let mut airing = media(7, "Dandadan");
    airing["airingSchedule"] = json!({ "nodes": [{ "airingAt": 1_704_589_200i64, "episode": 3 }] });
    let mut untimed = media(8, "Kaiju No. 8");
    untimed["airingSchedule"] = json!({ "nodes": [] });
    fake.push(Operation::AiringSchedule, Ok(page(vec![airing, untimed])));
    let (app, _dir) = app_with(fake.clone()).await;

    let (status, body) = get(&app, "/api/schedule?day=2").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "timeout");

    let (status, body) = post(&app, "/api/schedule/retry").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["title"], "Weekly Anime Schedule");
    assert_eq!(body["data"]["selectedDay"], 2);
    assert_eq!(body["data"]["selectedLabel"], "Tuesday");

    let days = body["data"]["days"].as_array().unwrap();
    assert_eq!(days.len(), 7);
    assert_eq!(days[0]["label"], "Monday");
    assert_eq!(days[6]["label"], "Sunday");
    let scheduled: usize = days
        .iter()
        .map(|d| d["items"].as_array().unwrap().len())
        .sum();
    assert_eq!(scheduled, 1);
    assert_eq!(body["data"]["unscheduled"], 1);

    let calls = fake.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0], calls[1]);
    assert_eq!(calls[1].1.get("perPage"), Some(&json!(100)));
}

#[tokio::test]
async fn retried_search_keeps_its_route_and_query() {
    let fake = Arc::new(FakeAniList::default());
    fake.push(Operation::Search, Err("timeout".into()));
    fake.push(Operation::Search, Ok(page(vec![media(2, "One Piece")])));
    let (app, _dir) = app_with(fake.clone()).await;

    let (status, _) = get(&app, "/api/status/airing?genres=Drama").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);

    let (status, body) = post(&app, "/api/search/retry").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Airing Animations");
    assert_eq!(body["query"], "genres=Drama&status=RELEASING");
    assert_eq!(body["data"]["media"][0]["title"], "One Piece");
    assert_eq!(fake.last_variables().get("status"), Some(&json!("RELEASING")));
}

#[tokio::test]
async fn failed_detail_never_shows_another_anime() {
    let fake = Arc::new(FakeAniList::default());
    fake.push(
        Operation::MediaDetail,
        Ok(json!({ "Media": { "id": 1, "title": { "userPreferred": "Cowboy Bebop" } } })),
    );
    fake.push(Operation::MediaDetail, Err("AniList GetMediaDetail HTTP error (status 500)".into()));
    let (app, _dir) = app_with(fake).await;

    let (status, first) = get(&app, "/api/anime/1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["data"]["title"], "Cowboy Bebop");

    let (status, second) = get(&app, "/api/anime/2").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(second["status"], "failure");
    assert_eq!(second["stale"], false);
    assert_eq!(second["data"], Value::Null);
}

#[tokio::test]
async fn stale_search_results_stay_on_their_own_route() {
    let fake = Arc::new(FakeAniList::default());
    fake.push(Operation::Search, Ok(page(vec![media(4, "Frieren")])));
    fake.push(Operation::Search, Err("timeout".into()));
    let (app, _dir) = app_with(fake).await;

    let (status, _) = get(&app, "/api/search?q=frieren").await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = get(&app, "/api/status/upcoming").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["title"], "Upcoming Animations");
    assert_eq!(body["data"], Value::Null);

    let (status, body) = get(&app, "/api/search?q=himmel").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stale"], true);
    assert_eq!(body["data"]["media"][0]["title"], "Frieren");
}

#[tokio::test]
async fn retry_needs_a_known_page_with_history() {
    let fake = Arc::new(FakeAniList::default());
    let (app, _dir) = app_with(fake.clone()).await;

    let (status, _) = post(&app, "/api/search/retry").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = post(&app, "/api/home/retry").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(fake.calls().is_empty());
}

#[tokio::test]
async fn status_route_wins_over_query_parameter() {
    let fake = Arc::new(FakeAniList::default());
    fake.push(Operation::Search, Ok(page(vec![media(2, "One Piece")])));
    let (app, _dir) = app_with(fake.clone()).await;

    let (status, body) = get(&app, "/api/status/airing?status=FINISHED&genres=Drama").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Airing Animations");
    assert_eq!(body["query"], "genres=Drama&status=RELEASING");
    let vars = fake.last_variables();
    assert_eq!(vars.get("status"), Some(&json!("RELEASING")));
    assert_eq!(vars.get("genre"), Some(&json!(["Drama"])));

    let (status, _) = get(&app, "/api/status/paused").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn search_page_number_is_explicit_and_malformed_values_are_ignored() {
    let fake = Arc::new(FakeAniList::default());
    fake.push(Operation::Search, Ok(page(vec![media(3, "Mushishi")])));
    let (app, _dir) = app_with(fake.clone()).await;

    get(&app, "/api/search?q=mushi&page=3").await;
    assert_eq!(fake.last_variables().get("page"), Some(&json!(3)));
    assert_eq!(fake.last_variables().get("search"), Some(&json!("mushi")));

    let (_, body) = get(&app, "/api/year?year=abc&score=999&page=zero").await;
    let vars = fake.last_variables();
    assert_eq!(vars.get("page"), Some(&json!(1)));
    assert_eq!(vars.get("sort"), Some(&json!(["START_DATE_DESC"])));
    assert!(!vars.contains_key("year"));
    assert!(!vars.contains_key("scoreGreater"));
    assert_eq!(body["title"], "Animations by Year");
}

#[tokio::test]
async fn cache_first_pages_reuse_identical_requests() {
    let fake = Arc::new(FakeAniList::default());
    fake.push(Operation::Search, Ok(page(vec![media(4, "Frieren")])));
    fake.push(Operation::Popular, Ok(page(vec![media(4, "Frieren")])));
    let (app, _dir) = app_with(fake.clone()).await;

    get(&app, "/api/search?q=frieren").await;
    let (status, body) = get(&app, "/api/search?q=frieren").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["media"][0]["id"], 4);
    assert_eq!(fake.calls().len(), 1);

    get(&app, "/api/popular").await;
    get(&app, "/api/popular").await;
    assert_eq!(fake.calls().len(), 3, "rankings always refresh");
}

#[tokio::test]
async fn top_rated_defaults_to_score_ranking() {
    let fake = Arc::new(FakeAniList::default());
    fake.push(Operation::Popular, Ok(page(vec![media(9, "Monster")])));
    let (app, _dir) = app_with(fake.clone()).await;

    let (_, body) = get(&app, "/api/top-rated?year=2004").await;
    assert_eq!(body["title"], "Top Rated Rankings");
    let vars = fake.last_variables();
    assert_eq!(vars.get("sort"), Some(&json!(["SCORE_DESC"])));
    assert_eq!(vars.get("year"), Some(&json!(2004)));

    get(&app, "/api/popular?tab=trending").await;
    assert_eq!(fake.last_variables().get("sort"), Some(&json!(["TRENDING_DESC"])));
}

#[tokio::test]
async fn trending_sections_and_new_releases() {
    let fake = Arc::new(FakeAniList::default());
    fake.push(
        Operation::Trending,
        Ok(json!({
            "trending": { "media": [media(1, "Solo Leveling")] },
            "season": { "media": [] },
            "nextSeason": { "media": [] },
            "popular": { "media": [media(2, "Attack on Titan")] },
            "top": { "media": [] }
        })),
    );
    fake.push(Operation::NewReleases, Ok(page(vec![media(3, "Blue Box")])));
    let (app, _dir) = app_with(fake.clone()).await;

    let (status, body) = get(&app, "/api/trending").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["trending"][0]["title"], "Solo Leveling");
    assert_eq!(body["data"]["popular"][0]["excerpt"], "A hunter & a devil.");
    let vars = fake.last_variables();
    assert_eq!(sorted_keys(&vars), ["nextSeason", "nextYear", "season", "seasonYear"]);

    let (_, body) = get(&app, "/api/new-releases?season=fall&year=2024").await;
    assert_eq!(body["title"], "New Anime Releases");
    let vars = fake.last_variables();
    assert_eq!(vars.get("season"), Some(&json!("FALL")));
    assert_eq!(vars.get("seasonYear"), Some(&json!(2024)));
}

#[tokio::test]
async fn detail_page_renders_cleaned_record() {
    let fake = Arc::new(FakeAniList::default());
    fake.push(
        Operation::MediaDetail,
        Ok(json!({
            "Media": {
                "id": 16498,
                "title": { "userPreferred": "Shingeki no Kyojin", "english": "Attack on Titan", "native": "進撃の巨人" },
                "description": "Humans fight titans.<br>(Source: Kodansha)",
                "status": "FINISHED",
                "format": "TV",
                "episodes": 25,
                "genres": ["Action"],
                "studios": { "nodes": [{ "name": "Wit Studio" }] },
                "startDate": { "year": 2013, "month": 4, "day": 7 },
                "trailer": { "id": "LHtdKWJdif4", "site": "youtube" }
            }
        })),
    );
    let (app, _dir) = app_with(fake.clone()).await;

    let (status, body) = get(&app, "/api/anime/16498").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    let data = &body["data"];
    assert_eq!(data["title"], "Shingeki no Kyojin");
    assert_eq!(data["titleEnglish"], "Attack on Titan");
    assert_eq!(data["description"], "Humans fight titans.");
    assert_eq!(data["studios"], json!(["Wit Studio"]));
    assert_eq!(data["startDate"], "2013.04.07");
    assert_eq!(data["statusLabel"], "Completed");
    assert_eq!(fake.last_variables().get("id"), Some(&json!(16498)));
}

#[tokio::test]
async fn theme_toggle_is_persisted() {
    let fake = Arc::new(FakeAniList::default());
    let (app, dir) = app_with(fake).await;

    let (_, body) = get(&app, "/api/theme").await;
    assert_eq!(body["themeMode"], "light");
    assert_eq!(body["palette"]["primary"], "#1976d2");

    let (status, body) = post(&app, "/api/theme/toggle").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["themeMode"], "dark");
    let saved = std::fs::read_to_string(dir.path().join("theme.json")).unwrap();
    assert_eq!(saved, r#"{"themeMode":"dark"}"#);

    let request = Request::put("/api/theme")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"themeMode":"light"}"#))
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["themeMode"], "light");
    let saved = std::fs::read_to_string(dir.path().join("theme.json")).unwrap();
    assert_eq!(saved, r#"{"themeMode":"light"}"#);
}

#[tokio::test]
async fn navigation_and_health() {
    let fake = Arc::new(FakeAniList::default());
    let (app, _dir) = app_with(fake).await;

    let (status, body) = get(&app, "/api/navigation?path=/new-releases").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["selected"], "new-releases");
    assert_eq!(body["items"][0], json!({ "kind": "header", "title": "Explore" }));
    assert_eq!(body["links"].as_array().unwrap().len(), 5);

    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
}
