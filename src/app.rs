use anyhow::{Context, Result};
use axum::{
    extract::{Path, RawQuery, State},
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{Datelike, Local, Weekday};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::anilist::{
    decode_detail, decode_page, decode_schedule, decode_trending, AniListClient,
    GraphQlTransport, MediaDetail, MediaPage, Operation, ScheduledMedia, TrendingSections,
};
use crate::config::Config;
use crate::fetcher::{FetchOutcome, Fetcher, PageKind, QueryRequest};
use crate::filter::{PageCursor, RouteFilter, SearchController};
use crate::navigation::{self, NavItem, MENU};
use crate::query::{self, PopularTab};
use crate::schedule::{self, ScheduleDay};
use crate::season::SeasonPair;
use crate::theme::{Palette, ThemeContext, ThemeMode, ThemeStore};
use crate::url_sync;

const MAX_BODY_BYTES: usize = 16 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub fetcher: Arc<Fetcher>,
    pub theme: Arc<ThemeContext>,
    pub config: Arc<Config>,
}

impl AppState {
    pub async fn new(config: Config, transport: Arc<dyn GraphQlTransport>) -> Self {
        let theme = ThemeContext::load(ThemeStore::new(&config.theme_file)).await;
        Self {
            fetcher: Arc::new(Fetcher::new(transport)),
            theme: Arc::new(theme),
            config: Arc::new(config),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewStatus {
    Success,
    Empty,
    Failure,
}

/// Envelope of every page response.
///
/// A failure that still has data to show (`stale: true`) is answered with 200
/// so the browser keeps rendering and shows the error as a banner.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageView<T> {
    pub title: String,
    pub status: ViewStatus,
    pub data: Option<T>,
    pub error: Option<String>,
    pub stale: bool,
    /// Canonical query string the address bar should show.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

/// Page payloads that can be legitimately empty.
pub trait Listing {
    fn is_empty(&self) -> bool;
}

impl Listing for MediaPage {
    fn is_empty(&self) -> bool {
        MediaPage::is_empty(self)
    }
}

impl Listing for TrendingSections {
    fn is_empty(&self) -> bool {
        TrendingSections::is_empty(self)
    }
}

impl Listing for MediaDetail {
    fn is_empty(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleView {
    /// 0 = Sunday .. 6 = Saturday.
    pub selected_day: u32,
    pub selected_label: &'static str,
    /// Monday first.
    pub days: Vec<ScheduleDay<ScheduledMedia>>,
    pub unscheduled: usize,
}

impl ScheduleView {
    pub fn new(items: Vec<ScheduledMedia>, selected: Weekday) -> Self {
        let buckets = schedule::group_by_weekday(items);
        let unscheduled = buckets.dropped();
        Self {
            selected_day: selected.num_days_from_sunday(),
            selected_label: schedule::weekday_label(selected),
            days: buckets.into_days(),
            unscheduled,
        }
    }
}

impl Listing for ScheduleView {
    fn is_empty(&self) -> bool {
        self.days.iter().all(|d| d.items.is_empty())
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
struct ThemeView {
    theme_mode: ThemeMode,
    palette: Palette,
}

impl From<ThemeMode> for ThemeView {
    fn from(mode: ThemeMode) -> Self {
        Self {
            theme_mode: mode,
            palette: mode.palette(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThemeUpdate {
    theme_mode: ThemeMode,
}

pub async fn run_server() -> Result<()> {
    let config = Config::from_env()?;
    let client = AniListClient::new(&config.anilist_endpoint)?;
    info!("Using AniList endpoint {}", client.endpoint());

    let addr = config.bind;
    let state = AppState::new(config, Arc::new(client)).await;
    let theme = state.theme.clone();
    let app = build_router(state);

    info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    match theme.persist().await {
        Ok(()) => info!("Theme preference saved"),
        Err(e) => warn!("{:#}", e),
    }
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/health", get(health))
        .route("/api/navigation", get(navigation_menu))
        .route("/api/theme", get(theme_current).put(theme_set))
        .route("/api/theme/toggle", post(theme_toggle))
        .route("/api/trending", get(trending))
        .route("/api/popular", get(popular))
        .route("/api/top-rated", get(top_rated))
        .route("/api/new-releases", get(new_releases))
        .route("/api/schedule", get(airing_schedule))
        .route("/api/search", get(search))
        .route("/api/status/:status", get(search))
        .route("/api/genre", get(search))
        .route("/api/year", get(search))
        .route("/api/animations", get(search))
        .route("/api/anime/:id", get(anime_detail));
    for page in PageKind::ALL {
        router = router.route(
            &format!("/api/{}/retry", page.as_str()),
            post(move |State(state): State<AppState>| retry_page(state, page)),
        );
    }
    router
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

fn query_params(raw: Option<String>) -> Vec<(String, String)> {
    url_sync::parse_query_string(raw.as_deref().unwrap_or(""))
}

fn origin(uri: &Uri) -> String {
    uri.path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string())
}

/// Mounts the search page for `route` and applies an explicit `page`.
fn mount_search(route: RouteFilter, params: &[(String, String)], per_page: u32) -> SearchController {
    let mut controller = SearchController::mount(route, params, per_page);
    if let Some(n) = params
        .iter()
        .filter(|(k, _)| k == "page")
        .filter_map(|(_, v)| url_sync::parse_page(v))
        .last()
    {
        controller.goto_page(n);
    }
    controller
}

fn page_title(page: PageKind) -> &'static str {
    match page {
        PageKind::Trending => "Trending Anime",
        PageKind::Popular => "Popular Rankings",
        PageKind::TopRated => "Top Rated Rankings",
        PageKind::NewReleases => "New Anime Releases",
        PageKind::Schedule => "Weekly Anime Schedule",
        PageKind::Search => "Advanced Search",
        PageKind::Detail => "Anime Details",
    }
}

/// Turns a fetch outcome into the page envelope.
fn render<T, F>(title: &str, outcome: FetchOutcome, decode: F, query: Option<String>) -> Response
where
    T: Serialize + Listing,
    F: Fn(Value) -> Result<T>,
{
    let mut view = PageView {
        title: title.to_string(),
        status: ViewStatus::Success,
        data: None,
        error: None,
        stale: false,
        query,
    };
    let (error, stale) = match outcome {
        FetchOutcome::Success { data, .. } => match decode(data) {
            Ok(data) => {
                if data.is_empty() {
                    view.status = ViewStatus::Empty;
                }
                view.data = Some(data);
                return (StatusCode::OK, Json(view)).into_response();
            }
            Err(e) => {
                warn!("Failed to decode {} response: {:#}", title, e);
                (format!("{:#}", e), None)
            }
        },
        FetchOutcome::Failure { error, stale } => (error, stale),
    };

    view.status = ViewStatus::Failure;
    view.error = Some(error);
    match stale.map(&decode).and_then(Result::ok) {
        Some(data) => {
            view.data = Some(data);
            view.stale = true;
            (StatusCode::OK, Json(view)).into_response()
        }
        None => (StatusCode::BAD_GATEWAY, Json(view)).into_response(),
    }
}

async fn trending(State(state): State<AppState>) -> Response {
    let pair = SeasonPair::current();
    let request = QueryRequest::new(Operation::Trending, query::build_trending_variables(&pair));
    let page = PageKind::Trending;
    let outcome = state
        .fetcher
        .fetch(page, request, page.default_policy())
        .await;
    render(page_title(page), outcome, decode_trending, None)
}

async fn popular(State(state): State<AppState>, RawQuery(raw): RawQuery) -> Response {
    rankings(state, PageKind::Popular, raw).await
}

async fn top_rated(State(state): State<AppState>, RawQuery(raw): RawQuery) -> Response {
    rankings(state, PageKind::TopRated, raw).await
}

async fn rankings(state: AppState, page: PageKind, raw: Option<String>) -> Response {
    let params = query_params(raw);
    let mut parsed = url_sync::popular_from_params(&params);
    if page == PageKind::TopRated && !params.iter().any(|(k, _)| k == "tab") {
        parsed.tab = PopularTab::Score;
    }
    let mut cursor = PageCursor::new(state.config.page_size);
    if let Some(n) = parsed.page {
        cursor.goto(n);
    }
    let vars = query::build_popular_variables(parsed.tab, parsed.year, &cursor);
    let outcome = state
        .fetcher
        .fetch(
            page,
            QueryRequest::new(Operation::Popular, vars),
            page.default_policy(),
        )
        .await;
    render(page_title(page), outcome, decode_page, None)
}

async fn new_releases(State(state): State<AppState>, RawQuery(raw): RawQuery) -> Response {
    let params = query_params(raw);
    let parsed = url_sync::new_releases_from_params(&params);
    let year = parsed.year.unwrap_or_else(|| Local::now().year());
    let mut cursor = PageCursor::new(state.config.page_size);
    if let Some(n) = parsed.page {
        cursor.goto(n);
    }
    let vars = query::build_new_releases_variables(parsed.season, year, &cursor);
    let page = PageKind::NewReleases;
    let outcome = state
        .fetcher
        .fetch(
            page,
            QueryRequest::new(Operation::NewReleases, vars),
            page.default_policy(),
        )
        .await;
    render(page_title(page), outcome, decode_page, None)
}

async fn airing_schedule(
    State(state): State<AppState>,
    uri: Uri,
    RawQuery(raw): RawQuery,
) -> Response {
    let params = query_params(raw);
    let selected = url_sync::weekday_from_params(&params).unwrap_or_else(schedule::today);
    let page = PageKind::Schedule;
    let request = QueryRequest::new(Operation::AiringSchedule, query::build_schedule_variables())
        .with_origin(origin(&uri));
    let outcome = state
        .fetcher
        .fetch(page, request, page.default_policy())
        .await;
    render(
        page_title(page),
        outcome,
        |data| decode_schedule(data).map(|items| ScheduleView::new(items, selected)),
        None,
    )
}

async fn search(State(state): State<AppState>, uri: Uri, RawQuery(raw): RawQuery) -> Response {
    let Some(route) = RouteFilter::from_path(uri.path()) else {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("Unknown search page {}", uri.path()) })),
        )
            .into_response();
    };
    let params = query_params(raw);
    let controller = mount_search(route, &params, state.config.page_size);
    let canonical = url_sync::to_query_string(controller.filter());

    let page = PageKind::Search;
    let request = QueryRequest::new(Operation::Search, controller.variables())
        .scoped(uri.path())
        .with_origin(origin(&uri));
    let outcome = state
        .fetcher
        .fetch(page, request, page.default_policy())
        .await;
    render(route.title(), outcome, decode_page, Some(canonical))
}

async fn anime_detail(State(state): State<AppState>, Path(id): Path<i32>) -> Response {
    let page = PageKind::Detail;
    let request = QueryRequest::new(Operation::MediaDetail, query::build_detail_variables(id))
        .scoped(format!("anime/{}", id));
    let outcome = state
        .fetcher
        .fetch(page, request, page.default_policy())
        .await;
    render(page_title(page), outcome, decode_detail, None)
}

async fn retry_page(state: AppState, page: PageKind) -> Response {
    let Some((request, outcome)) = state.fetcher.retry(page).await else {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("Nothing to retry on {}", page.as_str()) })),
        )
            .into_response();
    };
    let (path, raw_query) = request
        .origin
        .split_once('?')
        .unwrap_or((request.origin.as_str(), ""));
    let params = url_sync::parse_query_string(raw_query);
    let title = page_title(page);
    match page {
        PageKind::Trending => render(title, outcome, decode_trending, None),
        PageKind::Popular | PageKind::TopRated | PageKind::NewReleases => {
            render(title, outcome, decode_page, None)
        }
        PageKind::Search => {
            let route = RouteFilter::from_path(path).unwrap_or(RouteFilter::Search);
            let controller = mount_search(route, &params, state.config.page_size);
            let canonical = url_sync::to_query_string(controller.filter());
            render(route.title(), outcome, decode_page, Some(canonical))
        }
        PageKind::Schedule => {
            let selected = url_sync::weekday_from_params(&params).unwrap_or_else(schedule::today);
            render(
                title,
                outcome,
                |data| decode_schedule(data).map(|items| ScheduleView::new(items, selected)),
                None,
            )
        }
        PageKind::Detail => render(title, outcome, decode_detail, None),
    }
}

async fn navigation_menu(RawQuery(raw): RawQuery) -> Json<Value> {
    let params = query_params(raw);
    let path = params
        .iter()
        .find(|(k, _)| k == "path")
        .map(|(_, v)| v.as_str())
        .unwrap_or("");
    let selected = MENU
        .iter()
        .find(|item| item.is_selected(path))
        .and_then(|item| match item {
            NavItem::Link { segment, .. } | NavItem::Group { segment, .. } => Some(*segment),
            NavItem::Header { .. } | NavItem::Divider => None,
        });
    Json(json!({
        "items": &*MENU,
        "links": navigation::links(&MENU)
            .into_iter()
            .map(|(segment, title)| json!({ "segment": segment, "title": title }))
            .collect::<Vec<_>>(),
        "selected": selected,
    }))
}

async fn theme_current(State(state): State<AppState>) -> Json<ThemeView> {
    Json(state.theme.current().await.into())
}

async fn theme_toggle(State(state): State<AppState>) -> Json<ThemeView> {
    let mode = state.theme.toggle().await;
    info!("Theme toggled to {}", mode.as_str());
    Json(mode.into())
}

async fn theme_set(State(state): State<AppState>, Json(update): Json<ThemeUpdate>) -> Json<ThemeView> {
    let mode = state.theme.set(update.theme_mode).await;
    info!("Theme set to {}", mode.as_str());
    Json(mode.into())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        let mut term = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        term.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Shutdown signal received (Ctrl+C)");
        }
        _ = terminate => {
            info!("Shutdown signal received (SIGTERM)");
        }
    }
}
