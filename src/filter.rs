//! Filter state owned by the list/search pages and the controller that
//! mutates it. Every optional field has an explicit "unset" sentinel so the
//! query builder can omit it instead of sending a wildcard.

use serde::{Serialize, Serializer};
use std::fmt;
use tracing::debug;

use crate::query::{self, QueryVariables};
use crate::url_sync;

pub const DEFAULT_PER_PAGE: u32 = 20;
pub const SCORE_MAX: u8 = 100;
pub const EPISODE_MIN: u32 = 1;
pub const EPISODE_MAX: u32 = 200;
pub const DEFAULT_EPISODE_RANGE: (u32, u32) = (1, 50);

pub const GENRES: [&str; 18] = [
    "Action",
    "Adventure",
    "Comedy",
    "Drama",
    "Ecchi",
    "Fantasy",
    "Horror",
    "Mahou Shoujo",
    "Mecha",
    "Music",
    "Mystery",
    "Psychological",
    "Romance",
    "Sci-Fi",
    "Slice of Life",
    "Sports",
    "Supernatural",
    "Thriller",
];

/// Returns AniList's spelling of a genre, or `None` if it is not one we offer.
pub fn canonical_genre(raw: &str) -> Option<&'static str> {
    let raw = raw.trim();
    GENRES.iter().copied().find(|g| g.eq_ignore_ascii_case(raw))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaStatus {
    Releasing,
    Finished,
    NotYetReleased,
    Cancelled,
    Hiatus,
}

impl MediaStatus {
    pub const ALL: [MediaStatus; 5] = [
        Self::Releasing,
        Self::Finished,
        Self::NotYetReleased,
        Self::Cancelled,
        Self::Hiatus,
    ];

    pub fn as_graphql(self) -> &'static str {
        match self {
            Self::Releasing => "RELEASING",
            Self::Finished => "FINISHED",
            Self::NotYetReleased => "NOT_YET_RELEASED",
            Self::Cancelled => "CANCELLED",
            Self::Hiatus => "HIATUS",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Releasing => "Airing",
            Self::Finished => "Completed",
            Self::NotYetReleased => "Upcoming",
            Self::Cancelled => "Cancelled",
            Self::Hiatus => "On Hiatus",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL
            .into_iter()
            .find(|s| s.as_graphql().eq_ignore_ascii_case(raw))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaFormat {
    Tv,
    TvShort,
    Movie,
    Special,
    Ova,
    Ona,
    Music,
}

impl MediaFormat {
    pub const ALL: [MediaFormat; 7] = [
        Self::Tv,
        Self::TvShort,
        Self::Movie,
        Self::Special,
        Self::Ova,
        Self::Ona,
        Self::Music,
    ];

    pub fn as_graphql(self) -> &'static str {
        match self {
            Self::Tv => "TV",
            Self::TvShort => "TV_SHORT",
            Self::Movie => "MOVIE",
            Self::Special => "SPECIAL",
            Self::Ova => "OVA",
            Self::Ona => "ONA",
            Self::Music => "MUSIC",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Tv => "TV",
            Self::TvShort => "TV Short",
            Self::Movie => "Movie",
            Self::Special => "Special",
            Self::Ova => "OVA",
            Self::Ona => "ONA",
            Self::Music => "Music",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL
            .into_iter()
            .find(|s| s.as_graphql().eq_ignore_ascii_case(raw))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortKey {
    #[default]
    Popularity,
    Score,
    Trending,
    Favourites,
    UpdatedAt,
    StartDate,
    TitleRomaji,
}

impl SortKey {
    pub const ALL: [SortKey; 7] = [
        Self::Popularity,
        Self::Score,
        Self::Trending,
        Self::Favourites,
        Self::UpdatedAt,
        Self::StartDate,
        Self::TitleRomaji,
    ];

    pub fn as_graphql(self) -> &'static str {
        match self {
            Self::Popularity => "POPULARITY_DESC",
            Self::Score => "SCORE_DESC",
            Self::Trending => "TRENDING_DESC",
            Self::Favourites => "FAVOURITES_DESC",
            Self::UpdatedAt => "UPDATED_AT_DESC",
            Self::StartDate => "START_DATE_DESC",
            Self::TitleRomaji => "TITLE_ROMAJI",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Popularity => "Most Popular",
            Self::Score => "Highest Rated",
            Self::Trending => "Trending",
            Self::Favourites => "Most Favourited",
            Self::UpdatedAt => "Recently Updated",
            Self::StartDate => "Newest",
            Self::TitleRomaji => "Title Order",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL
            .into_iter()
            .find(|s| s.as_graphql().eq_ignore_ascii_case(raw))
    }
}

macro_rules! serialize_as_graphql {
    ($($ty:ty),*) => {
        $(
            impl Serialize for $ty {
                fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                    serializer.serialize_str(self.as_graphql())
                }
            }

            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.label())
                }
            }
        )*
    };
}

serialize_as_graphql!(MediaStatus, MediaFormat, SortKey);

/// A single-select control whose first entry is "all".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice<T> {
    All,
    Only(T),
}

impl<T> Default for Choice<T> {
    fn default() -> Self {
        Choice::All
    }
}

impl<T: Copy> Choice<T> {
    pub fn selected(&self) -> Option<T> {
        match self {
            Choice::All => None,
            Choice::Only(v) => Some(*v),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Choice::All)
    }
}

impl<T: Serialize> Serialize for Choice<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Choice::All => serializer.serialize_str("all"),
            Choice::Only(v) => v.serialize(serializer),
        }
    }
}

/// Accepts release years AniList can plausibly hold.
pub fn valid_year(year: i32) -> bool {
    (1940..=2100).contains(&year)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EpisodeFilter {
    pub enabled: bool,
    pub min: u32,
    pub max: u32,
}

impl Default for EpisodeFilter {
    fn default() -> Self {
        Self {
            enabled: false,
            min: DEFAULT_EPISODE_RANGE.0,
            max: DEFAULT_EPISODE_RANGE.1,
        }
    }
}

impl EpisodeFilter {
    /// Clamps both bounds into the slider range and orders them.
    pub fn with_range(self, min: u32, max: u32) -> Self {
        let a = min.clamp(EPISODE_MIN, EPISODE_MAX);
        let b = max.clamp(EPISODE_MIN, EPISODE_MAX);
        Self {
            min: a.min(b),
            max: a.max(b),
            ..self
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterState {
    pub query: String,
    /// Set semantics, but kept in the order genres were picked.
    pub genres: Vec<String>,
    pub year: Choice<i32>,
    pub status: Choice<MediaStatus>,
    pub format: Choice<MediaFormat>,
    pub sort: SortKey,
    pub score_floor: u8,
    pub episodes: EpisodeFilter,
}

impl FilterState {
    pub fn toggle_genre(&mut self, genre: &str) -> bool {
        let Some(genre) = canonical_genre(genre) else {
            return false;
        };
        if let Some(pos) = self.genres.iter().position(|g| g == genre) {
            self.genres.remove(pos);
        } else {
            self.genres.push(genre.to_string());
        }
        true
    }

    /// Adds a genre if absent; used when reading a URL.
    pub fn insert_genre(&mut self, genre: &str) -> bool {
        match canonical_genre(genre) {
            Some(g) if !self.genres.iter().any(|x| x == g) => {
                self.genres.push(g.to_string());
                true
            }
            _ => false,
        }
    }

    pub fn is_default(&self) -> bool {
        *self == FilterState::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageCursor {
    pub page: u32,
    pub per_page: u32,
}

impl PageCursor {
    pub fn new(per_page: u32) -> Self {
        Self {
            page: 1,
            per_page: per_page.max(1),
        }
    }

    pub fn reset(&mut self) {
        self.page = 1;
    }

    pub fn goto(&mut self, page: u32) -> bool {
        if page == 0 {
            return false;
        }
        self.page = page;
        true
    }
}

impl Default for PageCursor {
    fn default() -> Self {
        Self::new(DEFAULT_PER_PAGE)
    }
}

/// Path-encoded presets for the search page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteFilter {
    Search,
    Status(MediaStatus),
    Genre,
    Year,
    Animations,
}

impl RouteFilter {
    pub fn from_path(path: &str) -> Option<Self> {
        let path = path.trim_end_matches('/');
        let path = path.strip_prefix("/api").unwrap_or(path);
        if let Some(status) = path.strip_prefix("/status/") {
            return match status {
                "airing" => Some(Self::Status(MediaStatus::Releasing)),
                "finished" => Some(Self::Status(MediaStatus::Finished)),
                "upcoming" => Some(Self::Status(MediaStatus::NotYetReleased)),
                _ => None,
            };
        }
        match path {
            "/search" => Some(Self::Search),
            "/genre" => Some(Self::Genre),
            "/year" => Some(Self::Year),
            "/animations" => Some(Self::Animations),
            _ => None,
        }
    }

    /// Overrides whatever the query string set for the same field.
    pub fn apply(self, filter: &mut FilterState) {
        match self {
            Self::Search => {}
            Self::Status(status) => filter.status = Choice::Only(status),
            Self::Genre | Self::Animations => filter.sort = SortKey::Popularity,
            Self::Year => filter.sort = SortKey::StartDate,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Status(MediaStatus::Releasing) => "Airing Animations",
            Self::Status(MediaStatus::Finished) => "Completed Animations",
            Self::Status(MediaStatus::NotYetReleased) => "Upcoming Animations",
            Self::Genre => "Animations by Genre",
            Self::Year => "Animations by Year",
            Self::Animations => "All Animations",
            Self::Search | Self::Status(_) => "Advanced Search",
        }
    }
}

/// One change coming from a filter control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterEdit {
    Query(String),
    ToggleGenre(String),
    Year(Choice<i32>),
    Status(Choice<MediaStatus>),
    Format(Choice<MediaFormat>),
    Sort(SortKey),
    ScoreFloor(u8),
    EpisodeToggle(bool),
    EpisodeRange(u32, u32),
}

/// Owns the filter state and cursor of one search page.
#[derive(Debug, Clone)]
pub struct SearchController {
    route: RouteFilter,
    filter: FilterState,
    cursor: PageCursor,
}

impl SearchController {
    /// Reads the URL once: query parameters first, then the route preset.
    pub fn mount(route: RouteFilter, params: &[(String, String)], per_page: u32) -> Self {
        let mut filter = url_sync::filter_from_params(params);
        route.apply(&mut filter);
        debug!(?route, params = params.len(), "Mounted search filters");
        Self {
            route,
            filter,
            cursor: PageCursor::new(per_page),
        }
    }

    pub fn route(&self) -> RouteFilter {
        self.route
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn cursor(&self) -> PageCursor {
        self.cursor
    }

    /// Returns whether the filter changed; any change puts the cursor back on page 1.
    pub fn edit(&mut self, edit: FilterEdit) -> bool {
        let before = self.filter.clone();
        match edit {
            FilterEdit::Query(q) => self.filter.query = q,
            FilterEdit::ToggleGenre(g) => {
                self.filter.toggle_genre(&g);
            }
            FilterEdit::Year(year) => {
                if let Choice::Only(y) = year {
                    if !valid_year(y) {
                        return false;
                    }
                }
                self.filter.year = year;
            }
            FilterEdit::Status(status) => self.filter.status = status,
            FilterEdit::Format(format) => self.filter.format = format,
            FilterEdit::Sort(sort) => self.filter.sort = sort,
            FilterEdit::ScoreFloor(score) => self.filter.score_floor = score.min(SCORE_MAX),
            FilterEdit::EpisodeToggle(enabled) => self.filter.episodes.enabled = enabled,
            FilterEdit::EpisodeRange(min, max) => {
                self.filter.episodes = self.filter.episodes.with_range(min, max)
            }
        }
        let changed = self.filter != before;
        if changed {
            self.cursor.reset();
        }
        changed
    }

    pub fn goto_page(&mut self, page: u32) -> bool {
        self.cursor.goto(page)
    }

    /// Explicit search submission: back to page 1 and the query string to
    /// mirror into the address bar.
    pub fn submit(&mut self) -> String {
        self.cursor.reset();
        url_sync::to_query_string(&self.filter)
    }

    /// Restores defaults (the route preset still applies) and clears the URL.
    pub fn clear(&mut self) -> String {
        self.filter = FilterState::default();
        self.route.apply(&mut self.filter);
        self.cursor.reset();
        String::new()
    }

    pub fn variables(&self) -> QueryVariables {
        query::build_search_variables(&self.filter, &self.cursor)
    }
}
