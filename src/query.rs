//! Translation from page filter state into GraphQL variables.
//!
//! "No filter" is expressed to AniList by leaving a key out, never by sending
//! a wildcard value, so every builder here only inserts keys for fields that
//! are actually set.

use serde::Serialize;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

use crate::filter::{Choice, FilterState, PageCursor, SortKey};
use crate::season::{Season, SeasonPair};

pub const SCHEDULE_PER_PAGE: u32 = 100;

/// Flat variables object sent alongside a GraphQL document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct QueryVariables(Map<String, Value>);

impl QueryVariables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.0.insert(key.to_string(), value.into());
    }

    pub fn set_opt<T: Into<Value>>(&mut self, key: &str, value: Option<T>) {
        if let Some(v) = value {
            self.set(key, v);
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Stable text form with keys sorted, whatever order they were set in.
    pub fn canonical(&self) -> String {
        let sorted: BTreeMap<&str, &Value> = self.0.iter().map(|(k, v)| (k.as_str(), v)).collect();
        serde_json::to_string(&sorted).unwrap_or_default()
    }

    fn with_cursor(mut self, cursor: &PageCursor) -> Self {
        self.set("page", cursor.page);
        self.set("perPage", cursor.per_page);
        self
    }
}

pub fn build_search_variables(filter: &FilterState, cursor: &PageCursor) -> QueryVariables {
    let mut vars = QueryVariables::new();

    let search = filter.query.trim();
    if !search.is_empty() {
        vars.set("search", search);
    }
    if !filter.genres.is_empty() {
        vars.set("genre", filter.genres.clone());
    }
    vars.set_opt("year", filter.year.selected());
    vars.set_opt("status", filter.status.selected().map(|s| s.as_graphql()));
    vars.set_opt("format", filter.format.selected().map(|f| f.as_graphql()));
    vars.set("sort", json!([filter.sort.as_graphql()]));
    if filter.score_floor > 0 {
        vars.set("scoreGreater", filter.score_floor);
    }
    if filter.episodes.enabled {
        vars.set("episodeGreater", filter.episodes.min);
        vars.set("episodeLesser", filter.episodes.max);
    }

    vars.with_cursor(cursor)
}

/// Tabs of the popular page; `/top-rated` opens on `Score`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PopularTab {
    #[default]
    Popularity,
    Score,
    Trending,
    Favourites,
}

impl PopularTab {
    pub const ALL: [PopularTab; 4] = [
        Self::Popularity,
        Self::Score,
        Self::Trending,
        Self::Favourites,
    ];

    pub fn sort(self) -> SortKey {
        match self {
            Self::Popularity => SortKey::Popularity,
            Self::Score => SortKey::Score,
            Self::Trending => SortKey::Trending,
            Self::Favourites => SortKey::Favourites,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Popularity => "Popular Anime",
            Self::Score => "Top Rated Anime",
            Self::Trending => "Trending Anime",
            Self::Favourites => "Most Favourited Anime",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "popularity" | "popular" | "0" => Some(Self::Popularity),
            "score" | "top-rated" | "1" => Some(Self::Score),
            "trending" | "2" => Some(Self::Trending),
            "favourites" | "favorites" | "3" => Some(Self::Favourites),
            _ => None,
        }
    }
}

pub fn build_popular_variables(
    tab: PopularTab,
    year: Choice<i32>,
    cursor: &PageCursor,
) -> QueryVariables {
    let mut vars = QueryVariables::new();
    vars.set("sort", json!([tab.sort().as_graphql()]));
    vars.set_opt("year", year.selected());
    vars.with_cursor(cursor)
}

pub fn build_new_releases_variables(
    season: Option<Season>,
    season_year: i32,
    cursor: &PageCursor,
) -> QueryVariables {
    let mut vars = QueryVariables::new();
    vars.set_opt("season", season.map(|s| s.as_graphql()));
    vars.set("seasonYear", season_year);
    vars.with_cursor(cursor)
}

pub fn build_trending_variables(pair: &SeasonPair) -> QueryVariables {
    let mut vars = QueryVariables::new();
    vars.set("season", pair.season.as_graphql());
    vars.set("seasonYear", pair.season_year);
    vars.set("nextSeason", pair.next_season.as_graphql());
    vars.set("nextYear", pair.next_year);
    vars
}

pub fn build_schedule_variables() -> QueryVariables {
    QueryVariables::new().with_cursor(&PageCursor::new(SCHEDULE_PER_PAGE))
}

pub fn build_detail_variables(id: i32) -> QueryVariables {
    let mut vars = QueryVariables::new();
    vars.set("id", id);
    vars
}
