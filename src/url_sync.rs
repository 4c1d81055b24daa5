//! Mirrors filter state into the address bar and back.
//!
//! Writing happens only on an explicit search submission; reading happens
//! once on mount and is best effort: anything unrecognised is skipped and the
//! field keeps its default.

use chrono::Weekday;
use tracing::debug;

use crate::filter::{
    valid_year, Choice, FilterState, MediaFormat, MediaStatus, SortKey, EPISODE_MAX, EPISODE_MIN,
    SCORE_MAX,
};
use crate::query::PopularTab;
use crate::season::Season;

pub fn to_query_string(filter: &FilterState) -> String {
    let mut pairs: Vec<(&str, String)> = Vec::new();

    let q = filter.query.trim();
    if !q.is_empty() {
        pairs.push(("q", q.to_string()));
    }
    if !filter.genres.is_empty() {
        pairs.push(("genres", filter.genres.join(",")));
    }
    if let Some(year) = filter.year.selected() {
        pairs.push(("year", year.to_string()));
    }
    if let Some(status) = filter.status.selected() {
        pairs.push(("status", status.as_graphql().to_string()));
    }
    if let Some(format) = filter.format.selected() {
        pairs.push(("format", format.as_graphql().to_string()));
    }
    if filter.sort != SortKey::default() {
        pairs.push(("sort", filter.sort.as_graphql().to_string()));
    }
    if filter.score_floor > 0 {
        pairs.push(("score", filter.score_floor.to_string()));
    }
    if filter.episodes.enabled {
        pairs.push((
            "episodes",
            format!("{}-{}", filter.episodes.min, filter.episodes.max),
        ));
    }

    pairs
        .into_iter()
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(&v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Splits a raw query string into decoded pairs. Pairs that fail to decode are dropped.
pub fn parse_query_string(raw: &str) -> Vec<(String, String)> {
    raw.trim_start_matches('?')
        .split('&')
        .filter(|part| !part.is_empty())
        .filter_map(|part| {
            let (key, value) = part.split_once('=').unwrap_or((part, ""));
            let key = decode_component(key)?;
            let value = decode_component(value)?;
            Some((key, value))
        })
        .collect()
}

fn decode_component(raw: &str) -> Option<String> {
    let spaced = raw.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => Some(decoded.into_owned()),
        Err(e) => {
            debug!("Skipping undecodable query component {:?}: {}", raw, e);
            None
        }
    }
}

pub fn filter_from_params(params: &[(String, String)]) -> FilterState {
    let mut filter = FilterState::default();
    for (key, value) in params {
        match key.as_str() {
            "q" => filter.query = value.clone(),
            "genres" => {
                for genre in value.split(',') {
                    filter.insert_genre(genre);
                }
            }
            "year" => {
                if let Some(year) = parse_year(value) {
                    filter.year = Choice::Only(year);
                }
            }
            "status" => {
                if let Some(status) = MediaStatus::parse(value) {
                    filter.status = Choice::Only(status);
                }
            }
            "format" => {
                if let Some(format) = MediaFormat::parse(value) {
                    filter.format = Choice::Only(format);
                }
            }
            "sort" => {
                if let Some(sort) = SortKey::parse(value) {
                    filter.sort = sort;
                }
            }
            "score" => {
                if let Some(score) = value.trim().parse::<u8>().ok().filter(|s| *s <= SCORE_MAX) {
                    filter.score_floor = score;
                }
            }
            "episodes" => {
                if let Some((min, max)) = parse_episode_range(value) {
                    filter.episodes.enabled = true;
                    filter.episodes.min = min;
                    filter.episodes.max = max;
                }
            }
            _ => {}
        }
    }
    filter
}

pub fn parse_year(raw: &str) -> Option<i32> {
    raw.trim().parse::<i32>().ok().filter(|y| valid_year(*y))
}

fn parse_episode_range(raw: &str) -> Option<(u32, u32)> {
    let (min, max) = raw.trim().split_once('-')?;
    let min = min.trim().parse::<u32>().ok()?;
    let max = max.trim().parse::<u32>().ok()?;
    let in_range = |n: u32| (EPISODE_MIN..=EPISODE_MAX).contains(&n);
    (in_range(min) && in_range(max) && min <= max).then_some((min, max))
}

pub fn parse_page(raw: &str) -> Option<u32> {
    raw.trim().parse::<u32>().ok().filter(|p| *p >= 1)
}

/// Parameters of the popular and top-rated pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PopularParams {
    pub tab: PopularTab,
    pub year: Choice<i32>,
    pub page: Option<u32>,
}

pub fn popular_from_params(params: &[(String, String)]) -> PopularParams {
    let mut out = PopularParams::default();
    for (key, value) in params {
        match key.as_str() {
            "tab" => {
                if let Some(tab) = PopularTab::parse(value) {
                    out.tab = tab;
                }
            }
            "year" => {
                if let Some(year) = parse_year(value) {
                    out.year = Choice::Only(year);
                }
            }
            "page" => out.page = parse_page(value).or(out.page),
            _ => {}
        }
    }
    out
}

/// Parameters of the new-releases page; the year falls back to the caller's default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NewReleasesParams {
    pub season: Option<Season>,
    pub year: Option<i32>,
    pub page: Option<u32>,
}

pub fn new_releases_from_params(params: &[(String, String)]) -> NewReleasesParams {
    let mut out = NewReleasesParams::default();
    for (key, value) in params {
        match key.as_str() {
            "season" => out.season = Season::parse(value).or(out.season),
            "year" => out.year = parse_year(value).or(out.year),
            "page" => out.page = parse_page(value).or(out.page),
            _ => {}
        }
    }
    out
}

/// `day` on the schedule page: 0-6 (Sunday first) or an English weekday name.
pub fn weekday_from_params(params: &[(String, String)]) -> Option<Weekday> {
    params
        .iter()
        .filter(|(k, _)| k == "day")
        .filter_map(|(_, v)| parse_weekday(v))
        .last()
}

fn parse_weekday(raw: &str) -> Option<Weekday> {
    let raw = raw.trim();
    if let Ok(idx) = raw.parse::<u32>() {
        return match idx {
            0 => Some(Weekday::Sun),
            1 => Some(Weekday::Mon),
            2 => Some(Weekday::Tue),
            3 => Some(Weekday::Wed),
            4 => Some(Weekday::Thu),
            5 => Some(Weekday::Fri),
            6 => Some(Weekday::Sat),
            _ => None,
        };
    }
    raw.parse::<Weekday>().ok()
}
