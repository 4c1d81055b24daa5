use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

mod client;
mod map;
mod operation;
mod text;
mod types;

pub use client::{AniListClient, ANILIST_ENDPOINT};
pub use map::{decode_detail, decode_page, decode_schedule, decode_trending};
pub use operation::Operation;
pub use text::{plain_description, summary_excerpt};

use crate::query::QueryVariables;

/// Anything that can answer a named AniList operation with its `data` object.
#[async_trait]
pub trait GraphQlTransport: Send + Sync {
    async fn execute(&self, operation: Operation, variables: &QueryVariables) -> Result<Value>;
}

#[async_trait]
impl GraphQlTransport for AniListClient {
    async fn execute(&self, operation: Operation, variables: &QueryVariables) -> Result<Value> {
        self.post_operation(operation, variables).await
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaSummary {
    pub id: i32,
    pub title: String,
    pub cover_image: Option<String>,
    pub average_score: Option<i32>,
    pub genres: Vec<String>,
    pub description: Option<String>,
    pub excerpt: Option<String>,
    pub banner_image: Option<String>,
    pub status: Option<String>,
    pub status_label: Option<String>,
    pub episodes: Option<i32>,
    pub format: Option<String>,
    pub format_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub total: i32,
    pub current_page: i32,
    pub last_page: i32,
    pub has_next_page: bool,
    pub per_page: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaPage {
    pub page_info: PageInfo,
    pub media: Vec<MediaSummary>,
}

impl MediaPage {
    pub fn is_empty(&self) -> bool {
        self.media.is_empty()
    }
}

/// Home/trending aggregation; each section is one aliased `Page` in the query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendingSections {
    pub trending: Vec<MediaSummary>,
    pub season: Vec<MediaSummary>,
    pub next_season: Vec<MediaSummary>,
    pub popular: Vec<MediaSummary>,
    pub top: Vec<MediaSummary>,
}

impl TrendingSections {
    pub fn is_empty(&self) -> bool {
        self.trending.is_empty()
            && self.season.is_empty()
            && self.next_season.is_empty()
            && self.popular.is_empty()
            && self.top.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledMedia {
    #[serde(flatten)]
    pub media: MediaSummary,
    /// Unix seconds of the latest airing slot, if AniList has one.
    pub airing_at: Option<i64>,
    pub airing_episode: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub id: i32,
    pub name: String,
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tag {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExternalLink {
    pub site: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedMedia {
    pub id: i32,
    pub title: String,
    pub cover_image: Option<String>,
    pub format: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub id: i32,
    pub title: String,
    pub cover_image: Option<String>,
    pub average_score: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaDetail {
    #[serde(flatten)]
    pub summary: MediaSummary,
    pub title_english: Option<String>,
    pub title_native: Option<String>,
    pub mean_score: Option<i32>,
    pub popularity: Option<i32>,
    pub favourites: Option<i32>,
    pub duration: Option<i32>,
    pub tags: Vec<Tag>,
    pub studios: Vec<String>,
    pub staff: Vec<Person>,
    pub characters: Vec<Person>,
    pub end_date: Option<String>,
    pub season: Option<String>,
    pub season_year: Option<i32>,
    pub source: Option<String>,
    pub trailer: Option<String>,
    pub external_links: Vec<ExternalLink>,
    pub relations: Vec<RelatedMedia>,
    pub recommendations: Vec<Recommendation>,
}
