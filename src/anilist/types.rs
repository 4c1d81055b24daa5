//! Wire shapes of the AniList responses. Everything is optional because
//! AniList nulls out fields freely.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct GraphQlResponse<T> {
    pub(crate) data: Option<T>,
    pub(crate) errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GraphQlError {
    pub(crate) message: String,
    pub(crate) status: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PageData {
    #[serde(rename = "Page")]
    pub(crate) page: Option<Page>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TrendingData {
    pub(crate) trending: Option<Page>,
    pub(crate) season: Option<Page>,
    pub(crate) next_season: Option<Page>,
    pub(crate) popular: Option<Page>,
    pub(crate) top: Option<Page>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DetailData {
    #[serde(rename = "Media")]
    pub(crate) media: Option<DetailMedia>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Page {
    #[serde(rename = "pageInfo")]
    pub(crate) page_info: Option<RawPageInfo>,
    pub(crate) media: Option<Vec<Media>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawPageInfo {
    pub(crate) total: Option<i32>,
    pub(crate) current_page: Option<i32>,
    pub(crate) last_page: Option<i32>,
    pub(crate) has_next_page: Option<bool>,
    pub(crate) per_page: Option<i32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Media {
    pub(crate) id: i32,
    pub(crate) title: Option<MediaTitle>,
    pub(crate) cover_image: Option<CoverImage>,
    pub(crate) average_score: Option<i32>,
    pub(crate) genres: Option<Vec<String>>,
    pub(crate) description: Option<String>,
    pub(crate) banner_image: Option<String>,
    pub(crate) status: Option<String>,
    pub(crate) episodes: Option<i32>,
    pub(crate) format: Option<String>,
    pub(crate) start_date: Option<FuzzyDate>,
    pub(crate) airing_schedule: Option<Nodes<AiringNode>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DetailMedia {
    pub(crate) id: i32,
    pub(crate) title: Option<MediaTitle>,
    pub(crate) description: Option<String>,
    pub(crate) cover_image: Option<CoverImage>,
    pub(crate) banner_image: Option<String>,
    pub(crate) average_score: Option<i32>,
    pub(crate) mean_score: Option<i32>,
    pub(crate) popularity: Option<i32>,
    pub(crate) favourites: Option<i32>,
    pub(crate) episodes: Option<i32>,
    pub(crate) duration: Option<i32>,
    pub(crate) status: Option<String>,
    pub(crate) format: Option<String>,
    pub(crate) genres: Option<Vec<String>>,
    pub(crate) tags: Option<Vec<RawTag>>,
    pub(crate) studios: Option<Nodes<Studio>>,
    pub(crate) staff: Option<Nodes<PersonNode>>,
    pub(crate) characters: Option<Nodes<PersonNode>>,
    pub(crate) start_date: Option<FuzzyDate>,
    pub(crate) end_date: Option<FuzzyDate>,
    pub(crate) season: Option<String>,
    pub(crate) season_year: Option<i32>,
    pub(crate) source: Option<String>,
    pub(crate) trailer: Option<Trailer>,
    pub(crate) external_links: Option<Vec<RawExternalLink>>,
    pub(crate) relations: Option<Nodes<RelationNode>>,
    pub(crate) recommendations: Option<Nodes<RecommendationNode>>,
}

/// AniList's `{ nodes: [...] }` connection wrapper.
#[derive(Debug, Deserialize)]
pub(crate) struct Nodes<T> {
    pub(crate) nodes: Option<Vec<Option<T>>>,
}

impl<T> Nodes<T> {
    pub(crate) fn into_vec(self) -> Vec<T> {
        self.nodes
            .unwrap_or_default()
            .into_iter()
            .flatten()
            .collect()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MediaTitle {
    pub(crate) user_preferred: Option<String>,
    pub(crate) english: Option<String>,
    pub(crate) native: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CoverImage {
    pub(crate) extra_large: Option<String>,
    pub(crate) large: Option<String>,
    pub(crate) medium: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FuzzyDate {
    pub(crate) year: Option<i32>,
    pub(crate) month: Option<i32>,
    pub(crate) day: Option<i32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AiringNode {
    pub(crate) airing_at: Option<i64>,
    pub(crate) episode: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawTag {
    pub(crate) name: Option<String>,
    pub(crate) description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Studio {
    pub(crate) name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PersonNode {
    pub(crate) id: i32,
    pub(crate) name: Option<PersonName>,
    pub(crate) image: Option<PersonImage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PersonName {
    pub(crate) user_preferred: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PersonImage {
    pub(crate) medium: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Trailer {
    pub(crate) id: Option<String>,
    pub(crate) site: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawExternalLink {
    pub(crate) url: Option<String>,
    pub(crate) site: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RelationNode {
    pub(crate) id: i32,
    pub(crate) title: Option<MediaTitle>,
    pub(crate) cover_image: Option<CoverImage>,
    pub(crate) format: Option<String>,
    pub(crate) status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RecommendationNode {
    pub(crate) media_recommendation: Option<RecommendedMedia>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RecommendedMedia {
    pub(crate) id: i32,
    pub(crate) title: Option<MediaTitle>,
    pub(crate) cover_image: Option<CoverImage>,
    pub(crate) average_score: Option<i32>,
}
