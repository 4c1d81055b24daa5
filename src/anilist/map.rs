use anyhow::{anyhow, Context, Result};
use serde_json::Value;

use super::text::{plain_description, summary_excerpt};
use super::types::{
    CoverImage, DetailData, DetailMedia, FuzzyDate, Media, MediaTitle, Nodes, Page, PageData,
    PersonNode, RawPageInfo, TrendingData, Trailer,
};
use super::{
    ExternalLink, MediaDetail, MediaPage, MediaSummary, PageInfo, Person, Recommendation,
    RelatedMedia, ScheduledMedia, Tag, TrendingSections,
};
use crate::filter::{MediaFormat, MediaStatus};

const EXCERPT_CHARS: usize = 180;
const MAX_CHARACTERS: usize = 8;
const MAX_STAFF: usize = 8;
const MAX_RECOMMENDATIONS: usize = 6;

pub fn decode_page(data: Value) -> Result<MediaPage> {
    let parsed: PageData = serde_json::from_value(data).context("Failed to decode media page")?;
    let page = parsed.page.unwrap_or_default();
    let media = page
        .media
        .unwrap_or_default()
        .into_iter()
        .map(summarize)
        .collect::<Vec<_>>();
    let page_info = page
        .page_info
        .map(|info| page_info(info, media.len()))
        .unwrap_or_else(|| PageInfo {
            total: media.len() as i32,
            current_page: 1,
            last_page: 1,
            has_next_page: false,
            per_page: media.len() as i32,
        });
    Ok(MediaPage { page_info, media })
}

pub fn decode_trending(data: Value) -> Result<TrendingSections> {
    let parsed: TrendingData =
        serde_json::from_value(data).context("Failed to decode trending sections")?;
    let section = |page: Option<Page>| -> Vec<MediaSummary> {
        page.and_then(|p| p.media)
            .unwrap_or_default()
            .into_iter()
            .map(summarize)
            .collect()
    };
    Ok(TrendingSections {
        trending: section(parsed.trending),
        season: section(parsed.season),
        next_season: section(parsed.next_season),
        popular: section(parsed.popular),
        top: section(parsed.top),
    })
}

pub fn decode_schedule(data: Value) -> Result<Vec<ScheduledMedia>> {
    let parsed: PageData =
        serde_json::from_value(data).context("Failed to decode airing schedule")?;
    Ok(parsed
        .page
        .and_then(|p| p.media)
        .unwrap_or_default()
        .into_iter()
        .map(|mut media| {
            let slot = media
                .airing_schedule
                .take()
                .and_then(|s| s.into_vec().into_iter().next());
            let (airing_at, airing_episode) = match slot {
                Some(node) => (node.airing_at.filter(|t| *t > 0), node.episode),
                None => (None, None),
            };
            ScheduledMedia {
                media: summarize(media),
                airing_at,
                airing_episode,
            }
        })
        .collect())
}

pub fn decode_detail(data: Value) -> Result<MediaDetail> {
    let parsed: DetailData =
        serde_json::from_value(data).context("Failed to decode media detail")?;
    let media = parsed
        .media
        .ok_or_else(|| anyhow!("AniList returned no media"))?;
    Ok(detail(media))
}

fn page_info(info: RawPageInfo, fallback_len: usize) -> PageInfo {
    PageInfo {
        total: info.total.unwrap_or(fallback_len as i32),
        current_page: info.current_page.unwrap_or(1).max(1),
        last_page: info.last_page.unwrap_or(1).max(1),
        has_next_page: info.has_next_page.unwrap_or(false),
        per_page: info.per_page.unwrap_or(fallback_len as i32),
    }
}

fn summarize(media: Media) -> MediaSummary {
    let description = clean_description(media.description.as_deref());
    MediaSummary {
        id: media.id,
        title: preferred_title(media.title.as_ref()),
        cover_image: media.cover_image.as_ref().and_then(best_cover),
        average_score: media.average_score,
        genres: media.genres.unwrap_or_default(),
        excerpt: description
            .as_deref()
            .map(|d| summary_excerpt(d, EXCERPT_CHARS)),
        description,
        banner_image: media.banner_image,
        status_label: media.status.as_deref().map(status_label),
        status: media.status,
        episodes: media.episodes,
        format_label: media.format.as_deref().map(format_label),
        format: media.format,
        start_date: media.start_date.as_ref().and_then(format_fuzzy_date),
    }
}

fn detail(media: DetailMedia) -> MediaDetail {
    let description = clean_description(media.description.as_deref());
    let title = media.title.unwrap_or_default();

    let summary = MediaSummary {
        id: media.id,
        title: preferred_title(Some(&title)),
        cover_image: media.cover_image.as_ref().and_then(best_cover),
        average_score: media.average_score,
        genres: media.genres.unwrap_or_default(),
        excerpt: description
            .as_deref()
            .map(|d| summary_excerpt(d, EXCERPT_CHARS)),
        description,
        banner_image: media.banner_image,
        status_label: media.status.as_deref().map(status_label),
        status: media.status,
        episodes: media.episodes,
        format_label: media.format.as_deref().map(format_label),
        format: media.format,
        start_date: media.start_date.as_ref().and_then(format_fuzzy_date),
    };

    MediaDetail {
        summary,
        title_english: non_blank(title.english),
        title_native: non_blank(title.native),
        mean_score: media.mean_score,
        popularity: media.popularity,
        favourites: media.favourites,
        duration: media.duration,
        tags: media
            .tags
            .unwrap_or_default()
            .into_iter()
            .filter_map(|t| {
                Some(Tag {
                    name: t.name?,
                    description: t.description,
                })
            })
            .collect(),
        studios: media
            .studios
            .map(|s| s.into_vec())
            .unwrap_or_default()
            .into_iter()
            .filter_map(|s| s.name)
            .collect(),
        staff: people(media.staff, MAX_STAFF),
        characters: people(media.characters, MAX_CHARACTERS),
        end_date: media.end_date.as_ref().and_then(format_fuzzy_date),
        season: media.season,
        season_year: media.season_year,
        source: media.source,
        trailer: media.trailer.as_ref().and_then(trailer_url),
        external_links: media
            .external_links
            .unwrap_or_default()
            .into_iter()
            .filter_map(|l| {
                Some(ExternalLink {
                    site: l.site?,
                    url: l.url?,
                })
            })
            .collect(),
        relations: media
            .relations
            .map(|r| r.into_vec())
            .unwrap_or_default()
            .into_iter()
            .map(|r| RelatedMedia {
                id: r.id,
                title: preferred_title(r.title.as_ref()),
                cover_image: r.cover_image.as_ref().and_then(best_cover),
                format: r.format,
                status: r.status,
            })
            .collect(),
        recommendations: media
            .recommendations
            .map(|r| r.into_vec())
            .unwrap_or_default()
            .into_iter()
            .filter_map(|r| r.media_recommendation)
            .map(|m| Recommendation {
                id: m.id,
                title: preferred_title(m.title.as_ref()),
                cover_image: m.cover_image.as_ref().and_then(best_cover),
                average_score: m.average_score,
            })
            .take(MAX_RECOMMENDATIONS)
            .collect(),
    }
}

fn people(nodes: Option<Nodes<PersonNode>>, cap: usize) -> Vec<Person> {
    nodes
        .map(Nodes::into_vec)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|p| {
            let name = p.name.and_then(|n| n.user_preferred)?;
            Some(Person {
                id: p.id,
                name,
                image: p.image.and_then(|i| i.medium),
            })
        })
        .take(cap)
        .collect()
}

fn preferred_title(title: Option<&MediaTitle>) -> String {
    title
        .and_then(|t| {
            [&t.user_preferred, &t.english, &t.native]
                .into_iter()
                .flatten()
                .map(|s| s.trim())
                .find(|s| !s.is_empty())
        })
        .unwrap_or("Unknown Title")
        .to_string()
}

fn best_cover(cover: &CoverImage) -> Option<String> {
    cover
        .extra_large
        .clone()
        .or_else(|| cover.large.clone())
        .or_else(|| cover.medium.clone())
}

fn clean_description(raw: Option<&str>) -> Option<String> {
    raw.map(plain_description).filter(|s| !s.is_empty())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

fn status_label(raw: &str) -> String {
    MediaStatus::parse(raw)
        .map(|s| s.label().to_string())
        .unwrap_or_else(|| raw.to_string())
}

fn format_label(raw: &str) -> String {
    MediaFormat::parse(raw)
        .map(|f| f.label().to_string())
        .unwrap_or_else(|| raw.to_string())
}

/// `YYYY.MM.DD`, with `??` for unknown month or day; `None` without a year.
pub(crate) fn format_fuzzy_date(date: &FuzzyDate) -> Option<String> {
    let year = date.year?;
    let part = |v: Option<i32>| match v {
        Some(n) if n > 0 => format!("{:02}", n),
        _ => "??".to_string(),
    };
    Some(format!("{}.{}.{}", year, part(date.month), part(date.day)))
}

fn trailer_url(trailer: &Trailer) -> Option<String> {
    let id = trailer.id.as_deref()?;
    match trailer.site.as_deref()?.to_ascii_lowercase().as_str() {
        "youtube" => Some(format!("https://www.youtube.com/watch?v={}", id)),
        "dailymotion" => Some(format!("https://www.dailymotion.com/video/{}", id)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fuzzy_dates_fill_unknown_parts() {
        let full = FuzzyDate {
            year: Some(2024),
            month: Some(1),
            day: Some(2),
        };
        assert_eq!(format_fuzzy_date(&full).as_deref(), Some("2024.01.02"));
        let partial = FuzzyDate {
            year: Some(2024),
            month: Some(10),
            day: None,
        };
        assert_eq!(format_fuzzy_date(&partial).as_deref(), Some("2024.10.??"));
        let none = FuzzyDate {
            year: None,
            month: Some(3),
            day: Some(1),
        };
        assert_eq!(format_fuzzy_date(&none), None);
    }

    #[test]
    fn page_decodes_summaries_with_labels() {
        let data = json!({
            "Page": {
                "pageInfo": { "total": 41, "currentPage": 2, "lastPage": 3, "hasNextPage": true, "perPage": 20 },
                "media": [{
                    "id": 21,
                    "title": { "userPreferred": "ONE PIECE" },
                    "coverImage": { "large": "https://img/21.jpg" },
                    "averageScore": 88,
                    "genres": ["Action", "Adventure"],
                    "description": "Gol D. Roger<br>was known as the <b>Pirate King</b>.",
                    "status": "RELEASING",
                    "episodes": null,
                    "format": "TV_SHORT"
                }]
            }
        });
        let page = decode_page(data).expect("page");
        assert_eq!(page.page_info.total, 41);
        assert!(page.page_info.has_next_page);
        let one = &page.media[0];
        assert_eq!(one.title, "ONE PIECE");
        assert_eq!(one.status_label.as_deref(), Some("Airing"));
        assert_eq!(one.format_label.as_deref(), Some("TV Short"));
        assert_eq!(one.genres, vec!["Action", "Adventure"]);
        assert_eq!(
            one.description.as_deref(),
            Some("Gol D. Roger\nwas known as the Pirate King.")
        );
    }

    #[test]
    fn missing_page_is_an_empty_result_not_an_error() {
        let page = decode_page(json!({ "Page": null })).expect("page");
        assert!(page.is_empty());
        assert_eq!(page.page_info.last_page, 1);
    }

    #[test]
    fn schedule_keeps_first_airing_node() {
        let data = json!({
            "Page": { "media": [
                { "id": 1, "title": { "userPreferred": "A" },
                  "airingSchedule": { "nodes": [ { "airingAt": 1_700_000_000, "episode": 7 } ] } },
                { "id": 2, "title": { "userPreferred": "B" }, "airingSchedule": { "nodes": [] } },
                { "id": 3, "title": { "userPreferred": "C" } }
            ] }
        });
        let rows = decode_schedule(data).expect("schedule");
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].airing_at, Some(1_700_000_000));
        assert_eq!(rows[0].airing_episode, Some(7));
        assert_eq!(rows[1].airing_at, None);
        assert_eq!(rows[2].airing_at, None);
    }

    #[test]
    fn detail_maps_nested_connections() {
        let data = json!({
            "Media": {
                "id": 5114,
                "title": { "userPreferred": "Hagane no Renkinjutsushi", "english": "Fullmetal Alchemist: Brotherhood", "native": " " },
                "coverImage": { "large": "l.jpg", "extraLarge": "xl.jpg" },
                "status": "FINISHED",
                "format": "TV",
                "studios": { "nodes": [ { "id": 4, "name": "bones" } ] },
                "characters": { "nodes": [ { "id": 11, "name": { "userPreferred": "Edward Elric" }, "image": { "medium": "ed.png" } }, null ] },
                "staff": { "nodes": [] },
                "startDate": { "year": 2009, "month": 4, "day": 5 },
                "endDate": { "year": 2010, "month": 7, "day": 4 },
                "trailer": { "id": "abc", "site": "youtube" },
                "externalLinks": [ { "id": 1, "url": "https://example.test", "site": "Official Site" }, { "id": 2, "site": "Broken" } ],
                "relations": { "nodes": [ { "id": 121, "title": { "userPreferred": "Hagane no Renkinjutsushi (2003)" }, "format": "TV", "status": "FINISHED" } ] },
                "recommendations": { "nodes": [ { "mediaRecommendation": null }, { "mediaRecommendation": { "id": 1535, "title": { "userPreferred": "Death Note" }, "averageScore": 84 } } ] }
            }
        });
        let d = decode_detail(data).expect("detail");
        assert_eq!(d.summary.cover_image.as_deref(), Some("xl.jpg"));
        assert_eq!(d.title_english.as_deref(), Some("Fullmetal Alchemist: Brotherhood"));
        assert_eq!(d.title_native, None);
        assert_eq!(d.studios, vec!["bones"]);
        assert_eq!(d.characters.len(), 1);
        assert_eq!(d.summary.start_date.as_deref(), Some("2009.04.05"));
        assert_eq!(d.end_date.as_deref(), Some("2010.07.04"));
        assert_eq!(d.trailer.as_deref(), Some("https://www.youtube.com/watch?v=abc"));
        assert_eq!(d.external_links.len(), 1);
        assert_eq!(d.relations[0].id, 121);
        assert_eq!(d.recommendations.len(), 1);
        assert_eq!(d.recommendations[0].title, "Death Note");
    }

    #[test]
    fn detail_without_media_is_an_error() {
        assert!(decode_detail(json!({ "Media": null })).is_err());
    }
}
