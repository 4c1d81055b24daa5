use std::fmt;

macro_rules! media_fragment {
    () => {
        r#"
fragment media on Media {
  id
  title { userPreferred }
  genres
  averageScore
  coverImage { large }
  bannerImage
  description(asHtml: false)
  status
  episodes
  format
}
"#
    };
}

macro_rules! page_info_fields {
    () => {
        "pageInfo { total currentPage lastPage hasNextPage perPage }"
    };
}

const TRENDING: &str = concat!(
    r#"
query Trending($season: MediaSeason, $seasonYear: Int, $nextSeason: MediaSeason, $nextYear: Int) {
  trending: Page(page: 1, perPage: 6) {
    media(sort: TRENDING_DESC, type: ANIME, isAdult: false) { ...media }
  }
  season: Page(page: 1, perPage: 6) {
    media(season: $season, seasonYear: $seasonYear, sort: POPULARITY_DESC, type: ANIME, isAdult: false) { ...media }
  }
  nextSeason: Page(page: 1, perPage: 6) {
    media(season: $nextSeason, seasonYear: $nextYear, sort: POPULARITY_DESC, type: ANIME, isAdult: false) { ...media }
  }
  popular: Page(page: 1, perPage: 6) {
    media(sort: POPULARITY_DESC, type: ANIME, isAdult: false) { ...media }
  }
  top: Page(page: 1, perPage: 10) {
    media(sort: SCORE_DESC, type: ANIME, isAdult: false) { ...media }
  }
}
"#,
    media_fragment!()
);

const POPULAR: &str = concat!(
    r#"
query GetPopularAnime($sort: [MediaSort], $page: Int, $perPage: Int, $year: Int, $isAdult: Boolean = false) {
  Page(page: $page, perPage: $perPage) {
    "#,
    page_info_fields!(),
    r#"
    media(sort: $sort, type: ANIME, seasonYear: $year, isAdult: $isAdult) { ...media }
  }
}
"#,
    media_fragment!()
);

const NEW_RELEASES: &str = concat!(
    r#"
query GetNewReleases($page: Int, $perPage: Int, $season: MediaSeason, $seasonYear: Int, $isAdult: Boolean = false) {
  Page(page: $page, perPage: $perPage) {
    "#,
    page_info_fields!(),
    r#"
    media(sort: [START_DATE_DESC], type: ANIME, season: $season, seasonYear: $seasonYear, status: RELEASING, isAdult: $isAdult) {
      ...media
      startDate { year month day }
    }
  }
}
"#,
    media_fragment!()
);

const AIRING_SCHEDULE: &str = concat!(
    r#"
query GetAiringAnime($page: Int, $perPage: Int) {
  Page(page: $page, perPage: $perPage) {
    media(type: ANIME, status: RELEASING, sort: [POPULARITY_DESC]) {
      ...media
      airingSchedule(notYetAired: false, perPage: 1) {
        nodes { airingAt episode }
      }
    }
  }
}
"#,
    media_fragment!()
);

const SEARCH: &str = concat!(
    r#"
query SearchAnime(
  $search: String
  $genre: [String]
  $year: Int
  $status: MediaStatus
  $format: MediaFormat
  $sort: [MediaSort]
  $page: Int
  $perPage: Int
  $scoreGreater: Int
  $episodeGreater: Int
  $episodeLesser: Int
  $isAdult: Boolean = false
) {
  Page(page: $page, perPage: $perPage) {
    "#,
    page_info_fields!(),
    r#"
    media(
      search: $search
      genre_in: $genre
      seasonYear: $year
      status: $status
      format: $format
      sort: $sort
      type: ANIME
      isAdult: $isAdult
      averageScore_greater: $scoreGreater
      episodes_greater: $episodeGreater
      episodes_lesser: $episodeLesser
    ) { ...media }
  }
}
"#,
    media_fragment!()
);

const MEDIA_DETAIL: &str = r#"
query GetMediaDetail($id: Int!) {
  Media(id: $id) {
    id
    title { userPreferred english native }
    description
    coverImage { large extraLarge }
    bannerImage
    averageScore
    meanScore
    popularity
    favourites
    episodes
    duration
    status
    format
    genres
    tags { id name description }
    studios { nodes { id name } }
    staff { nodes { id name { userPreferred } image { medium } } }
    characters { nodes { id name { userPreferred } image { medium } } }
    startDate { year month day }
    endDate { year month day }
    season
    seasonYear
    source
    trailer { id site thumbnail }
    externalLinks { id url site }
    relations {
      nodes { id title { userPreferred } coverImage { medium } format status }
    }
    recommendations {
      nodes {
        mediaRecommendation { id title { userPreferred } coverImage { medium } averageScore }
      }
    }
  }
}
"#;

/// The named GraphQL operations the catalog issues, one per page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Trending,
    Popular,
    NewReleases,
    AiringSchedule,
    Search,
    MediaDetail,
}

impl Operation {
    pub fn name(self) -> &'static str {
        match self {
            Self::Trending => "Trending",
            Self::Popular => "GetPopularAnime",
            Self::NewReleases => "GetNewReleases",
            Self::AiringSchedule => "GetAiringAnime",
            Self::Search => "SearchAnime",
            Self::MediaDetail => "GetMediaDetail",
        }
    }

    pub fn document(self) -> &'static str {
        match self {
            Self::Trending => TRENDING,
            Self::Popular => POPULAR,
            Self::NewReleases => NEW_RELEASES,
            Self::AiringSchedule => AIRING_SCHEDULE,
            Self::Search => SEARCH,
            Self::MediaDetail => MEDIA_DETAIL,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
