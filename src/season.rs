use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Broadcast quarter used by AniList's own `MediaSeason` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Fall,
}

impl Season {
    pub const ALL: [Season; 4] = [Self::Winter, Self::Spring, Self::Summer, Self::Fall];

    /// Months 1-3 are WINTER, 4-6 SPRING, 7-9 SUMMER, 10-12 FALL.
    pub fn from_month(month: u32) -> Option<Self> {
        match month {
            1..=3 => Some(Self::Winter),
            4..=6 => Some(Self::Spring),
            7..=9 => Some(Self::Summer),
            10..=12 => Some(Self::Fall),
            _ => None,
        }
    }

    pub fn next(self) -> Self {
        match self {
            Self::Winter => Self::Spring,
            Self::Spring => Self::Summer,
            Self::Summer => Self::Fall,
            Self::Fall => Self::Winter,
        }
    }

    pub fn as_graphql(self) -> &'static str {
        match self {
            Self::Winter => "WINTER",
            Self::Spring => "SPRING",
            Self::Summer => "SUMMER",
            Self::Fall => "FALL",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL
            .into_iter()
            .find(|s| s.as_graphql().eq_ignore_ascii_case(raw))
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Winter => write!(f, "Winter"),
            Self::Spring => write!(f, "Spring"),
            Self::Summer => write!(f, "Summer"),
            Self::Fall => write!(f, "Fall"),
        }
    }
}

/// Current season plus the one the trending page previews as "next".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonPair {
    pub season: Season,
    pub season_year: i32,
    pub next_season: Season,
    pub next_year: i32,
}

impl SeasonPair {
    pub fn for_date(date: NaiveDate) -> Self {
        // chrono months are always 1..=12
        let season = Season::from_month(date.month()).unwrap_or(Season::Winter);
        let season_year = date.year();
        // The year only advances when previewing from WINTER.
        let next_year = if season == Season::Winter {
            season_year + 1
        } else {
            season_year
        };
        Self {
            season,
            season_year,
            next_season: season.next(),
            next_year,
        }
    }

    pub fn current() -> Self {
        Self::for_date(Local::now().date_naive())
    }
}
