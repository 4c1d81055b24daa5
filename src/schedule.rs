//! Weekly airing schedule grouped by local weekday.

use chrono::{Datelike, Local, TimeZone, Weekday};
use serde::Serialize;

use crate::anilist::ScheduledMedia;

/// Sunday-first, matching the bucket index.
pub const WEEKDAY_LABELS: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

const MONDAY_FIRST: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

pub trait Airing {
    /// Unix seconds of the next (or latest) airing slot.
    fn airing_at(&self) -> Option<i64>;
}

impl Airing for ScheduledMedia {
    fn airing_at(&self) -> Option<i64> {
        self.airing_at
    }
}

pub fn weekday_label(day: Weekday) -> &'static str {
    WEEKDAY_LABELS[day.num_days_from_sunday() as usize]
}

pub fn weekday_short(day: Weekday) -> &'static str {
    &weekday_label(day)[..3]
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeekdayBuckets<T> {
    buckets: [Vec<T>; 7],
    dropped: usize,
}

impl<T> WeekdayBuckets<T> {
    pub fn day(&self, day: Weekday) -> &[T] {
        &self.buckets[day.num_days_from_sunday() as usize]
    }

    /// Items without a usable timestamp.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn total(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    pub fn monday_first(&self) -> impl Iterator<Item = (Weekday, &[T])> + '_ {
        MONDAY_FIRST.into_iter().map(move |d| (d, self.day(d)))
    }

    pub fn into_days(self) -> Vec<ScheduleDay<T>> {
        let mut buckets = self.buckets.map(Some);
        MONDAY_FIRST
            .into_iter()
            .map(|d| {
                let idx = d.num_days_from_sunday() as usize;
                ScheduleDay {
                    day: d.num_days_from_sunday(),
                    label: weekday_label(d),
                    short: weekday_short(d),
                    items: buckets[idx].take().unwrap_or_default(),
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleDay<T> {
    /// 0 = Sunday .. 6 = Saturday.
    pub day: u32,
    pub label: &'static str,
    pub short: &'static str,
    pub items: Vec<T>,
}

/// Buckets items by the calendar weekday of their airing time in `tz`,
/// keeping input order inside each day.
pub fn group_by_weekday_in<T, Tz>(items: Vec<T>, tz: &Tz) -> WeekdayBuckets<T>
where
    T: Airing,
    Tz: TimeZone,
{
    let mut buckets: [Vec<T>; 7] = Default::default();
    let mut dropped = 0;
    for item in items {
        let local = item
            .airing_at()
            .and_then(|ts| tz.timestamp_opt(ts, 0).earliest());
        match local {
            Some(at) => buckets[at.weekday().num_days_from_sunday() as usize].push(item),
            None => dropped += 1,
        }
    }
    WeekdayBuckets { buckets, dropped }
}

pub fn group_by_weekday<T: Airing>(items: Vec<T>) -> WeekdayBuckets<T> {
    group_by_weekday_in(items, &Local)
}

pub fn today() -> Weekday {
    Local::now().weekday()
}
