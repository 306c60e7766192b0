//! Row types for the star-schema warehouse.
//!
//! Each struct maps one-to-one onto a table; the store binds them with named
//! parameters so column order never leaks into the transformers.

use chrono::{DateTime, Datelike, SecondsFormat, Timelike, Utc};

/// Subscription level of a user at the time of an event.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum UserLevel {
    Free,
    Paid,
}

impl UserLevel {
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "free" => Some(UserLevel::Free),
            "paid" => Some(UserLevel::Paid),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            UserLevel::Free => "free",
            UserLevel::Paid => "paid",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SongRow {
    pub song_id: String,
    pub title: String,
    pub artist_id: String,
    pub year: i64,
    pub duration: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ArtistRow {
    pub artist_id: String,
    pub name: String,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Calendar breakdown of a play timestamp.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimeRow {
    pub start_time: DateTime<Utc>,
    pub hour: u32,
    pub day: u32,
    /// ISO-8601 week number.
    pub week: u32,
    pub month: u32,
    /// Calendar year, which can differ from the ISO week-based year around new year.
    pub year: i32,
    /// ISO-8601 weekday, Monday = 1 through Sunday = 7. One higher than the
    /// zero-based pandas `dt.weekday` numbering (Monday = 0).
    pub weekday: u32,
}

impl TimeRow {
    pub fn from_timestamp(start_time: DateTime<Utc>) -> Self {
        TimeRow {
            start_time,
            hour: start_time.hour(),
            day: start_time.day(),
            week: start_time.iso_week().week(),
            month: start_time.month(),
            year: start_time.year(),
            weekday: start_time.weekday().number_from_monday(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserRow {
    pub user_id: String,
    pub first_name: String,
    pub last_name: String,
    pub gender: String,
    pub level: UserLevel,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SongplayRow {
    pub start_time: DateTime<Utc>,
    pub user_id: String,
    pub level: UserLevel,
    pub song_id: Option<String>,
    pub artist_id: Option<String>,
    pub session_id: i64,
    pub location: Option<String>,
    pub user_agent: Option<String>,
}

/// Catalog keys resolved for a play event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SongMatch {
    pub song_id: String,
    pub artist_id: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TableCounts {
    pub songs: usize,
    pub artists: usize,
    pub time: usize,
    pub users: usize,
    pub songplays: usize,
}

/// Canonical text form of a timestamp as stored in `time.start_time` and
/// `songplays.start_time`.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}
