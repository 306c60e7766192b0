//! Event log transformation.
//!
//! Only `NextSong` events describe a play. Each play yields a time row, a user
//! row and a songplay fact; the fact is linked to the catalog when a song with
//! the same title, artist name and exact duration has been loaded.

use super::records::{parse_records, Record};
use super::EtlError;
use crate::warehouse::{SongplayRow, TimeRow, UserLevel, UserRow, WarehouseSink};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

pub const NEXT_SONG_PAGE: &str = "NextSong";

/// A validated `NextSong` event.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayEvent {
    pub start_time: DateTime<Utc>,
    pub user: UserRow,
    pub song: String,
    pub artist: String,
    pub length: f64,
    pub session_id: i64,
    pub location: Option<String>,
    pub user_agent: Option<String>,
}

impl PlayEvent {
    fn songplay(&self, song_id: Option<String>, artist_id: Option<String>) -> SongplayRow {
        SongplayRow {
            start_time: self.start_time,
            user_id: self.user.user_id.clone(),
            level: self.user.level,
            song_id,
            artist_id,
            session_id: self.session_id,
            location: self.location.clone(),
            user_agent: self.user_agent.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventBatchSummary {
    pub records: usize,
    pub plays: usize,
    pub distinct_timestamps: usize,
    pub matched_plays: usize,
}

pub fn is_play(record: &Record) -> bool {
    record
        .get("page")
        .and_then(|v| v.as_str())
        .map(|page| page == NEXT_SONG_PAGE)
        .unwrap_or(false)
}

/// Converts epoch milliseconds into a UTC timestamp.
pub fn timestamp_from_millis(line: usize, ts: i64) -> Result<DateTime<Utc>, EtlError> {
    DateTime::from_timestamp_millis(ts).ok_or(EtlError::InvalidTimestamp { line, ts })
}

/// Validates a `NextSong` record and extracts everything needed downstream.
pub fn parse_play_event(record: &Record) -> Result<PlayEvent, EtlError> {
    let ts = record.i64_field("ts")?;
    let level = record.str_field("level")?;

    let user = UserRow {
        user_id: record.id_field("userId")?,
        first_name: record.str_field("firstName")?.to_string(),
        last_name: record.str_field("lastName")?.to_string(),
        gender: record.str_field("gender")?.to_string(),
        level: UserLevel::from_db_str(level).ok_or(EtlError::InvalidField {
            line: record.line(),
            field: "level",
            expected: "'free' or 'paid'",
        })?,
    };

    Ok(PlayEvent {
        start_time: timestamp_from_millis(record.line(), ts)?,
        user,
        song: record.str_field("song")?.to_string(),
        artist: record.str_field("artist")?.to_string(),
        length: record.f64_field("length")?,
        session_id: record.i64_field("sessionId")?,
        location: record.opt_str_field("location")?.map(str::to_string),
        user_agent: record.opt_str_field("userAgent")?.map(str::to_string),
    })
}

/// Loads the plays of one log file, in file order.
pub fn load_log_records(
    sink: &dyn WarehouseSink,
    records: &[Record],
) -> Result<EventBatchSummary, EtlError> {
    let plays = records
        .iter()
        .filter(|r| is_play(r))
        .map(parse_play_event)
        .collect::<Result<Vec<_>, _>>()?;

    let mut seen = HashSet::new();
    for play in &plays {
        if seen.insert(play.start_time) {
            sink.upsert_time(&TimeRow::from_timestamp(play.start_time))?;
        }
    }

    for play in &plays {
        sink.upsert_user(&play.user)?;
    }

    let mut matched_plays = 0;
    for play in &plays {
        let songplay = match sink.find_song_match(&play.song, &play.artist, play.length)? {
            Some(found) => {
                matched_plays += 1;
                play.songplay(Some(found.song_id), Some(found.artist_id))
            }
            None => {
                debug!(
                    "No catalog match for '{}' by '{}' ({}s)",
                    play.song, play.artist, play.length
                );
                play.songplay(None, None)
            }
        };
        sink.insert_songplay(&songplay)?;
    }

    Ok(EventBatchSummary {
        records: records.len(),
        plays: plays.len(),
        distinct_timestamps: seen.len(),
        matched_plays,
    })
}

/// Parses and loads one log file.
pub fn process_log_file(sink: &dyn WarehouseSink, path: &Path) -> Result<(), EtlError> {
    let records = parse_records(path)?;
    let summary = load_log_records(sink, &records)?;
    debug!(
        "Loaded {} plays ({} matched) out of {} events from {}",
        summary.plays,
        summary.matched_plays,
        summary.records,
        path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::etl::records::parse_records_str;
    use crate::warehouse::{ArtistRow, SongRow, SqliteWarehouse};
    use serde_json::json;
    use std::path::PathBuf;

    fn event(page: &str, ts: i64, user_id: &str, level: &str, song: &str, length: f64) -> String {
        json!({
            "artist": "TestArtist",
            "auth": "Logged In",
            "firstName": "Walter",
            "gender": "M",
            "itemInSession": 0,
            "lastName": "Frye",
            "length": length,
            "level": level,
            "location": "San Francisco-Oakland-Hayward, CA",
            "method": "PUT",
            "page": page,
            "registration": 1540919166796.0,
            "sessionId": 38,
            "song": song,
            "status": 200,
            "ts": ts,
            "userAgent": "Mozilla/5.0",
            "userId": user_id,
        })
        .to_string()
    }

    fn records(lines: &[String]) -> Vec<Record> {
        parse_records_str(&PathBuf::from("events.json"), &lines.join("\n")).unwrap()
    }

    fn seeded_store() -> SqliteWarehouse {
        let store = SqliteWarehouse::in_memory().unwrap();
        store
            .upsert_song(&SongRow {
                song_id: "S1".to_string(),
                title: "Test".to_string(),
                artist_id: "A1".to_string(),
                year: 2000,
                duration: 200.5,
            })
            .unwrap();
        store
            .upsert_artist(&ArtistRow {
                artist_id: "A1".to_string(),
                name: "TestArtist".to_string(),
                location: None,
                latitude: None,
                longitude: None,
            })
            .unwrap();
        store
    }

    #[test]
    fn test_only_next_song_events_are_loaded() {
        let store = seeded_store();
        let lines = vec![
            event("Home", 1541105830796, "39", "free", "Test", 200.5),
            event("NextSong", 1541106106796, "39", "free", "Test", 200.5),
            event("Logout", 1541106132796, "39", "free", "Test", 200.5),
            event("NextSong", 1541106352796, "8", "free", "Other", 180.0),
        ];

        let summary = load_log_records(&store, &records(&lines)).unwrap();

        assert_eq!(summary.records, 4);
        assert_eq!(summary.plays, 2);
        let counts = store.table_counts().unwrap();
        assert_eq!(counts.time, 2);
        assert_eq!(counts.users, 2);
        assert_eq!(counts.songplays, 2);
    }

    #[test]
    fn test_songplay_join_exact_duration() {
        let store = seeded_store();
        let lines = vec![
            event("NextSong", 1541106106796, "39", "free", "Test", 200.5),
            event("NextSong", 1541106352796, "39", "free", "Test", 200.6),
        ];

        let summary = load_log_records(&store, &records(&lines)).unwrap();

        assert_eq!(summary.matched_plays, 1);
        let songplays = store.list_songplays().unwrap();
        assert_eq!(songplays[0].song_id.as_deref(), Some("S1"));
        assert_eq!(songplays[0].artist_id.as_deref(), Some("A1"));
        assert_eq!(songplays[1].song_id, None);
        assert_eq!(songplays[1].artist_id, None);
        assert_eq!(songplays[1].session_id, 38);
        assert_eq!(songplays[1].user_agent.as_deref(), Some("Mozilla/5.0"));
    }

    #[test]
    fn test_duplicate_timestamps_collapse() {
        let store = seeded_store();
        let lines = vec![
            event("NextSong", 1543622584796, "39", "free", "Test", 200.5),
            event("NextSong", 1543622584796, "8", "free", "Test", 200.5),
        ];

        let summary = load_log_records(&store, &records(&lines)).unwrap();

        assert_eq!(summary.distinct_timestamps, 1);
        assert_eq!(store.table_counts().unwrap().time, 1);
        assert_eq!(store.table_counts().unwrap().songplays, 2);
    }

    #[test]
    fn test_later_user_record_wins() {
        let store = seeded_store();
        let lines = vec![
            event("NextSong", 1541106106796, "39", "free", "Test", 200.5),
            event("NextSong", 1541106352796, "39", "paid", "Test", 200.5),
        ];

        load_log_records(&store, &records(&lines)).unwrap();

        let user = store.get_user("39").unwrap().unwrap();
        assert_eq!(user.level, UserLevel::Paid);
        let songplays = store.list_songplays().unwrap();
        assert_eq!(songplays[0].level, UserLevel::Free);
        assert_eq!(songplays[1].level, UserLevel::Paid);
    }

    #[test]
    fn test_reference_timestamp_time_row() {
        let store = seeded_store();
        let lines = vec![event("NextSong", 1543622584796, "39", "free", "Test", 200.5)];

        load_log_records(&store, &records(&lines)).unwrap();

        let start = DateTime::from_timestamp_millis(1543622584796).unwrap();
        let time = store.get_time(&start).unwrap().unwrap();
        assert_eq!(
            (time.hour, time.day, time.week, time.month, time.year, time.weekday),
            (0, 1, 48, 12, 2018, 6)
        );
    }

    #[test]
    fn test_missing_required_field_aborts_before_writes() {
        let store = seeded_store();
        let mut broken: serde_json::Value =
            serde_json::from_str(&event("NextSong", 1541106352796, "8", "free", "Test", 200.5))
                .unwrap();
        broken.as_object_mut().unwrap().remove("length");
        let lines = vec![
            event("NextSong", 1541106106796, "39", "free", "Test", 200.5),
            broken.to_string(),
        ];

        let err = load_log_records(&store, &records(&lines)).unwrap_err();

        assert!(matches!(
            err,
            EtlError::MissingField {
                line: 2,
                field: "length"
            }
        ));
        assert_eq!(store.table_counts().unwrap().songplays, 0);
        assert_eq!(store.table_counts().unwrap().users, 0);
    }

    #[test]
    fn test_non_play_records_are_not_validated() {
        let store = seeded_store();
        let lines = vec![r#"{"page": "Home", "userId": "", "ts": 1541105830796}"#.to_string()];

        let summary = load_log_records(&store, &records(&lines)).unwrap();
        assert_eq!(summary.plays, 0);
    }

    #[test]
    fn test_unknown_level_is_invalid() {
        let lines = vec![event("NextSong", 1541106106796, "39", "gold", "Test", 200.5)];
        let err = parse_play_event(&records(&lines)[0]).unwrap_err();
        assert!(matches!(err, EtlError::InvalidField { field: "level", .. }));
    }

    #[test]
    fn test_numeric_user_id_is_stored_as_text() {
        let line = event("NextSong", 1541106106796, "39", "free", "Test", 200.5)
            .replace("\"userId\":\"39\"", "\"userId\":39");
        let play = parse_play_event(&records(&[line])[0]).unwrap();
        assert_eq!(play.user.user_id, "39");
    }
}
