//! Temporary warehouse and data directories for end-to-end tests

use super::constants::*;
use serde_json::{json, Value};
use sparkify_etl::SqliteWarehouse;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub struct TestWarehouse {
    pub store: SqliteWarehouse,
    pub db_path: PathBuf,
    pub song_dir: PathBuf,
    pub log_dir: PathBuf,
    _temp_dir: TempDir, // Keep temp dir alive
}

impl TestWarehouse {
    /// Empty warehouse with fresh tables and empty data directories.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("sparkify.db");
        let song_dir = temp_dir.path().join("song_data");
        let log_dir = temp_dir.path().join("log_data");
        fs::create_dir_all(&song_dir).unwrap();
        fs::create_dir_all(&log_dir).unwrap();

        let store = SqliteWarehouse::create_tables(&db_path).unwrap();
        TestWarehouse {
            store,
            db_path,
            song_dir,
            log_dir,
            _temp_dir: temp_dir,
        }
    }

    /// Warehouse whose song directory holds the two catalog songs.
    pub fn with_catalog_files() -> Self {
        let warehouse = Self::new();
        warehouse.write_song_file(
            "A/A/A/TRAAAAW128F429D538.json",
            &song_record(SONG_1_ID, SONG_1_TITLE, ARTIST_1_ID, ARTIST_1_NAME, SONG_1_DURATION),
        );
        warehouse.write_song_file(
            "A/B/C/TRABCAJ12903CDFCC2.json",
            &song_record(SONG_2_ID, SONG_2_TITLE, ARTIST_2_ID, ARTIST_2_NAME, SONG_2_DURATION),
        );
        warehouse
    }

    pub fn write_song_file(&self, relative: &str, record: &Value) -> PathBuf {
        write_file(&self.song_dir, relative, &format!("{}\n", record))
    }

    pub fn write_log_file(&self, relative: &str, records: &[Value]) -> PathBuf {
        let content = records
            .iter()
            .map(|r| r.to_string())
            .collect::<Vec<_>>()
            .join("\n");
        write_file(&self.log_dir, relative, &content)
    }

    pub fn write_raw_log_file(&self, relative: &str, content: &str) -> PathBuf {
        write_file(&self.log_dir, relative, content)
    }
}

fn write_file(root: &Path, relative: &str, content: &str) -> PathBuf {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

pub fn song_record(
    song_id: &str,
    title: &str,
    artist_id: &str,
    artist_name: &str,
    duration: f64,
) -> Value {
    json!({
        "num_songs": 1,
        "artist_id": artist_id,
        "artist_latitude": null,
        "artist_longitude": null,
        "artist_location": "",
        "artist_name": artist_name,
        "song_id": song_id,
        "title": title,
        "duration": duration,
        "year": 0,
    })
}

pub fn log_record(
    page: &str,
    ts: i64,
    user_id: &str,
    level: &str,
    song: &str,
    artist: &str,
    length: f64,
) -> Value {
    json!({
        "artist": artist,
        "auth": "Logged In",
        "firstName": "Jayden",
        "gender": "M",
        "itemInSession": 3,
        "lastName": "Graves",
        "length": length,
        "level": level,
        "location": "Marinette, WI-MI",
        "method": "PUT",
        "page": page,
        "registration": 1540664184796.0,
        "sessionId": 405,
        "song": song,
        "status": 200,
        "ts": ts,
        "userAgent": "\"Mozilla/5.0 (Windows NT 6.1; WOW64) AppleWebKit/537.36\"",
        "userId": user_id,
    })
}

/// A non-play event as emitted for logged-out visitors.
pub fn logged_out_record(page: &str, ts: i64) -> Value {
    json!({
        "artist": null,
        "auth": "Logged Out",
        "firstName": null,
        "gender": null,
        "itemInSession": 0,
        "lastName": null,
        "length": null,
        "level": "free",
        "location": null,
        "method": "GET",
        "page": page,
        "registration": null,
        "sessionId": 52,
        "song": null,
        "status": 200,
        "ts": ts,
        "userAgent": null,
        "userId": "",
    })
}
