//! SQLite-backed warehouse.
//!
//! One connection, guarded by a mutex, shared by every pipeline stage that
//! holds the handle. Per-file units of work are plain `BEGIN`/`COMMIT` blocks
//! on that connection.

use super::models::*;
use super::schema::WAREHOUSE_SCHEMA;
use super::WarehouseSink;
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{named_params, params, types::Type, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct SqliteWarehouse {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteWarehouse {
    /// Opens an existing warehouse for loading.
    ///
    /// Fails when the tables are missing or do not have the expected shape;
    /// run `create-tables` first.
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let path = db_path.as_ref();
        if !path.exists() {
            anyhow::bail!(
                "Warehouse database {:?} does not exist, create the tables first",
                path
            );
        }
        let conn = Connection::open(path).context("Failed to open warehouse database")?;
        Self::from_connection(conn)
            .with_context(|| format!("Warehouse database {:?} is not usable", path))
    }

    /// Drops and recreates every warehouse table, then opens the store.
    pub fn create_tables<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let path = db_path.as_ref();
        let conn = Connection::open(path).context("Failed to open warehouse database")?;
        info!("Recreating warehouse tables in {:?}", path);
        WAREHOUSE_SCHEMA.recreate(&conn)?;
        Self::from_connection(conn)
    }

    /// Fresh in-memory warehouse with the schema already created.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        WAREHOUSE_SCHEMA.create(&conn)?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute("PRAGMA foreign_keys = ON;", [])?;
        WAREHOUSE_SCHEMA
            .validate(&conn)
            .context("Warehouse schema validation failed")?;
        Ok(SqliteWarehouse {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("Warehouse connection mutex poisoned"))
    }

    fn parse_timestamp(idx: usize, s: &str) -> rusqlite::Result<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    }

    fn parse_level(idx: usize, s: &str) -> rusqlite::Result<UserLevel> {
        UserLevel::from_db_str(s).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                idx,
                Type::Text,
                format!("unknown user level '{}'", s).into(),
            )
        })
    }

    // =========================================================================
    // Read Operations
    // =========================================================================

    pub fn get_song(&self, song_id: &str) -> Result<Option<SongRow>> {
        let conn = self.conn()?;
        let song = conn
            .query_row(
                "SELECT song_id, title, artist_id, year, duration FROM songs WHERE song_id = ?1",
                params![song_id],
                |row| {
                    Ok(SongRow {
                        song_id: row.get(0)?,
                        title: row.get(1)?,
                        artist_id: row.get(2)?,
                        year: row.get(3)?,
                        duration: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(song)
    }

    pub fn get_artist(&self, artist_id: &str) -> Result<Option<ArtistRow>> {
        let conn = self.conn()?;
        let artist = conn
            .query_row(
                "SELECT artist_id, name, location, latitude, longitude FROM artists WHERE artist_id = ?1",
                params![artist_id],
                |row| {
                    Ok(ArtistRow {
                        artist_id: row.get(0)?,
                        name: row.get(1)?,
                        location: row.get(2)?,
                        latitude: row.get(3)?,
                        longitude: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(artist)
    }

    pub fn get_user(&self, user_id: &str) -> Result<Option<UserRow>> {
        let conn = self.conn()?;
        let user = conn
            .query_row(
                "SELECT user_id, first_name, last_name, gender, level FROM users WHERE user_id = ?1",
                params![user_id],
                |row| {
                    let level: String = row.get(4)?;
                    Ok(UserRow {
                        user_id: row.get(0)?,
                        first_name: row.get(1)?,
                        last_name: row.get(2)?,
                        gender: row.get(3)?,
                        level: Self::parse_level(4, &level)?,
                    })
                },
            )
            .optional()?;
        Ok(user)
    }

    pub fn get_time(&self, start_time: &DateTime<Utc>) -> Result<Option<TimeRow>> {
        let conn = self.conn()?;
        let time = conn
            .query_row(
                "SELECT start_time, hour, day, week, month, year, weekday FROM time WHERE start_time = ?1",
                params![format_timestamp(start_time)],
                |row| {
                    let start_time: String = row.get(0)?;
                    Ok(TimeRow {
                        start_time: Self::parse_timestamp(0, &start_time)?,
                        hour: row.get(1)?,
                        day: row.get(2)?,
                        week: row.get(3)?,
                        month: row.get(4)?,
                        year: row.get(5)?,
                        weekday: row.get(6)?,
                    })
                },
            )
            .optional()?;
        Ok(time)
    }

    /// All songplays in insertion order.
    pub fn list_songplays(&self) -> Result<Vec<SongplayRow>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT start_time, user_id, level, song_id, artist_id, session_id, location, user_agent
             FROM songplays ORDER BY songplay_id",
        )?;
        let songplays = stmt
            .query_map([], |row| {
                let start_time: String = row.get(0)?;
                let level: String = row.get(2)?;
                Ok(SongplayRow {
                    start_time: Self::parse_timestamp(0, &start_time)?,
                    user_id: row.get(1)?,
                    level: Self::parse_level(2, &level)?,
                    song_id: row.get(3)?,
                    artist_id: row.get(4)?,
                    session_id: row.get(5)?,
                    location: row.get(6)?,
                    user_agent: row.get(7)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(songplays)
    }

    fn count_rows(conn: &Connection, table: &str) -> Result<usize> {
        let count: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| {
            r.get(0)
        })?;
        Ok(count as usize)
    }
}

impl WarehouseSink for SqliteWarehouse {
    fn upsert_song(&self, song: &SongRow) -> Result<()> {
        let conn = self.conn()?;
        conn.prepare_cached(
            "INSERT INTO songs (song_id, title, artist_id, year, duration)
             VALUES (:song_id, :title, :artist_id, :year, :duration)
             ON CONFLICT(song_id) DO UPDATE SET
                title = excluded.title,
                artist_id = excluded.artist_id,
                year = excluded.year,
                duration = excluded.duration",
        )?
        .execute(named_params! {
            ":song_id": song.song_id,
            ":title": song.title,
            ":artist_id": song.artist_id,
            ":year": song.year,
            ":duration": song.duration,
        })?;
        Ok(())
    }

    fn upsert_artist(&self, artist: &ArtistRow) -> Result<()> {
        let conn = self.conn()?;
        conn.prepare_cached(
            "INSERT INTO artists (artist_id, name, location, latitude, longitude)
             VALUES (:artist_id, :name, :location, :latitude, :longitude)
             ON CONFLICT(artist_id) DO UPDATE SET
                name = excluded.name,
                location = excluded.location,
                latitude = excluded.latitude,
                longitude = excluded.longitude",
        )?
        .execute(named_params! {
            ":artist_id": artist.artist_id,
            ":name": artist.name,
            ":location": artist.location,
            ":latitude": artist.latitude,
            ":longitude": artist.longitude,
        })?;
        Ok(())
    }

    fn upsert_time(&self, time: &TimeRow) -> Result<()> {
        let conn = self.conn()?;
        conn.prepare_cached(
            "INSERT INTO time (start_time, hour, day, week, month, year, weekday)
             VALUES (:start_time, :hour, :day, :week, :month, :year, :weekday)
             ON CONFLICT(start_time) DO NOTHING",
        )?
        .execute(named_params! {
            ":start_time": format_timestamp(&time.start_time),
            ":hour": time.hour,
            ":day": time.day,
            ":week": time.week,
            ":month": time.month,
            ":year": time.year,
            ":weekday": time.weekday,
        })?;
        Ok(())
    }

    fn upsert_user(&self, user: &UserRow) -> Result<()> {
        let conn = self.conn()?;
        conn.prepare_cached(
            "INSERT INTO users (user_id, first_name, last_name, gender, level)
             VALUES (:user_id, :first_name, :last_name, :gender, :level)
             ON CONFLICT(user_id) DO UPDATE SET
                first_name = excluded.first_name,
                last_name = excluded.last_name,
                gender = excluded.gender,
                level = excluded.level",
        )?
        .execute(named_params! {
            ":user_id": user.user_id,
            ":first_name": user.first_name,
            ":last_name": user.last_name,
            ":gender": user.gender,
            ":level": user.level.to_db_str(),
        })?;
        Ok(())
    }

    fn insert_songplay(&self, songplay: &SongplayRow) -> Result<i64> {
        let conn = self.conn()?;
        conn.prepare_cached(
            "INSERT INTO songplays
                (start_time, user_id, level, song_id, artist_id, session_id, location, user_agent)
             VALUES
                (:start_time, :user_id, :level, :song_id, :artist_id, :session_id, :location, :user_agent)",
        )?
        .execute(named_params! {
            ":start_time": format_timestamp(&songplay.start_time),
            ":user_id": songplay.user_id,
            ":level": songplay.level.to_db_str(),
            ":song_id": songplay.song_id,
            ":artist_id": songplay.artist_id,
            ":session_id": songplay.session_id,
            ":location": songplay.location,
            ":user_agent": songplay.user_agent,
        })?;
        Ok(conn.last_insert_rowid())
    }

    fn find_song_match(
        &self,
        title: &str,
        artist_name: &str,
        duration: f64,
    ) -> Result<Option<SongMatch>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached(
            "SELECT s.song_id, s.artist_id
             FROM songs s
             JOIN artists a ON a.artist_id = s.artist_id
             WHERE s.title = :title AND a.name = :artist_name AND s.duration = :duration
             ORDER BY s.song_id, s.artist_id
             LIMIT 2",
        )?;
        let candidates = stmt
            .query_map(
                named_params! {
                    ":title": title,
                    ":artist_name": artist_name,
                    ":duration": duration,
                },
                |row| {
                    Ok(SongMatch {
                        song_id: row.get(0)?,
                        artist_id: row.get(1)?,
                    })
                },
            )?
            .collect::<Result<Vec<_>, _>>()?;

        if candidates.len() > 1 {
            warn!(
                "Ambiguous catalog match for '{}' by '{}' ({}s), picking song {}",
                title, artist_name, duration, candidates[0].song_id
            );
        }
        Ok(candidates.into_iter().next())
    }

    fn begin_unit(&self) -> Result<()> {
        self.conn()?.execute_batch("BEGIN")?;
        Ok(())
    }

    fn commit_unit(&self) -> Result<()> {
        self.conn()?.execute_batch("COMMIT")?;
        Ok(())
    }

    fn rollback_unit(&self) -> Result<()> {
        let conn = self.conn()?;
        if conn.is_autocommit() {
            return Ok(());
        }
        debug!("Rolling back open unit of work");
        conn.execute_batch("ROLLBACK")?;
        Ok(())
    }

    fn table_counts(&self) -> Result<TableCounts> {
        let conn = self.conn()?;
        Ok(TableCounts {
            songs: Self::count_rows(&conn, "songs")?,
            artists: Self::count_rows(&conn, "artists")?,
            time: Self::count_rows(&conn, "time")?,
            users: Self::count_rows(&conn, "users")?,
            songplays: Self::count_rows(&conn, "songplays")?,
        })
    }
}
