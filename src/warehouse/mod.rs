mod models;
mod schema;
mod store;

pub use models::*;
pub use schema::WAREHOUSE_SCHEMA;
pub use store::SqliteWarehouse;

use anyhow::Result;

/// Write side of the warehouse, consumed by the transformers and the batch driver.
///
/// Dimension writes are upserts keyed by the natural primary key, so replaying
/// a file never fails on duplicates. Songplay writes are plain inserts.
pub trait WarehouseSink: Send + Sync {
    fn upsert_song(&self, song: &SongRow) -> Result<()>;
    fn upsert_artist(&self, artist: &ArtistRow) -> Result<()>;
    /// No-op when the timestamp is already present.
    fn upsert_time(&self, time: &TimeRow) -> Result<()>;
    /// Last write wins for every attribute.
    fn upsert_user(&self, user: &UserRow) -> Result<()>;
    /// Returns the assigned songplay_id.
    fn insert_songplay(&self, songplay: &SongplayRow) -> Result<i64>;

    /// Looks up the catalog entry for a play by exact title, artist name and duration.
    /// With several candidates the lowest song_id (then artist_id) wins.
    fn find_song_match(
        &self,
        title: &str,
        artist_name: &str,
        duration: f64,
    ) -> Result<Option<SongMatch>>;

    // Unit of work, one per input file
    fn begin_unit(&self) -> Result<()>;
    fn commit_unit(&self) -> Result<()>;
    /// Does nothing when no unit is open.
    fn rollback_unit(&self) -> Result<()>;

    fn table_counts(&self) -> Result<TableCounts>;
}
