//! Catalog (song file) transformation.

use super::records::{parse_records, Record};
use super::EtlError;
use crate::warehouse::{ArtistRow, SongRow, WarehouseSink};
use std::path::Path;
use tracing::debug;

/// Projects one catalog record onto its song and artist rows.
pub fn transform_song_record(record: &Record) -> Result<(SongRow, ArtistRow), EtlError> {
    let artist_id = record.str_field("artist_id")?.to_string();

    let song = SongRow {
        song_id: record.str_field("song_id")?.to_string(),
        title: record.str_field("title")?.to_string(),
        artist_id: artist_id.clone(),
        year: record.i64_field("year")?,
        duration: record.f64_field("duration")?,
    };

    let artist = ArtistRow {
        artist_id,
        name: record.str_field("artist_name")?.to_string(),
        location: record.opt_str_field("artist_location")?.map(str::to_string),
        latitude: record.opt_f64_field("artist_latitude")?,
        longitude: record.opt_f64_field("artist_longitude")?,
    };

    Ok((song, artist))
}

/// Loads every catalog record of a file. Returns the number of songs written.
pub fn load_song_records(sink: &dyn WarehouseSink, records: &[Record]) -> Result<usize, EtlError> {
    // Validate the whole file before the first write
    let rows = records
        .iter()
        .map(transform_song_record)
        .collect::<Result<Vec<_>, _>>()?;

    for (song, artist) in &rows {
        sink.upsert_song(song)?;
        sink.upsert_artist(artist)?;
    }
    Ok(rows.len())
}

/// Parses and loads one song file.
pub fn process_song_file(sink: &dyn WarehouseSink, path: &Path) -> Result<(), EtlError> {
    let records = parse_records(path)?;
    let songs = load_song_records(sink, &records)?;
    debug!("Loaded {} songs from {}", songs, path.display());
    Ok(())
}
