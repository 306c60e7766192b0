//! Sparkify ETL Library
//!
//! Loads the song catalog and the user event logs into a star-schema SQLite
//! warehouse. The binaries are thin wrappers around these modules.

pub mod config;
pub mod etl;
pub mod sqlite_persistence;
pub mod warehouse;

// Re-export commonly used types for convenience
pub use etl::{process_data, process_log_file, process_song_file, EtlError, StdoutProgress};
pub use warehouse::{SqliteWarehouse, WarehouseSink};
