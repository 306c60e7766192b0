//! Extract, transform and load of the song catalog and the event logs.

mod catalog;
mod discovery;
mod driver;
mod error;
mod events;
mod records;

pub use catalog::{load_song_records, process_song_file, transform_song_record};
pub use discovery::discover_files;
pub use driver::{process_data, BatchReport, ProgressReporter, StdoutProgress};
pub use error::EtlError;
pub use events::{
    is_play, load_log_records, parse_play_event, process_log_file, timestamp_from_millis,
    EventBatchSummary, PlayEvent, NEXT_SONG_PAGE,
};
pub use records::{parse_records, parse_records_bytes, parse_records_str, Record};
