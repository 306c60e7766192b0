//! Common test infrastructure
//!
//! Tests should only import from this module, not from internal submodules.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::{RecordingProgress, TestWarehouse};
//!
//! #[test]
//! fn test_load_catalog() {
//!     let warehouse = TestWarehouse::with_catalog_files();
//!     let mut progress = RecordingProgress::default();
//!     // ... run process_data against warehouse.song_dir
//! }
//! ```
#![allow(dead_code)]

mod constants;
mod fixtures;
mod progress;

pub use constants::*;
pub use fixtures::*;
pub use progress::RecordingProgress;
