//! Shared test data identifiers

pub const SONG_1_ID: &str = "SOUPIRU12A6D4FA1E1";
pub const SONG_1_TITLE: &str = "Der Kleine Dompfaff";
pub const SONG_1_DURATION: f64 = 152.92036;

pub const SONG_2_ID: &str = "SOCIWDW12A8C13D406";
pub const SONG_2_TITLE: &str = "Soul Deep";
pub const SONG_2_DURATION: f64 = 148.03546;

pub const ARTIST_1_ID: &str = "ARJIE2Y1187B994AB7";
pub const ARTIST_1_NAME: &str = "Line Renaud";

pub const ARTIST_2_ID: &str = "ARMJAGH1187FB546F3";
pub const ARTIST_2_NAME: &str = "The Box Tops";

pub const USER_1_ID: &str = "26";
pub const USER_2_ID: &str = "80";

/// 2018-12-01T00:03:04.796Z, a Saturday in ISO week 48.
pub const REFERENCE_TS: i64 = 1543622584796;
