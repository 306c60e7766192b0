mod file_config;

pub use file_config::FileConfig;

use anyhow::{bail, Result};
use std::path::{Path, PathBuf};

pub const DEFAULT_DB_PATH: &str = "sparkify.db";
pub const DEFAULT_SONG_DATA_DIR: &str = "data/song_data";
pub const DEFAULT_LOG_DATA_DIR: &str = "data/log_data";
pub const DEFAULT_DATA_EXTENSION: &str = "json";

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub db_path: PathBuf,
    pub song_data_dir: PathBuf,
    pub log_data_dir: PathBuf,
    pub data_extension: String,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            song_data_dir: PathBuf::from(DEFAULT_SONG_DATA_DIR),
            log_data_dir: PathBuf::from(DEFAULT_LOG_DATA_DIR),
            data_extension: DEFAULT_DATA_EXTENSION.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub song_data_dir: PathBuf,
    pub log_data_dir: PathBuf,
    /// Without the leading dot.
    pub data_extension: String,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_path = resolve_db_path(&cli.db_path, file.db_path.as_deref());

        let song_data_dir = file
            .song_data_dir
            .map(PathBuf::from)
            .unwrap_or_else(|| cli.song_data_dir.clone());
        validate_data_dir("song_data_dir", &song_data_dir)?;

        let log_data_dir = file
            .log_data_dir
            .map(PathBuf::from)
            .unwrap_or_else(|| cli.log_data_dir.clone());
        validate_data_dir("log_data_dir", &log_data_dir)?;

        let raw_extension = file
            .data_extension
            .unwrap_or_else(|| cli.data_extension.clone());
        let data_extension = raw_extension.trim_start_matches('.').to_string();
        if data_extension.is_empty() {
            bail!("data_extension must not be empty");
        }

        Ok(Self {
            db_path,
            song_data_dir,
            log_data_dir,
            data_extension,
        })
    }
}

/// Database location only, for tools that do not read data files.
pub fn resolve_db_path(cli_db_path: &Path, file_db_path: Option<&str>) -> PathBuf {
    file_db_path
        .map(PathBuf::from)
        .unwrap_or_else(|| cli_db_path.to_path_buf())
}

fn validate_data_dir(name: &str, path: &Path) -> Result<()> {
    if !path.exists() {
        bail!("{} does not exist: {:?}", name, path);
    }
    if !path.is_dir() {
        bail!("{} is not a directory: {:?}", name, path);
    }
    Ok(())
}
