use anyhow::{Context, Result};
use clap::Parser;
use sparkify_etl::config::{
    AppConfig, CliConfig, FileConfig, DEFAULT_DATA_EXTENSION, DEFAULT_DB_PATH,
    DEFAULT_LOG_DATA_DIR, DEFAULT_SONG_DATA_DIR,
};
use sparkify_etl::{
    process_data, process_log_file, process_song_file, SqliteWarehouse, StdoutProgress,
    WarehouseSink,
};
use std::path::PathBuf;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    if path_buf.is_absolute() {
        return Ok(path_buf);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(path_buf))
}

#[derive(Parser, Debug)]
#[command(name = "sparkify-etl")]
#[command(about = "Load the song catalog and event logs into the Sparkify warehouse")]
struct CliArgs {
    /// Path to the SQLite warehouse database (tables must already exist).
    #[clap(long, value_parser = parse_path, default_value = DEFAULT_DB_PATH)]
    pub db_path: PathBuf,

    /// Root directory of the song catalog files.
    #[clap(long, value_parser = parse_path, default_value = DEFAULT_SONG_DATA_DIR)]
    pub song_data: PathBuf,

    /// Root directory of the event log files.
    #[clap(long, value_parser = parse_path, default_value = DEFAULT_LOG_DATA_DIR)]
    pub log_data: PathBuf,

    /// Extension of the data files, without the dot.
    #[clap(long, default_value = DEFAULT_DATA_EXTENSION)]
    pub extension: String,

    /// Optional TOML config file; its values override the CLI.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()?;

    let file_config = cli_args
        .config
        .as_deref()
        .map(FileConfig::load)
        .transpose()?;
    let cli_config = CliConfig {
        db_path: cli_args.db_path,
        song_data_dir: cli_args.song_data,
        log_data_dir: cli_args.log_data,
        data_extension: cli_args.extension,
    };
    let config = AppConfig::resolve(&cli_config, file_config)?;

    info!("Opening warehouse at {}", config.db_path.display());
    let store = SqliteWarehouse::open(&config.db_path)?;
    let mut progress = StdoutProgress;

    process_data(
        &store,
        &config.song_data_dir,
        &config.data_extension,
        process_song_file,
        &mut progress,
    )
    .context("Song catalog load failed")?;

    process_data(
        &store,
        &config.log_data_dir,
        &config.data_extension,
        process_log_file,
        &mut progress,
    )
    .context("Event log load failed")?;

    let counts = store.table_counts()?;
    info!("Warehouse contains:");
    info!("  {} songs", counts.songs);
    info!("  {} artists", counts.artists);
    info!("  {} time rows", counts.time);
    info!("  {} users", counts.users);
    info!("  {} songplays", counts.songplays);

    Ok(())
}
