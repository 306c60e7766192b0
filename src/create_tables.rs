//! Drops and recreates the warehouse tables.
//!
//! Any data already loaded is discarded.

use anyhow::Result;
use clap::Parser;
use sparkify_etl::config::{resolve_db_path, FileConfig, DEFAULT_DB_PATH};
use sparkify_etl::warehouse::WAREHOUSE_SCHEMA;
use sparkify_etl::SqliteWarehouse;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "create-tables")]
#[command(about = "Drop and recreate the Sparkify warehouse tables")]
struct Args {
    /// Path to the SQLite warehouse database, created if missing.
    #[arg(long, default_value = DEFAULT_DB_PATH)]
    db_path: PathBuf,

    /// Optional TOML config file; its `db_path` overrides the CLI.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let file_config = args.config.as_deref().map(FileConfig::load).transpose()?;
    let db_path = resolve_db_path(
        &args.db_path,
        file_config.as_ref().and_then(|f| f.db_path.as_deref()),
    );

    if db_path.exists() {
        warn!(
            "Existing warehouse at {} will be emptied",
            db_path.display()
        );
    }

    SqliteWarehouse::create_tables(&db_path)?;
    info!(
        "Created {} tables in {}",
        WAREHOUSE_SCHEMA.tables.len(),
        db_path.display()
    );

    Ok(())
}
