use crate::infra::open_store;
use chrono::Utc;
use clap::Args;
use serde_json::json;
use std::path::PathBuf;
use utility_tracker::config::AppConfig;
use utility_tracker::error::AppError;
use utility_tracker::tracker::seed::demo_snapshot;
use utility_tracker::tracker::{AdminStats, JsonFileStore, SnapshotStore, SystemStats};

#[derive(Args, Debug, Default)]
pub(crate) struct SeedArgs {
    /// Data file to write. Defaults to APP_DATA_PATH.
    #[arg(long)]
    pub(crate) path: Option<PathBuf>,
    /// Replace an existing data file with the demo dataset.
    #[arg(long)]
    pub(crate) force: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct StatsArgs {
    /// Data file to read. Defaults to APP_DATA_PATH.
    #[arg(long)]
    pub(crate) path: Option<PathBuf>,
    /// Include user, technician, and per-area counters.
    #[arg(long)]
    pub(crate) admin: bool,
}

pub(crate) fn run_seed(args: SeedArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let store = open_store(&config, args.path);
    let written = seed_store(&store, args.force)?;

    let report = json!({
        "path": store.path().display().to_string(),
        "written": written,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

pub(crate) fn run_stats(args: StatsArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let store = open_store(&config, args.path);
    println!("{}", render_stats(&store, args.admin)?);
    Ok(())
}

/// Returns whether the demo dataset was written.
fn seed_store(store: &JsonFileStore, force: bool) -> Result<bool, AppError> {
    let snapshot = demo_snapshot(Utc::now());
    if force {
        store.save(&snapshot)?;
        return Ok(true);
    }
    Ok(store.initialize_if_missing(&snapshot)?)
}

fn render_stats(store: &JsonFileStore, admin: bool) -> Result<String, AppError> {
    let snapshot = store.load()?;
    let rendered = if admin {
        serde_json::to_string_pretty(&AdminStats::from_snapshot(&snapshot))?
    } else {
        serde_json::to_string_pretty(&SystemStats::from_snapshot(&snapshot))?
    };
    Ok(rendered)
}
