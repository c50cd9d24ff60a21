//! earncal CLI — refresh, backfill, and status commands.
//!
//! Commands:
//! - `refresh` — fetch the earnings calendar once and rebuild the live cache
//!   (archiving the prior snapshot first)
//! - `backfill` — derive write-once per-date history files from one fetch
//! - `status` — report live cache, archive, and history state
//!
//! Exit code 0 on success; 1 on any fatal error, with a diagnostic naming
//! the failed stage on stderr.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use earncal_core::{
    run_backfill, run_refresh, AlphaVantageSource, HistoryStore, Horizon, JobConfig,
    SnapshotStore,
};

/// Environment variable supplying the provider API key.
const API_KEY_ENV: &str = "ALPHAVANTAGE_API_KEY";

#[derive(Parser)]
#[command(name = "earncal", about = "earncal CLI — earnings calendar cache builder")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the earnings calendar and rebuild the live cache.
    Refresh {
        /// Path to a TOML config file. Flags override its values.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Universe CSV path. Defaults to eps_calendar_universe.csv.
        #[arg(long)]
        universe: Option<PathBuf>,

        /// Live cache output path. Defaults to earnings_cache.json.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Archive directory. Defaults to earnings_archive.
        #[arg(long)]
        archive_dir: Option<PathBuf>,

        /// Calendar horizon: 3month, 6month, or 12month.
        #[arg(long)]
        horizon: Option<String>,
    },
    /// Derive write-once per-date history files within the trailing window.
    Backfill {
        /// Path to a TOML config file. Flags override its values.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Universe CSV path. Defaults to eps_calendar_universe.csv.
        #[arg(long)]
        universe: Option<PathBuf>,

        /// History directory. Defaults to earnings_history.
        #[arg(long)]
        history_dir: Option<PathBuf>,

        /// Trailing window length in days. Defaults to 30.
        #[arg(long)]
        days: Option<i64>,

        /// Calendar horizon: 3month, 6month, or 12month.
        #[arg(long)]
        horizon: Option<String>,
    },
    /// Report live cache, archive, and history state.
    Status {
        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Refresh {
            config,
            universe,
            output,
            archive_dir,
            horizon,
        } => cmd_refresh(config, universe, output, archive_dir, horizon),
        Commands::Backfill {
            config,
            universe,
            history_dir,
            days,
            horizon,
        } => cmd_backfill(config, universe, history_dir, days, horizon),
        Commands::Status { config } => cmd_status(config),
    }
}

fn load_config(path: Option<&Path>) -> Result<JobConfig> {
    match path {
        Some(p) => {
            JobConfig::from_file(p).with_context(|| format!("load config {}", p.display()))
        }
        None => Ok(JobConfig::default()),
    }
}

/// Resolve the API key before any file or network I/O, so a missing key is
/// reported immediately.
fn require_api_key() -> Result<String> {
    std::env::var(API_KEY_ENV)
        .ok()
        .filter(|key| !key.trim().is_empty())
        .with_context(|| {
            format!("{API_KEY_ENV} is not set; export your provider API key first")
        })
}

fn parse_horizon(flag: Option<&str>) -> Result<Option<Horizon>> {
    flag.map(|s| s.parse::<Horizon>().map_err(anyhow::Error::from))
        .transpose()
}

fn cmd_refresh(
    config_path: Option<PathBuf>,
    universe: Option<PathBuf>,
    output: Option<PathBuf>,
    archive_dir: Option<PathBuf>,
    horizon: Option<String>,
) -> Result<()> {
    let api_key = require_api_key()?;

    let mut config = load_config(config_path.as_deref())?;
    if let Some(p) = universe {
        config.universe_path = p;
    }
    if let Some(p) = output {
        config.cache_path = p;
    }
    if let Some(p) = archive_dir {
        config.archive_dir = p;
    }
    if let Some(h) = parse_horizon(horizon.as_deref())? {
        config.horizon = h;
    }

    println!("Requesting EARNINGS_CALENDAR (horizon={})...", config.horizon);
    let source = AlphaVantageSource::new(&config.endpoint, api_key);
    let report = run_refresh(&config, &source).context("refresh")?;

    println!("Universe:       {} tickers", report.universe_size);
    println!("Raw rows:       {}", report.raw_rows);
    println!("Filtered rows:  {}", report.filtered_rows);
    if let Some(archived) = &report.archived_to {
        println!("Archived prior snapshot to {}", archived.display());
    }
    println!(
        "Wrote {} rows to {}",
        report.filtered_rows,
        report.cache_path.display()
    );
    Ok(())
}

fn cmd_backfill(
    config_path: Option<PathBuf>,
    universe: Option<PathBuf>,
    history_dir: Option<PathBuf>,
    days: Option<i64>,
    horizon: Option<String>,
) -> Result<()> {
    let api_key = require_api_key()?;

    let mut config = load_config(config_path.as_deref())?;
    if let Some(p) = universe {
        config.universe_path = p;
    }
    if let Some(p) = history_dir {
        config.history_dir = p;
    }
    if let Some(d) = days {
        config.backfill_days = d;
    }
    if let Some(h) = parse_horizon(horizon.as_deref())? {
        config.horizon = h;
    }

    println!(
        "Requesting EARNINGS_CALENDAR (horizon={}, window={} days)...",
        config.horizon, config.backfill_days
    );
    let source = AlphaVantageSource::new(&config.endpoint, api_key);
    let today = chrono::Local::now().date_naive();
    let report = run_backfill(&config, &source, today).context("backfill")?;

    println!("Universe:       {} tickers", report.universe_size);
    println!("Raw rows:       {}", report.raw_rows);
    println!("Filtered rows:  {}", report.filtered_rows);
    println!();
    println!("Backfill summary:");
    println!("  New history files created : {}", report.summary.created);
    println!(
        "  Existing files skipped    : {}",
        report.summary.skipped_existing
    );
    println!(
        "  Outside {}-day window     : {}",
        config.backfill_days, report.summary.skipped_out_of_range
    );
    for date in &report.summary.invalid_dates {
        println!("  Skipped invalid reportDate: {date:?}");
    }
    Ok(())
}

fn cmd_status(config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config(config_path.as_deref())?;

    let store = SnapshotStore::new(&config.cache_path, &config.archive_dir);
    let status = store.status();

    println!("Live cache: {}", status.cache_path.display());
    if !status.exists {
        println!("  (missing)");
    } else {
        match status.row_count {
            Some(n) => println!("  Rows:       {n}"),
            None => println!("  Rows:       (unparseable)"),
        }
        if let Some(meta) = &status.meta {
            println!("  Horizon:    {}", meta.horizon);
            println!("  Written at: {}", meta.written_at);
            println!("  Data hash:  {}", meta.data_hash);
        }
    }
    println!("Archive:    {} snapshot(s)", status.archive_count);

    let history = HistoryStore::new(&config.history_dir, config.backfill_days);
    println!(
        "History:    {} dated file(s) in {}",
        history.file_count(),
        config.history_dir.display()
    );
    Ok(())
}
