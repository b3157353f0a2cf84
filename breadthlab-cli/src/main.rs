//! BreadthLab CLI — compute, validate and synthetic-data commands.
//!
//! Commands:
//! - `compute` — run the breadth engine from a TOML config and/or flags, write artifacts
//! - `validate` — load the inputs and check them without computing or writing anything
//! - `synth` — write a seeded synthetic index and panel as CSV

use std::fs::OpenOptions;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use breadthlab_core::engine::{group_panel, validate_index};
use breadthlab_runner::{
    generate, load_inputs, run_breadth, save_artifacts, write_index_csv, write_panel_csv,
    BreadthConfig, BreadthRun, ExportFormat,
};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_appender::non_blocking;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "breadthlab",
    about = "BreadthLab CLI — market breadth indicators and composite score"
)]
struct Cli {
    /// Also append logs to this file.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the breadth table and write artifacts.
    Compute(InputArgs),
    /// Load and check the inputs without computing.
    Validate(InputArgs),
    /// Write a synthetic index and panel as CSV.
    Synth {
        /// Number of tickers in the panel.
        #[arg(long, default_value_t = 200)]
        tickers: usize,

        /// Number of trading days.
        #[arg(long, default_value_t = 500)]
        days: usize,

        /// RNG seed.
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Directory for index.csv and panel.csv.
        #[arg(long, default_value = "data")]
        out_dir: PathBuf,
    },
}

/// Inputs shared by `compute` and `validate`. Flags override the config file.
#[derive(Args)]
struct InputArgs {
    /// Path to a TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Index closes (.csv or .parquet).
    #[arg(long)]
    index: Option<PathBuf>,

    /// Stock panel (.csv or .parquet).
    #[arg(long)]
    panel: Option<PathBuf>,

    /// New-high win rate series (date, fraction) CSV.
    #[arg(long)]
    win_rate: Option<PathBuf>,

    /// Break-out series (date, fraction) CSV.
    #[arg(long)]
    break_out: Option<PathBuf>,

    /// Comma-separated ticker allow-list.
    #[arg(long, value_delimiter = ',')]
    universe: Option<Vec<String>>,

    /// First exported date (YYYY-MM-DD).
    #[arg(long)]
    start: Option<String>,

    /// Last exported date (YYYY-MM-DD).
    #[arg(long)]
    end: Option<String>,

    /// Output directory for artifacts.
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Artifact formats: csv, display_csv, json, parquet (comma-separated).
    #[arg(long, value_delimiter = ',')]
    formats: Option<Vec<ExportFormat>>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    // Dropped at the end of main, which flushes the file writer.
    let _guard = init_tracing(cli.log_file)?;

    match cli.command {
        Commands::Compute(args) => run_compute(args),
        Commands::Validate(args) => run_validate(args),
        Commands::Synth {
            tickers,
            days,
            seed,
            out_dir,
        } => run_synth(tickers, days, seed, out_dir),
    }
}

fn init_tracing(log_file: Option<PathBuf>) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    if let Some(path) = log_file {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|err| anyhow!("failed to create log directory {parent:?}: {err}"))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|err| anyhow!("failed to open log file {path:?}: {err}"))?;
        let (writer, guard) = non_blocking(file);
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(writer);
        tracing_subscriber::registry()
            .with(filter)
            .with(stderr_layer)
            .with(file_layer)
            .try_init()
            .map_err(|err| anyhow!("failed to initialize tracing: {err}"))?;
        Ok(Some(guard))
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(stderr_layer)
            .try_init()
            .map_err(|err| anyhow!("failed to initialize tracing: {err}"))?;
        Ok(None)
    }
}

fn parse_date(flag: &str, value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("--{flag} expects YYYY-MM-DD, got '{value}'"))
}

/// Config file (if any) with command-line flags layered on top.
fn build_config(args: InputArgs) -> Result<BreadthConfig> {
    let mut config = match &args.config {
        Some(path) => BreadthConfig::from_file(path)?,
        None => BreadthConfig::default(),
    };

    if let Some(index) = args.index {
        config.inputs.index = Some(index);
    }
    if let Some(panel) = args.panel {
        config.inputs.panel = Some(panel);
    }
    if let Some(win_rate) = args.win_rate {
        config.inputs.win_rate = Some(win_rate);
    }
    if let Some(break_out) = args.break_out {
        config.inputs.break_out = Some(break_out);
    }
    if let Some(universe) = args.universe {
        config.inputs.universe = Some(universe);
    }
    if let Some(start) = args.start.as_deref() {
        config.output.start = Some(parse_date("start", start)?);
    }
    if let Some(end) = args.end.as_deref() {
        config.output.end = Some(parse_date("end", end)?);
    }
    if let Some(dir) = args.out_dir {
        config.output.dir = dir;
    }
    if let Some(formats) = args.formats {
        config.output.formats = formats;
    }

    config.validate()?;
    Ok(config)
}

fn run_compute(args: InputArgs) -> Result<()> {
    let config = build_config(args)?;
    let run = run_breadth(&config)?;

    print_summary(&run);

    let run_dir = save_artifacts(&run, &config.output.dir, &config.output.formats)?;
    println!("Artifacts saved to: {}", run_dir.display());
    Ok(())
}

fn run_validate(args: InputArgs) -> Result<()> {
    let config = build_config(args)?;
    let loaded = load_inputs(&config.inputs)?;

    validate_index(&loaded.index)?;
    let (histories, stats) = group_panel(&loaded.panel)?;

    let (Some(first), Some(last)) = (loaded.index.first(), loaded.index.last()) else {
        bail!("index series is empty");
    };
    let covered = histories
        .iter()
        .filter(|h| h.observations.len() >= config.engine.ma_period)
        .count();

    println!("Inputs OK");
    println!("  Index:         {} rows, {} .. {}", loaded.index.len(), first.date, last.date);
    println!(
        "  Panel:         {} tickers, {} observations",
        stats.tickers, stats.observations
    );
    println!("  Dropped rows:  {}", stats.dropped_rows);
    println!("  Outside universe: {}", loaded.filtered_rows);
    println!(
        "  Tickers with >= {} observations: {covered}",
        config.engine.ma_period
    );
    println!("  Dataset hash:  {}", loaded.dataset_hash);
    Ok(())
}

fn run_synth(tickers: usize, days: usize, seed: u64, out_dir: PathBuf) -> Result<()> {
    if days == 0 {
        bail!("--days must be at least 1");
    }
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;

    let data = generate(tickers, days, seed);
    let index_path = out_dir.join("index.csv");
    let panel_path = out_dir.join("panel.csv");
    write_index_csv(&data.index, &index_path)?;
    write_panel_csv(&data.panel, &panel_path)?;

    info!(tickers, days, seed, rows = data.panel.len(), "synthetic data written");
    println!("Index: {}", index_path.display());
    println!("Panel: {}", panel_path.display());
    Ok(())
}

fn print_summary(run: &BreadthRun) {
    let s = &run.summary;
    let range = match (s.first_date, s.last_date) {
        (Some(first), Some(last)) => format!("{first} .. {last}"),
        _ => "(empty)".to_string(),
    };

    println!();
    println!("=== Breadth Run ===");
    println!("Dates:         {range}");
    println!("Rows:          {} ({} scored)", s.rows, s.scored_rows);
    println!(
        "Panel:         {} tickers, {} observations, {} dropped",
        s.tickers, s.observations, s.dropped_rows
    );
    if s.filtered_rows > 0 {
        println!("Universe:      {} rows outside the allow-list", s.filtered_rows);
    }
    if let Some(n) = s.win_rate_rows {
        println!("Win rate:      {n} rows matched");
    }
    if let Some(n) = s.break_out_rows {
        println!("Break-out:     {n} rows matched");
    }
    println!("Dataset hash:  {}", run.dataset_hash);

    if let Some(latest) = run.table.rows.last() {
        let fmt = |v: Option<f64>| v.map_or_else(|| "-".to_string(), |x| format!("{x:.1}"));
        println!();
        println!("Latest ({}):", latest.date);
        println!("  Index close:   {:.1}", latest.index_close);
        println!("  RSI fast/slow: {} / {}", fmt(latest.index_rsi_fast), fmt(latest.index_rsi_slow));
        println!("  Breadth:       {}", fmt(latest.breadth_above_ma));
        println!("  Score:         {}", fmt(latest.score));
    }
    println!();
}
