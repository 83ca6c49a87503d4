//! SweepLab CLI — replay, sweep, and data-check commands.
//!
//! Commands:
//! - `run` — execute one replay from a TOML config and save the artifact
//! - `sweep` — run a parameter grid and print the ranked outcomes
//! - `data check` — load bar/level files and report what the runner sees

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use sweeplab_runner::{
    build_artifact, load_bars_csv, load_levels_json, run_replay, run_sweep, save_artifact,
    BacktestConfig, PerformanceMetrics, SweepConfig,
};

#[derive(Parser)]
#[command(name = "sweeplab", about = "SweepLab — setup detection and execution simulation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a replay from a TOML config file.
    Run {
        /// Path to the TOML run config.
        #[arg(long)]
        config: PathBuf,

        /// Output directory for the result artifact.
        #[arg(long, default_value = "results")]
        out: PathBuf,
    },
    /// Run a parameter sweep from a TOML config file.
    Sweep {
        /// Path to the TOML sweep config (base run config plus a [grid]).
        #[arg(long)]
        config: PathBuf,

        /// Output path for the ranked outcomes JSON.
        #[arg(long, default_value = "results/sweep.json")]
        out: PathBuf,

        /// How many ranked rows to print.
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
    /// Data utilities.
    Data {
        #[command(subcommand)]
        action: DataAction,
    },
}

#[derive(Subcommand)]
enum DataAction {
    /// Load bar/level files and report counts and ranges.
    Check {
        /// CSV bar file.
        #[arg(long)]
        bars: PathBuf,

        /// Optional JSON level-snapshot file.
        #[arg(long)]
        levels: Option<PathBuf>,

        /// Entry timeframe the bars are expected to carry.
        #[arg(long, default_value = "M1")]
        timeframe: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Run { config, out } => cmd_run(&config, &out),
        Commands::Sweep { config, out, top } => cmd_sweep(&config, &out, top),
        Commands::Data { action } => match action {
            DataAction::Check { bars, levels, timeframe } => {
                cmd_data_check(&bars, levels.as_deref(), &timeframe)
            }
        },
    }
}

fn cmd_run(config_path: &std::path::Path, out: &std::path::Path) -> Result<()> {
    let config = BacktestConfig::from_toml_file(config_path)
        .with_context(|| format!("loading config {}", config_path.display()))?;

    let loaded = load_bars_csv(&config.data.bars, config.strategy.entry_tf)
        .with_context(|| format!("loading bars {}", config.data.bars.display()))?;
    if loaded.skipped_insane > 0 {
        println!("warning: dropped {} malformed bar rows", loaded.skipped_insane);
    }
    let levels = match &config.data.levels {
        Some(path) => Some(
            load_levels_json(path)
                .with_context(|| format!("loading levels {}", path.display()))?,
        ),
        None => None,
    };

    let result = run_replay(
        &loaded.bars,
        levels.as_ref(),
        &config.strategy,
        &config.order,
        &config.sim,
    )?;

    println!(
        "replayed {} entry bars ({} structure bars): {} signals, {} rejected by risk, {} trades",
        result.entry_bar_count,
        result.structure_bar_count,
        result.signal_count,
        result.rejected_by_risk,
        result.trades.len(),
    );

    let artifact = build_artifact(result, &config.strategy, &config.order, &config.sim);
    print_metrics(&artifact.metrics);
    let path = save_artifact(out, &artifact)?;
    println!("artifact: {}", path.display());
    Ok(())
}

fn cmd_sweep(config_path: &std::path::Path, out: &std::path::Path, top: usize) -> Result<()> {
    let raw = fs::read_to_string(config_path)
        .with_context(|| format!("reading {}", config_path.display()))?;

    // The sweep file carries the run config plus the grid axes.
    let run_config: BacktestConfig = toml::from_str(&raw)
        .with_context(|| format!("parsing {}", config_path.display()))?;
    run_config.validate()?;
    let sweep_config: SweepConfig = toml::from_str(&raw)
        .with_context(|| format!("parsing sweep grid in {}", config_path.display()))?;

    let loaded = load_bars_csv(&run_config.data.bars, run_config.strategy.entry_tf)?;
    let levels = match &run_config.data.levels {
        Some(path) => Some(load_levels_json(path)?),
        None => None,
    };

    let outcomes = run_sweep(&loaded.bars, levels.as_ref(), &sweep_config)?;
    println!("{} cells evaluated", outcomes.len());
    for outcome in outcomes.iter().take(top) {
        println!(
            "{:>10.2}  pf={:<6.2} trades={:<4} win={:>5.1}%  {}",
            outcome.metrics.total_net_pnl,
            outcome.metrics.profit_factor,
            outcome.metrics.trade_count,
            outcome.metrics.win_rate * 100.0,
            outcome.label,
        );
    }

    if let Some(parent) = out.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(out, serde_json::to_string_pretty(&outcomes)?)?;
    println!("outcomes: {}", out.display());
    Ok(())
}

fn cmd_data_check(
    bars_path: &std::path::Path,
    levels_path: Option<&std::path::Path>,
    timeframe: &str,
) -> Result<()> {
    let timeframe = parse_timeframe(timeframe)?;
    let loaded = load_bars_csv(bars_path, timeframe)
        .with_context(|| format!("loading bars {}", bars_path.display()))?;
    let first = loaded.bars.first().expect("loader rejects empty files");
    let last = loaded.bars.last().expect("loader rejects empty files");
    println!(
        "{} bars [{} .. {}], {} malformed rows dropped",
        loaded.bars.len(),
        first.timestamp,
        last.close_time(),
        loaded.skipped_insane,
    );

    if let Some(path) = levels_path {
        let levels = load_levels_json(path)
            .with_context(|| format!("loading levels {}", path.display()))?;
        println!("{} level snapshots", levels.len());
        if let Some(snapshot) = levels.latest_at(last.close_time()) {
            println!("latest snapshot carries {} levels", snapshot.levels().len());
        }
    }
    Ok(())
}

fn parse_timeframe(s: &str) -> Result<sweeplab_core::domain::Timeframe> {
    use sweeplab_core::domain::Timeframe;
    let tf = match s.to_ascii_uppercase().as_str() {
        "M1" => Timeframe::M1,
        "M5" => Timeframe::M5,
        "M15" => Timeframe::M15,
        "M30" => Timeframe::M30,
        "H1" => Timeframe::H1,
        "H4" => Timeframe::H4,
        "D1" => Timeframe::D1,
        other => anyhow::bail!("unknown timeframe '{other}'"),
    };
    Ok(tf)
}

fn print_metrics(metrics: &PerformanceMetrics) {
    println!(
        "net pnl {:.2} (commission {:.2}), expectancy {:.2}, max drawdown {:.2}",
        metrics.total_net_pnl, metrics.total_commission, metrics.expectancy, metrics.max_drawdown,
    );
    println!(
        "win rate {:.1}%, profit factor {:.2}, avg win {:.2} / avg loss {:.2}",
        metrics.win_rate * 100.0,
        metrics.profit_factor,
        metrics.average_win,
        metrics.average_loss,
    );
    println!(
        "exits: {} stop / {} trail / {} target / {} max-hold / {} data-end",
        metrics.exits.stop_loss,
        metrics.exits.trailing_stop,
        metrics.exits.take_profit,
        metrics.exits.max_hold_time,
        metrics.exits.data_end,
    );
}
