//! SigmaLab CLI: simulate, score and optimize commands.
//!
//! Commands:
//! - `simulate` run the ledger over a band feed and write the ledger CSV
//! - `score` walk-forward robust score of the configured parameter set
//! - `optimize` seeded parameter search, baseline vs best report, best ledger CSV
//!
//! Every command reads an optional TOML config; flags override its values.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use sigmalab_runner::{
    export_score_json, export_summary_json, render_comparison, render_summary, run_optimization,
    run_scoring, run_simulation, save_ledger_csv, write_with_fallback, DateWindow, FitnessMetric,
    SimulationConfig,
};

#[derive(Parser)]
#[command(
    name = "sigmalab",
    about = "SigmaLab CLI — σ-band accumulation strategy backtester"
)]
struct Cli {
    /// Debug logging (RUST_LOG takes precedence).
    #[arg(long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct RunArgs {
    /// Band feed file (.csv or .json).
    #[arg(long)]
    input: PathBuf,

    /// TOML config file. Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Window start (YYYY-MM-DD or "today").
    #[arg(long, value_parser = parse_date)]
    start: Option<NaiveDate>,

    /// Window end (YYYY-MM-DD or "today").
    #[arg(long, value_parser = parse_date)]
    end: Option<NaiveDate>,

    /// Walk-forward window count.
    #[arg(long)]
    splits: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the ledger once and write the ledger CSV.
    Simulate {
        #[command(flatten)]
        run: RunArgs,

        /// Ledger CSV output path.
        #[arg(long, default_value = "ledger.csv")]
        out: PathBuf,

        /// Also write the run summary as JSON.
        #[arg(long)]
        summary_json: Option<PathBuf>,
    },
    /// Walk-forward score of the configured parameter set.
    Score {
        #[command(flatten)]
        run: RunArgs,

        /// Print the per-window breakdown as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Search for a better parameter set.
    Optimize {
        #[command(flatten)]
        run: RunArgs,

        /// Trial count.
        #[arg(long)]
        trials: Option<usize>,

        /// Search seed.
        #[arg(long)]
        seed: Option<u64>,

        /// Objective: walk_forward, terminal_nav, cagr, total_return, cagr_over_drawdown.
        #[arg(long)]
        metric: Option<FitnessMetric>,

        /// Ledger CSV output path for the best parameter set.
        #[arg(long, default_value = "ledger_best.csv")]
        out: PathBuf,

        /// Write the config with the best parameter set as TOML.
        #[arg(long)]
        save_config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    match cli.command {
        Commands::Simulate {
            run,
            out,
            summary_json,
        } => run_simulate_cmd(run, out, summary_json),
        Commands::Score { run, json } => run_score_cmd(run, json),
        Commands::Optimize {
            run,
            trials,
            seed,
            metric,
            out,
            save_config,
        } => run_optimize_cmd(run, trials, seed, metric, out, save_config),
    }
}

fn init_tracing(verbose: bool) -> Result<()> {
    let default = if verbose { "sigmalab=debug" } else { "sigmalab=info" };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default))
        .context("invalid log filter")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    if s.eq_ignore_ascii_case("today") {
        return Ok(chrono::Local::now().date_naive());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("invalid date '{s}': {e}"))
}

/// Load the config file (or defaults) and apply the shared flag overrides.
fn resolve_config(run: &RunArgs) -> Result<SimulationConfig> {
    let mut config = match &run.config {
        Some(path) => SimulationConfig::from_file(path)?,
        None => SimulationConfig::default(),
    };
    if run.start.is_some() || run.end.is_some() {
        config.window = DateWindow::new(
            run.start.or(config.window.start),
            run.end.or(config.window.end),
        );
    }
    if let Some(splits) = run.splits {
        config.walk_forward.splits = splits;
    }
    config.validate()?;
    tracing::debug!(
        window = ?config.window,
        splits = config.walk_forward.splits,
        "config resolved"
    );
    Ok(config)
}

fn run_simulate_cmd(run: RunArgs, out: PathBuf, summary_json: Option<PathBuf>) -> Result<()> {
    let config = resolve_config(&run)?;
    let result = run_simulation(&run.input, &config)?;

    println!();
    println!("=== Simulation ===");
    print!("{}", render_summary(&result));

    let written = save_ledger_csv(&result.run, &out)?;
    println!("Ledger written to: {}", written.display());

    if let Some(path) = summary_json {
        let json = export_summary_json(&result)?;
        let written = write_with_fallback(&path, &json)?;
        println!("Summary written to: {}", written.display());
    }
    Ok(())
}

fn run_score_cmd(run: RunArgs, json: bool) -> Result<()> {
    let config = resolve_config(&run)?;
    let result = run_scoring(&run.input, &config)?;

    if json {
        println!("{}", export_score_json(&result)?);
        return Ok(());
    }
    println!();
    println!("=== Walk-forward score ===");
    for (i, fold) in result.walk_forward.folds.iter().enumerate() {
        println!(
            "Window {}: {} → {}  NAV {:.2}  DD {:.3}  drag {:.3}  score {:.2}",
            i + 1,
            fold.start_date,
            fold.end_date,
            fold.terminal_nav,
            fold.max_drawdown,
            fold.cash_drag,
            fold.score
        );
    }
    println!("Fitness (median): {:.2}", result.walk_forward.fitness);
    Ok(())
}

fn run_optimize_cmd(
    run: RunArgs,
    trials: Option<usize>,
    seed: Option<u64>,
    metric: Option<FitnessMetric>,
    out: PathBuf,
    save_config: Option<PathBuf>,
) -> Result<()> {
    let mut config = resolve_config(&run)?;
    if let Some(trials) = trials {
        config.search.trials = trials;
    }
    if let Some(seed) = seed {
        config.search.seed = seed;
    }
    if let Some(metric) = metric {
        config.search.metric = metric;
    }
    config.validate()?;

    let result = run_optimization(&run.input, &config)?;

    println!();
    println!(
        "=== Baseline vs Best ({} trials, seed {}, {}) ===",
        config.search.trials, config.search.seed, config.search.metric
    );
    print!("{}", render_comparison(&result.comparison));
    println!(
        "Best score: {:.4} (trial {})",
        result.search.best.score, result.search.best.index
    );

    let written = save_ledger_csv(&result.best_run.run, &out)?;
    println!("Best-config ledger written to: {}", written.display());

    if let Some(path) = save_config {
        let best = SimulationConfig {
            params: result.search.best.params,
            ..config
        };
        let text = best.to_toml().context("failed to serialize best config")?;
        let written = write_with_fallback(&path, &text)?;
        println!("Best config written to: {}", written.display());
    }
    Ok(())
}
