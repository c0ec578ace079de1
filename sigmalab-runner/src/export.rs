//! Reporting and export: ledger CSV, summary JSON, and plain-text reports.
//!
//! The ledger CSV carries every row column followed by the cumulative
//! performance columns. Files are written through [`write_with_fallback`]:
//! when the target cannot be created (typically locked by a spreadsheet),
//! a timestamped sibling is written instead.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;

use sigmalab_core::domain::ParameterSet;
use sigmalab_core::engine::{EngineConfig, LedgerRun};
use sigmalab_core::fingerprint::RunFingerprint;

use crate::metrics::RunSummary;
use crate::runner::{Comparison, ScoreResult, SimulationResult};

/// Ledger CSV columns, in order.
pub const LEDGER_COLUMNS: [&str; 22] = [
    "date",
    "price",
    "band_bucket",
    "momentum",
    "paused",
    "action",
    "fraction",
    "rule",
    "note",
    "trade_asset",
    "trade_cash",
    "fee_asset",
    "contrib_gross",
    "contrib_fee",
    "contrib_net",
    "cash_balance",
    "asset_balance",
    "nav",
    "contrib_gross_cum",
    "contrib_net_cum",
    "total_return",
    "cagr",
];

// ─── CSV export ─────────────────────────────────────────────────────

/// Export the ledger with performance columns as CSV.
pub fn export_ledger_csv(run: &LedgerRun) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(LEDGER_COLUMNS)
        .context("failed to write CSV header")?;

    let perf = &run.performance;
    for (i, r) in run.rows.iter().enumerate() {
        let series = |s: &[f64]| s.get(i).copied().unwrap_or(0.0).to_string();
        wtr.write_record([
            r.date.to_string(),
            r.price.to_string(),
            r.band_bucket.label().to_string(),
            r.momentum.to_string(),
            r.paused.to_string(),
            r.action.as_str().to_string(),
            r.fraction.to_string(),
            r.rule.label().to_string(),
            r.note.clone(),
            r.trade_asset.to_string(),
            r.trade_cash.to_string(),
            r.fee_asset.to_string(),
            r.contrib_gross.to_string(),
            r.contrib_fee.to_string(),
            r.contrib_net.to_string(),
            r.cash_balance.to_string(),
            r.asset_balance.to_string(),
            r.nav.to_string(),
            series(&perf.contrib_gross_cum),
            series(&perf.contrib_net_cum),
            series(&perf.total_return),
            series(&perf.cagr),
        ])
        .with_context(|| format!("failed to write CSV row for {}", r.date))?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── JSON export ────────────────────────────────────────────────────

#[derive(Serialize)]
struct SummaryDocument<'a> {
    fingerprint: &'a RunFingerprint,
    config: &'a EngineConfig,
    summary: &'a RunSummary,
}

/// Pretty JSON of a run's identity, configuration and summary (no rows).
pub fn export_summary_json(result: &SimulationResult) -> Result<String> {
    let doc = SummaryDocument {
        fingerprint: &result.fingerprint,
        config: &result.config,
        summary: &result.summary,
    };
    serde_json::to_string_pretty(&doc).context("failed to serialize run summary to JSON")
}

pub fn export_score_json(result: &ScoreResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize score to JSON")
}

// ─── File output ────────────────────────────────────────────────────

/// `<stem>_<YYYYmmdd_HHMMSS><.ext>` next to `path`.
pub fn timestamped_sibling(path: &Path, stamp: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "ledger".to_string());
    let name = match path.extension() {
        Some(ext) => format!("{stem}_{stamp}.{}", ext.to_string_lossy()),
        None => format!("{stem}_{stamp}"),
    };
    path.with_file_name(name)
}

/// Write `contents` to `path`, or to a timestamped sibling if that fails.
///
/// Returns the path actually written.
pub fn write_with_fallback(path: &Path, contents: &str) -> Result<PathBuf> {
    match std::fs::write(path, contents) {
        Ok(()) => Ok(path.to_path_buf()),
        Err(err) => {
            let stamp = Utc::now().format("%Y%m%d_%H%M%S").to_string();
            let alt = timestamped_sibling(path, &stamp);
            tracing::warn!(
                target = %path.display(),
                fallback = %alt.display(),
                error = %err,
                "output file unavailable; writing sibling instead"
            );
            std::fs::write(&alt, contents)
                .with_context(|| format!("failed to write {} or {}", path.display(), alt.display()))?;
            Ok(alt)
        }
    }
}

/// Write the ledger CSV for `run` to `path`, with fallback.
pub fn save_ledger_csv(run: &LedgerRun, path: &Path) -> Result<PathBuf> {
    let csv = export_ledger_csv(run)?;
    let written = write_with_fallback(path, &csv)?;
    tracing::info!(path = %written.display(), rows = run.len(), "ledger written");
    Ok(written)
}

// ─── Text reports ───────────────────────────────────────────────────

fn params_line(p: &ParameterSet) -> String {
    p.to_array()
        .iter()
        .enumerate()
        .map(|(i, v)| format!("B{}={v:.5}", i + 1))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Human-readable summary of one run.
pub fn render_summary(result: &SimulationResult) -> String {
    let s = &result.summary;
    let fp = &result.fingerprint;
    let range = match (fp.start_date, fp.end_date) {
        (Some(a), Some(b)) => format!("{a} → {b}"),
        _ => "-".to_string(),
    };
    let mut out = String::new();
    out.push_str(&format!("Window:        {range} ({} days)\n", s.days));
    out.push_str(&format!("Config:        {}\n", fp.config_hash.short()));
    out.push_str(&format!("Dataset:       {}\n", fp.dataset_hash.short()));
    out.push_str(&format!("Contributed:   {:.2}\n", s.contributed_gross));
    out.push_str(&format!("Terminal NAV:  {:.2}\n", s.terminal_nav));
    out.push_str(&format!("Total return:  {:.2}%\n", s.total_return * 100.0));
    out.push_str(&format!("CAGR:          {:.2}%\n", s.cagr * 100.0));
    out.push_str(&format!("Max drawdown:  {:.3}\n", s.max_drawdown));
    out.push_str(&format!("Cash drag:     {:.3}\n", s.cash_drag));
    out.push_str(&format!(
        "Actions:       {} buy / {} sell / {} hold\n",
        s.buys, s.sells, s.holds
    ));
    out.push_str(&format!(
        "Fees:          {:.8} asset, {:.2} cash\n",
        s.trade_fees_asset, s.contribution_fees
    ));
    out
}

/// Baseline vs best table.
pub fn render_comparison(c: &Comparison) -> String {
    let imp = c
        .nav_improvement_pct()
        .map_or_else(|| "n/a".to_string(), |v| format!("{v:.2}%"));
    let mut out = String::new();
    out.push_str(&format!(
        "{:<14}{:>15}{:>15}{:>18}\n",
        "Metric", "Baseline", "Best", "Delta"
    ));
    out.push_str(&format!("{}\n", "-".repeat(62)));
    out.push_str(&format!(
        "{:<14}{:>15.2}{:>15.2}{:>18}\n",
        "Terminal NAV", c.baseline.terminal_nav, c.best.terminal_nav, imp
    ));
    out.push_str(&format!(
        "{:<14}{:>15.3}{:>15.3}{:>18.3}\n",
        "Max Drawdown",
        c.baseline.max_drawdown,
        c.best.max_drawdown,
        c.drawdown_delta()
    ));
    out.push_str(&format!(
        "{:<14}{:>15.3}{:>15.3}{:>18.3}\n",
        "Cash Drag",
        c.baseline.cash_drag,
        c.best.cash_drag,
        c.drag_delta()
    ));
    out.push_str(&format!("\nBest: {}\n", params_line(&c.best_params)));
    out
}
