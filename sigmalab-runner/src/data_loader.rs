//! Band feed loading for the runner.
//!
//! Reads a stored feed (CSV with a header row, or JSON as a bare array or
//! `{"data": [...]}`), normalizes it, then:
//! 1. Computes pause flags over the whole loaded history
//! 2. Filters to the requested date window
//!
//! Loading history from before the window start lets a pause regime
//! entered earlier carry into the first simulated day.

use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use csv::StringRecord;
use thiserror::Error;

use sigmalab_core::data::{normalize_payload, normalize_rows, FeedRow, NormalizeError, RawField};
use sigmalab_core::domain::BandSnapshot;
use sigmalab_core::engine::attach_pause_flags;
use sigmalab_core::fingerprint::{dataset_hash, ContentHash};

use crate::config::DateWindow;

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported input {0}: expected a .csv or .json file")]
    UnsupportedFormat(PathBuf),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("feed error: {0}")]
    Normalize(#[from] NormalizeError),

    #[error("feed contains no rows")]
    EmptyFeed,

    #[error("no snapshots in window {start:?} to {end:?}")]
    EmptyWindow {
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Csv,
    Json,
}

impl InputFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(Self::Csv),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Result of loading a feed, windowed and flagged.
#[derive(Debug, Clone)]
pub struct LoadedBands {
    /// Snapshots inside the window, pause flags attached.
    pub snapshots: Vec<BandSnapshot>,
    /// Days in the full loaded history.
    pub history_days: usize,
    /// Window after swapping a reversed range.
    pub window: DateWindow,
    /// BLAKE3 over the windowed snapshots.
    pub dataset_hash: ContentHash,
}

// ─── CSV rows ───────────────────────────────────────────────────────

/// One CSV record addressed through the header row.
struct CsvRow<'a> {
    columns: &'a HashMap<String, usize>,
    record: StringRecord,
}

impl FeedRow for CsvRow<'_> {
    fn field(&self, name: &str) -> RawField<'_> {
        match self.columns.get(name).and_then(|&i| self.record.get(i)) {
            Some(s) => RawField::Text(s),
            None => RawField::Missing,
        }
    }
}

/// Normalize a CSV feed. The first record is the header row.
pub fn read_band_csv<R: Read>(reader: R) -> Result<Vec<BandSnapshot>, LoadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    let columns: HashMap<String, usize> = rdr
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, h)| (h.to_string(), i))
        .collect();

    let rows = rdr
        .records()
        .map(|r| {
            r.map(|record| CsvRow {
                columns: &columns,
                record,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(normalize_rows(&rows)?)
}

/// Normalize a JSON feed.
pub fn read_band_json<R: Read>(reader: R) -> Result<Vec<BandSnapshot>, LoadError> {
    let payload: serde_json::Value = serde_json::from_reader(reader)?;
    Ok(normalize_payload(&payload)?)
}

/// Read and normalize a feed file, choosing the format by extension.
pub fn read_snapshots(path: &Path) -> Result<Vec<BandSnapshot>, LoadError> {
    let format =
        InputFormat::from_path(path).ok_or_else(|| LoadError::UnsupportedFormat(path.into()))?;
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = std::io::BufReader::new(file);
    match format {
        InputFormat::Csv => read_band_csv(reader),
        InputFormat::Json => read_band_json(reader),
    }
}

// ─── Windowing ──────────────────────────────────────────────────────

/// Attach pause flags over `history`, then keep the days inside `window`.
pub fn apply_window(
    mut history: Vec<BandSnapshot>,
    window: DateWindow,
) -> Result<LoadedBands, LoadError> {
    if history.is_empty() {
        return Err(LoadError::EmptyFeed);
    }
    let window = window.normalized();
    let history_days = history.len();
    attach_pause_flags(&mut history);

    let snapshots: Vec<BandSnapshot> = history
        .into_iter()
        .filter(|s| window.contains(s.date))
        .collect();
    if snapshots.is_empty() {
        return Err(LoadError::EmptyWindow {
            start: window.start,
            end: window.end,
        });
    }
    Ok(LoadedBands {
        dataset_hash: dataset_hash(&snapshots),
        snapshots,
        history_days,
        window,
    })
}

/// Load a feed file and window it.
pub fn load_bands(path: &Path, window: DateWindow) -> Result<LoadedBands, LoadError> {
    let history = read_snapshots(path)?;
    let loaded = apply_window(history, window)?;
    tracing::info!(
        path = %path.display(),
        history_days = loaded.history_days,
        days = loaded.snapshots.len(),
        first = %loaded.snapshots[0].date,
        last = %loaded.snapshots[loaded.snapshots.len() - 1].date,
        "band feed loaded"
    );
    Ok(loaded)
}
