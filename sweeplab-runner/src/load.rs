//! Bar and level loading for the runner.
//!
//! The ingestion layer proper (contract rolls, feed plumbing) lives outside
//! this workspace; the runner consumes its prepared outputs — a CSV bar
//! file per run at entry-timeframe granularity and an optional JSON array
//! of level snapshots. Rows that fail the bar sanity contract are dropped
//! and counted rather than recovered; non-monotonic timestamps are fatal.

use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use sweeplab_core::domain::{Bar, LevelSnapshot, Timeframe};
use sweeplab_core::series::{SampledSeries, SeriesError};
use thiserror::Error;

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Series(#[from] SeriesError),

    #[error("bar file '{path}' contained no usable rows")]
    NoBars { path: String },
}

/// One CSV row: epoch-second timestamp plus OHLCV.
#[derive(Debug, Deserialize)]
struct BarRow {
    timestamp: i64,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

/// Loaded bars plus data-quality counters.
#[derive(Debug)]
pub struct LoadedBars {
    pub bars: Vec<Bar>,
    /// Rows dropped for failing the sanity contract.
    pub skipped_insane: usize,
}

/// Load an entry-timeframe bar series from CSV
/// (`timestamp,open,high,low,close,volume`; timestamp in epoch seconds).
pub fn load_bars_csv(path: &Path, timeframe: Timeframe) -> Result<LoadedBars, LoadError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut bars = Vec::new();
    let mut skipped_insane = 0;

    for row in reader.deserialize() {
        let row: BarRow = row?;
        let Some(timestamp) = Utc.timestamp_opt(row.timestamp, 0).single() else {
            skipped_insane += 1;
            continue;
        };
        let bar = Bar {
            timestamp,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
            timeframe,
        };
        if bar.is_sane() {
            bars.push(bar);
        } else {
            skipped_insane += 1;
        }
    }

    if bars.is_empty() {
        return Err(LoadError::NoBars { path: path.display().to_string() });
    }
    ensure_monotonic(&bars)?;
    Ok(LoadedBars { bars, skipped_insane })
}

/// Load level snapshots from a JSON array, indexed for
/// nearest-prior-timestamp lookup.
pub fn load_levels_json(path: &Path) -> Result<SampledSeries<LevelSnapshot>, LoadError> {
    let raw = fs::read_to_string(path)?;
    let snapshots: Vec<LevelSnapshot> = serde_json::from_str(&raw)?;
    let samples: Vec<(DateTime<Utc>, LevelSnapshot)> =
        snapshots.into_iter().map(|s| (s.timestamp, s)).collect();
    Ok(SampledSeries::new(samples)?)
}

fn ensure_monotonic(bars: &[Bar]) -> Result<(), SeriesError> {
    for (i, pair) in bars.windows(2).enumerate() {
        if pair[1].timestamp <= pair[0].timestamp {
            return Err(SeriesError::NonMonotonic { index: i + 1 });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("sweeplab_test_{name}"));
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn loads_csv_bars_and_counts_insane_rows() {
        let path = write_temp(
            "bars_ok.csv",
            "timestamp,open,high,low,close,volume\n\
             1709560800,100.0,101.0,99.0,100.5,1200\n\
             1709560860,100.5,102.0,95.0,108.0,900\n\
             1709560920,100.5,101.5,100.0,101.0,800\n",
        );
        let loaded = load_bars_csv(&path, Timeframe::M1).unwrap();
        // Second row has close above high: dropped.
        assert_eq!(loaded.bars.len(), 2);
        assert_eq!(loaded.skipped_insane, 1);
        assert_eq!(loaded.bars[0].timeframe, Timeframe::M1);
        assert_eq!(loaded.bars[0].close, 100.5);
    }

    #[test]
    fn non_monotonic_bars_are_fatal() {
        let path = write_temp(
            "bars_bad_order.csv",
            "timestamp,open,high,low,close,volume\n\
             1709560860,100.0,101.0,99.0,100.5,1200\n\
             1709560800,100.5,101.5,100.0,101.0,800\n",
        );
        let err = load_bars_csv(&path, Timeframe::M1).unwrap_err();
        assert!(matches!(err, LoadError::Series(SeriesError::NonMonotonic { index: 1 })));
    }

    #[test]
    fn empty_file_is_an_error() {
        let path = write_temp("bars_empty.csv", "timestamp,open,high,low,close,volume\n");
        assert!(matches!(
            load_bars_csv(&path, Timeframe::M1),
            Err(LoadError::NoBars { .. })
        ));
    }

    #[test]
    fn loads_level_snapshots() {
        let path = write_temp(
            "levels.json",
            r#"[
                {"timestamp":"2024-03-04T13:00:00Z","support":[17900.0],"put_wall":17850.0},
                {"timestamp":"2024-03-04T14:00:00Z","support":[17925.0],"liquidity":[17960.5]}
            ]"#,
        );
        let series = load_levels_json(&path).unwrap();
        assert_eq!(series.len(), 2);
        let at = Utc.with_ymd_and_hms(2024, 3, 4, 13, 30, 0).unwrap();
        let snap = series.latest_at(at).unwrap();
        assert_eq!(snap.support, vec![17900.0]);
        assert_eq!(snap.put_wall, Some(17850.0));
    }
}
