//! Text and CSV summaries of a fetch.

use std::{
    fmt::Write as _,
    fs,
    path::{Path, PathBuf},
};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
    config::OutputConfig,
    error::FetchError,
    model::{DATE_FORMAT, DailyRecord, Query, SummaryStats, WeatherSeries},
};

/// One CSV row. Values are written at full precision so the table reads back
/// exactly.
#[derive(Debug, Serialize, Deserialize)]
struct CsvRow {
    #[serde(rename = "Date")]
    date: NaiveDate,
    #[serde(rename = "Max Temp (°C)")]
    max_temp: f64,
    #[serde(rename = "Min Temp (°C)")]
    min_temp: f64,
    #[serde(rename = "Avg Temp (°C)")]
    avg_temp: f64,
}

impl From<&DailyRecord> for CsvRow {
    fn from(r: &DailyRecord) -> Self {
        Self {
            date: r.date,
            max_temp: r.max_temp,
            min_temp: r.min_temp,
            avg_temp: r.avg_temp,
        }
    }
}

impl From<CsvRow> for DailyRecord {
    fn from(row: CsvRow) -> Self {
        Self {
            date: row.date,
            max_temp: row.max_temp,
            min_temp: row.min_temp,
            avg_temp: row.avg_temp,
        }
    }
}

/// Paths written by a successful export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFiles {
    pub csv: PathBuf,
    pub summary: PathBuf,
}

/// Writes the daily table and the text summary to two fixed paths.
#[derive(Debug, Clone)]
pub struct ReportExporter {
    csv_path: PathBuf,
    summary_path: PathBuf,
}

impl ReportExporter {
    pub fn new(csv_path: impl Into<PathBuf>, summary_path: impl Into<PathBuf>) -> Self {
        Self {
            csv_path: csv_path.into(),
            summary_path: summary_path.into(),
        }
    }

    pub fn from_config(output: &OutputConfig) -> Self {
        Self::new(&output.csv_path, &output.summary_path)
    }

    /// Overwrite both files. A failure on the second file leaves the first in
    /// its new state.
    pub fn export(
        &self,
        query: &Query,
        series: &WeatherSeries,
        stats: &SummaryStats,
    ) -> Result<ExportedFiles, FetchError> {
        write_csv(series, &self.csv_path)?;
        tracing::debug!(path = %self.csv_path.display(), "wrote daily table");

        fs::write(&self.summary_path, summary_text(query, stats))
            .map_err(|e| FetchError::io(&self.summary_path, e))?;
        tracing::debug!(path = %self.summary_path.display(), "wrote summary");

        Ok(ExportedFiles {
            csv: self.csv_path.clone(),
            summary: self.summary_path.clone(),
        })
    }
}

/// Write one row per day with a `Date, Max, Min, Avg` header.
///
/// # Errors
/// Returns [`FetchError::Io`] if the file cannot be created or written.
pub fn write_csv(series: &WeatherSeries, path: &Path) -> Result<(), FetchError> {
    let to_io = |e: csv::Error| FetchError::io(path, csv_to_io(e));

    let mut writer = csv::Writer::from_path(path).map_err(to_io)?;
    for record in series.iter() {
        writer.serialize(CsvRow::from(record)).map_err(to_io)?;
    }
    writer.flush().map_err(|e| FetchError::io(path, e))?;
    Ok(())
}

/// Read a table written by [`write_csv`] back into records, in file order.
pub fn load_csv(path: &Path) -> Result<Vec<DailyRecord>, FetchError> {
    let to_io = |e: csv::Error| FetchError::io(path, csv_to_io(e));

    let mut reader = csv::Reader::from_path(path).map_err(to_io)?;
    reader
        .deserialize::<CsvRow>()
        .map(|row| row.map(DailyRecord::from).map_err(to_io))
        .collect()
}

fn csv_to_io(err: csv::Error) -> std::io::Error {
    if err.is_io_error() {
        match err.into_kind() {
            csv::ErrorKind::Io(io) => io,
            other => std::io::Error::other(format!("{other:?}")),
        }
    } else {
        std::io::Error::new(std::io::ErrorKind::InvalidData, err)
    }
}

/// Human-readable summary, as written to the text file.
pub fn summary_text(query: &Query, stats: &SummaryStats) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = writeln!(out, "Weather Summary for {}", query.city);
    let _ = writeln!(
        out,
        "{} to {}",
        query.start_date.format(DATE_FORMAT),
        query.end_date.format(DATE_FORMAT)
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "Average Temp: {:.2}°C", stats.average);
    let _ = writeln!(out, "Max Temp: {:.2}°C", stats.max);
    let _ = writeln!(out, "Min Temp: {:.2}°C", stats.min);
    let _ = writeln!(out, "Std Dev: {:.2}°C", stats.std_dev);
    let _ = writeln!(
        out,
        "Trend: {} ({:+.2}°C/day)",
        stats.trend, stats.trend_slope
    );
    out
}

/// Fixed-width table of the daily series for on-screen display.
pub fn daily_table(series: &WeatherSeries) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<10}  {:>13}  {:>13}  {:>13}",
        "Date", "Max Temp (°C)", "Min Temp (°C)", "Avg Temp (°C)"
    );
    for r in series.iter() {
        let _ = writeln!(
            out,
            "{:<10}  {:>13.2}  {:>13.2}  {:>13.2}",
            r.date.format(DATE_FORMAT),
            r.max_temp,
            r.min_temp,
            r.avg_temp
        );
    }
    out
}

/// Everything shown in the result area after a fetch.
pub fn result_text(query: &Query, series: &WeatherSeries, stats: &SummaryStats) -> String {
    format!(
        "{}\nDaily Data:\n{}",
        summary_text(query, stats),
        daily_table(series)
    )
}
