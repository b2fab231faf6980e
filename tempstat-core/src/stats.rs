//! Descriptive statistics over a daily temperature series.

use crate::model::{SummaryStats, Trend, WeatherSeries};

/// Mean day-over-day change (°C) beyond which a series counts as trending.
pub const TREND_THRESHOLD: f64 = 0.15;

/// Reduce a series to its summary.
///
/// A single-day series has no spread and no day-over-day change, so it
/// reports `std_dev = 0.0` and a `Stable` trend.
pub fn summarize(series: &WeatherSeries) -> SummaryStats {
    let avgs: Vec<f64> = series.iter().map(|r| r.avg_temp).collect();

    let max = series
        .iter()
        .map(|r| r.max_temp)
        .fold(f64::NEG_INFINITY, f64::max);
    let min = series
        .iter()
        .map(|r| r.min_temp)
        .fold(f64::INFINITY, f64::min);

    let trend_slope = trend_slope(&avgs);

    SummaryStats {
        average: mean(&avgs),
        max,
        min,
        std_dev: sample_std_dev(&avgs),
        trend_slope,
        trend: classify_trend(trend_slope),
    }
}

pub fn classify_trend(slope: f64) -> Trend {
    if slope > TREND_THRESHOLD {
        Trend::Increasing
    } else if slope < -TREND_THRESHOLD {
        Trend::Decreasing
    } else {
        Trend::Stable
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn sample_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }

    let m = mean(values);
    let sum_sq: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    (sum_sq / (values.len() - 1) as f64).sqrt()
}

fn trend_slope(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }

    let deltas: Vec<f64> = values.windows(2).map(|w| w[1] - w[0]).collect();
    mean(&deltas)
}
