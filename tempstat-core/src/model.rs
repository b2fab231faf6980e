use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::FetchError;

/// Date format accepted for query input and sent to the weather service.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// Validated user input for one fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub city: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl Query {
    /// Build a query from raw text inputs.
    ///
    /// Dates must be `YYYY-MM-DD`, the city must not be blank and the range
    /// must not be reversed.
    pub fn parse(city: &str, start: &str, end: &str) -> Result<Self, FetchError> {
        let start_date = parse_date(start)?;
        let end_date = parse_date(end)?;

        if start_date > end_date {
            return Err(FetchError::InvalidRange {
                start: start_date,
                end: end_date,
            });
        }

        let city = city.trim();
        if city.is_empty() {
            return Err(FetchError::EmptyCity);
        }

        Ok(Self {
            city: city.to_string(),
            start_date,
            end_date,
        })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        (self.start_date..=self.end_date).contains(&date)
    }
}

fn parse_date(input: &str) -> Result<NaiveDate, FetchError> {
    NaiveDate::parse_from_str(input.trim(), DATE_FORMAT).map_err(|_| FetchError::InvalidDate {
        input: input.to_string(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyRecord {
    pub date: NaiveDate,
    pub max_temp: f64,
    pub min_temp: f64,
    pub avg_temp: f64,
}

impl DailyRecord {
    pub fn new(date: NaiveDate, max_temp: f64, min_temp: f64) -> Self {
        Self {
            date,
            max_temp,
            min_temp,
            avg_temp: (max_temp + min_temp) / 2.0,
        }
    }
}

/// Non-empty daily series, ascending by date with one record per date.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherSeries {
    records: Vec<DailyRecord>,
}

impl WeatherSeries {
    /// Sorts by date and drops repeated dates, keeping the first occurrence.
    pub fn from_records(mut records: Vec<DailyRecord>) -> Result<Self, FetchError> {
        // Stable sort keeps the service order among equal dates.
        records.sort_by_key(|r| r.date);
        records.dedup_by_key(|r| r.date);

        if records.is_empty() {
            return Err(FetchError::NoData(
                "the service returned no usable daily records".to_string(),
            ));
        }

        Ok(Self { records })
    }

    pub fn records(&self) -> &[DailyRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn first_date(&self) -> NaiveDate {
        self.records[0].date
    }

    pub fn last_date(&self) -> NaiveDate {
        self.records[self.records.len() - 1].date
    }

    pub fn iter(&self) -> impl Iterator<Item = &DailyRecord> {
        self.records.iter()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Increasing => "Increasing",
            Trend::Decreasing => "Decreasing",
            Trend::Stable => "Stable",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub average: f64,
    pub max: f64,
    pub min: f64,
    pub std_dev: f64,
    pub trend_slope: f64,
    pub trend: Trend,
}
