use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    config::{DEFAULT_TIMEZONE, DEFAULT_WEATHER_URL},
    error::FetchError,
    model::{Coordinates, DATE_FORMAT, DailyRecord, WeatherSeries},
};

use super::{WeatherSource, truncate_body};

const SERVICE: &str = "weather";
const DAILY_FIELDS: &str = "temperature_2m_max,temperature_2m_min";

/// Daily temperature history from the Open-Meteo API.
#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    base_url: String,
    timezone: String,
    http: Client,
}

impl OpenMeteoClient {
    pub fn new(http: Client) -> Self {
        Self {
            base_url: DEFAULT_WEATHER_URL.to_string(),
            timezone: DEFAULT_TIMEZONE.to_string(),
            http,
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.to_string();
        self
    }

    pub fn with_timezone(mut self, timezone: &str) -> Self {
        self.timezone = timezone.to_string();
        self
    }
}

/// Absent arrays read as empty, which `to_series` reports as `NoData`.
#[derive(Debug, Deserialize)]
struct OmDaily {
    #[serde(default)]
    time: Vec<NaiveDate>,
    #[serde(default)]
    temperature_2m_max: Vec<Option<f64>>,
    #[serde(default)]
    temperature_2m_min: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct OmResponse {
    daily: Option<OmDaily>,
}

/// Turn the parallel daily arrays into records inside `[start, end]`.
///
/// Days with a missing reading, outside the range, or with max below min
/// are dropped.
fn to_series(
    daily: OmDaily,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<WeatherSeries, FetchError> {
    let OmDaily {
        time,
        temperature_2m_max: maxes,
        temperature_2m_min: mins,
    } = daily;

    if time.len() != maxes.len() || time.len() != mins.len() {
        return Err(FetchError::NoData(format!(
            "daily arrays have mismatched lengths (time={}, max={}, min={})",
            time.len(),
            maxes.len(),
            mins.len()
        )));
    }

    let mut records = Vec::with_capacity(time.len());
    for ((date, max), min) in time.into_iter().zip(maxes).zip(mins) {
        let (Some(max), Some(min)) = (max, min) else {
            tracing::debug!(%date, "skipping day with missing temperature");
            continue;
        };
        if date < start || date > end {
            tracing::warn!(%date, "skipping day outside requested range");
            continue;
        }
        if max < min {
            tracing::warn!(%date, max, min, "skipping day with max below min");
            continue;
        }
        records.push(DailyRecord::new(date, max, min));
    }

    WeatherSeries::from_records(records)
}

#[async_trait]
impl WeatherSource for OpenMeteoClient {
    async fn fetch_daily(
        &self,
        coords: Coordinates,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<WeatherSeries, FetchError> {
        tracing::debug!(%coords, %start, %end, "fetching daily temperatures");

        let res = self
            .http
            .get(&self.base_url)
            .query(&[
                ("latitude", coords.latitude.to_string()),
                ("longitude", coords.longitude.to_string()),
                ("start_date", start.format(DATE_FORMAT).to_string()),
                ("end_date", end.format(DATE_FORMAT).to_string()),
                ("daily", DAILY_FIELDS.to_string()),
                ("timezone", self.timezone.clone()),
            ])
            .send()
            .await
            .map_err(|e| FetchError::unavailable(SERVICE, e.to_string()))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| FetchError::unavailable(SERVICE, e.to_string()))?;

        if !status.is_success() {
            tracing::warn!(%status, "weather service returned an error");
            return Err(FetchError::unavailable(
                SERVICE,
                format!("status {}: {}", status, truncate_body(&body)),
            ));
        }

        let parsed: OmResponse = serde_json::from_str(&body).map_err(|e| {
            FetchError::unavailable(SERVICE, format!("unexpected response body: {e}"))
        })?;

        let daily = parsed
            .daily
            .ok_or_else(|| FetchError::NoData("response has no daily series".to_string()))?;

        let series = to_series(daily, start, end)?;
        tracing::info!(days = series.len(), "fetched daily temperatures");
        Ok(series)
    }
}
