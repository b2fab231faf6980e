use crate::{
    Config,
    error::FetchError,
    model::{Coordinates, WeatherSeries},
    provider::{opencage::OpenCageGeocoder, openmeteo::OpenMeteoClient},
};
use anyhow::Context;
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use std::fmt::Debug;

pub mod opencage;
pub mod openmeteo;

const USER_AGENT: &str = concat!("tempstat/", env!("CARGO_PKG_VERSION"));

/// Resolves a free-text place name to coordinates.
#[async_trait]
pub trait Geocoder: Send + Sync + Debug {
    async fn resolve(&self, city: &str) -> Result<Coordinates, FetchError>;
}

/// Retrieves daily max/min temperatures for an inclusive date range.
#[async_trait]
pub trait WeatherSource: Send + Sync + Debug {
    async fn fetch_daily(
        &self,
        coords: Coordinates,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<WeatherSeries, FetchError>;
}

/// Shared HTTP client honouring the configured request timeout.
pub fn http_client(config: &Config) -> anyhow::Result<Client> {
    Client::builder()
        .timeout(config.timeout())
        .user_agent(USER_AGENT)
        .build()
        .context("Failed to build HTTP client")
}

/// Construct the geocoder from config. Fails when no API key is available.
pub fn geocoder_from_config(config: &Config, http: Client) -> anyhow::Result<Box<dyn Geocoder>> {
    let api_key = config.api_key()?;
    Ok(Box::new(
        OpenCageGeocoder::new(api_key, http).with_base_url(&config.geocoder.base_url),
    ))
}

pub fn weather_source_from_config(config: &Config, http: Client) -> Box<dyn WeatherSource> {
    Box::new(
        OpenMeteoClient::new(http)
            .with_base_url(&config.weather.base_url)
            .with_timezone(&config.weather.timezone),
    )
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        format!("{}...", body.chars().take(MAX).collect::<String>())
    } else {
        body.to_string()
    }
}
