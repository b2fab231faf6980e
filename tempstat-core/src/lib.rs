//! Core library for the `tempstat` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Geocoding and daily weather clients behind small traits
//! - Summary statistics and trend classification
//! - CSV/text export and chart rendering
//! - The controller that runs one fetch end to end
//!
//! It is used by `tempstat-cli`, but any other front-end can drive a
//! [`Controller`] the same way.

pub mod chart;
pub mod config;
pub mod controller;
pub mod error;
pub mod model;
pub mod provider;
pub mod report;
pub mod stats;

pub use chart::{Chart, ChartRenderer, PlottersRenderer};
pub use config::Config;
pub use controller::{Controller, FetchOutcome, Phase};
pub use error::{ErrorKind, FetchError};
pub use model::{Coordinates, DailyRecord, Query, SummaryStats, Trend, WeatherSeries};
pub use provider::{Geocoder, WeatherSource};
pub use report::{ExportedFiles, ReportExporter};
pub use stats::summarize;
