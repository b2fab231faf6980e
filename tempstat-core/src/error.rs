use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

/// Coarse classification of a failed fetch, as reported to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidDate,
    InvalidCity,
    LocationNotFound,
    ServiceUnavailable,
    NoData,
    IoError,
    RenderFailed,
    NoChart,
}

impl ErrorKind {
    /// Short title suitable for a message box heading.
    pub fn title(&self) -> &'static str {
        match self {
            ErrorKind::InvalidDate => "Invalid Date",
            ErrorKind::InvalidCity => "Invalid City",
            ErrorKind::LocationNotFound => "Location Error",
            ErrorKind::ServiceUnavailable => "API Error",
            ErrorKind::NoData => "Data Error",
            ErrorKind::IoError => "File Error",
            ErrorKind::RenderFailed => "Chart Error",
            ErrorKind::NoChart => "No Chart",
        }
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid date '{input}': use YYYY-MM-DD format")]
    InvalidDate { input: String },

    #[error("start date {start} is after end date {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("city name must not be empty")]
    EmptyCity,

    #[error("could not find the city '{city}'")]
    LocationNotFound { city: String },

    #[error("{service} request failed: {reason}")]
    ServiceUnavailable {
        service: &'static str,
        reason: String,
    },

    #[error("no weather data available: {0}")]
    NoData(String),

    #[error("failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to draw chart: {0}")]
    RenderFailed(String),

    #[error("no chart yet: fetch weather data first")]
    NoChart,
}

impl FetchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FetchError::InvalidDate { .. } | FetchError::InvalidRange { .. } => {
                ErrorKind::InvalidDate
            }
            FetchError::EmptyCity => ErrorKind::InvalidCity,
            FetchError::LocationNotFound { .. } => ErrorKind::LocationNotFound,
            FetchError::ServiceUnavailable { .. } => ErrorKind::ServiceUnavailable,
            FetchError::NoData(_) => ErrorKind::NoData,
            FetchError::Io { .. } => ErrorKind::IoError,
            FetchError::RenderFailed(_) => ErrorKind::RenderFailed,
            FetchError::NoChart => ErrorKind::NoChart,
        }
    }

    pub(crate) fn unavailable(service: &'static str, reason: impl Into<String>) -> Self {
        FetchError::ServiceUnavailable {
            service,
            reason: reason.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        FetchError::Io {
            path: path.into(),
            source,
        }
    }
}
