use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};

/// Environment variable that overrides the stored geocoding API key.
pub const API_KEY_ENV: &str = "OPENCAGE_API_KEY";

pub const DEFAULT_GEOCODER_URL: &str = "https://api.opencagedata.com/geocode/v1/json";
pub const DEFAULT_WEATHER_URL: &str = "https://api.open-meteo.com/v1/forecast";
pub const DEFAULT_TIMEZONE: &str = "Asia/Kolkata";
pub const DEFAULT_CSV_PATH: &str = "weather_data_summary.csv";
pub const DEFAULT_SUMMARY_PATH: &str = "weather_summary.txt";
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocoderConfig {
    pub api_key: Option<String>,
    pub base_url: String,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_GEOCODER_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    pub base_url: String,
    /// Timezone the service reports daily aggregates in.
    pub timezone: String,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_WEATHER_URL.to_string(),
            timezone: DEFAULT_TIMEZONE.to_string(),
        }
    }
}

/// Fixed output locations, overwritten on every fetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub csv_path: PathBuf,
    pub summary_path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            csv_path: PathBuf::from(DEFAULT_CSV_PATH),
            summary_path: PathBuf::from(DEFAULT_SUMMARY_PATH),
        }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// timeout_secs = 20
///
/// [geocoder]
/// api_key = "..."
///
/// [weather]
/// timezone = "Europe/Paris"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub timeout_secs: u64,
    pub geocoder: GeocoderConfig,
    pub weather: WeatherConfig,
    pub output: OutputConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            geocoder: GeocoderConfig::default(),
            weather: WeatherConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Config {
    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(path)
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "tempstat", "tempstat")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.geocoder.api_key = Some(api_key);
    }

    /// Geocoding API key, taken from the environment before the config file.
    pub fn api_key(&self) -> Result<String> {
        self.resolve_api_key(std::env::var(API_KEY_ENV).ok())
    }

    pub(crate) fn resolve_api_key(&self, from_env: Option<String>) -> Result<String> {
        from_env
            .filter(|key| !key.trim().is_empty())
            .or_else(|| {
                self.geocoder
                    .api_key
                    .clone()
                    .filter(|key| !key.trim().is_empty())
            })
            .ok_or_else(|| {
                anyhow!(
                    "No geocoding API key configured.\n\
                     Hint: set {API_KEY_ENV} or run `tempstat configure` and enter your OpenCage key."
                )
            })
    }

    /// Request timeout. Zero would fail every request, so it falls back to
    /// the default.
    pub fn timeout(&self) -> Duration {
        if self.timeout_secs == 0 {
            tracing::warn!(
                default = DEFAULT_TIMEOUT_SECS,
                "timeout_secs = 0 is not usable, using the default"
            );
            return Duration::from_secs(DEFAULT_TIMEOUT_SECS);
        }
        Duration::from_secs(self.timeout_secs)
    }
}
