use anyhow::{Context, Result, anyhow, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};

use crate::{
    client::{ClientSettings, MAX_FORECAST_DAYS, UnitsSystem},
    coordinator::PollSettings,
    sensor::ApiUsageEstimate,
};

pub const DEFAULT_UPDATE_INTERVAL: u32 = 60;
pub const DEFAULT_HOURLY_FORECAST_HOURS: u32 = 48;

/// Allowed polling intervals in minutes.
pub const UPDATE_INTERVALS: &[u32] = &[30, 45, 60, 90, 120, 180];

/// Allowed hourly forecast horizons, with a short description each.
pub const HOURLY_FORECAST_OPTIONS: &[(u32, &str)] = &[
    (24, "1 day"),
    (48, "2 days (recommended)"),
    (72, "3 days"),
    (120, "5 days"),
    (240, "10 days (maximum)"),
];

/// Human-readable description of a polling interval and its monthly cost.
pub fn describe_interval(minutes: u32) -> String {
    let usage = ApiUsageEstimate::for_interval(minutes);
    let label = if minutes % 60 == 0 {
        format!("{} h", minutes / 60)
    } else {
        format!("{minutes} min")
    };
    format!("{label} (~{} calls/month, {})", usage.estimated_monthly_calls, usage.status())
}

/// Location, credentials and polling options, stored as TOML.
///
/// Example TOML:
/// api_key = "..."
/// latitude = 40.4168
/// longitude = -3.7038
/// units = "METRIC"
/// update_interval = 60
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_key: String,
    pub latitude: f64,
    pub longitude: f64,
    pub units: UnitsSystem,
    /// Minutes between polls.
    pub update_interval: u32,
    pub hourly_forecast_hours: u32,
    pub forecast_days: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            latitude: 0.0,
            longitude: 0.0,
            units: UnitsSystem::default(),
            update_interval: DEFAULT_UPDATE_INTERVAL,
            hourly_forecast_hours: DEFAULT_HOURLY_FORECAST_HOURS,
            forecast_days: MAX_FORECAST_DAYS,
        }
    }
}

impl Config {
    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    /// Identity of the configured location.
    pub fn location_id(&self) -> String {
        format!("{}_{}", self.latitude, self.longitude)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.is_configured() {
            bail!(
                "No API key configured.\n\
                 Hint: run `gmweather configure` and enter your API key."
            );
        }
        if !(-90.0..=90.0).contains(&self.latitude) {
            bail!("Latitude {} is out of range [-90, 90]", self.latitude);
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            bail!("Longitude {} is out of range [-180, 180]", self.longitude);
        }
        if !UPDATE_INTERVALS.contains(&self.update_interval) {
            bail!(
                "Unsupported update interval {} min. Supported: {:?}",
                self.update_interval,
                UPDATE_INTERVALS
            );
        }
        if !HOURLY_FORECAST_OPTIONS.iter().any(|(h, _)| *h == self.hourly_forecast_hours) {
            bail!(
                "Unsupported hourly forecast length {} h. Supported: {:?}",
                self.hourly_forecast_hours,
                HOURLY_FORECAST_OPTIONS.iter().map(|(h, _)| *h).collect::<Vec<_>>()
            );
        }
        if !(1..=MAX_FORECAST_DAYS).contains(&self.forecast_days) {
            bail!("Forecast days must be between 1 and {MAX_FORECAST_DAYS}");
        }
        Ok(())
    }

    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings::new(self.api_key.clone(), self.latitude, self.longitude, self.units)
    }

    pub fn poll_settings(&self) -> PollSettings {
        PollSettings {
            update_interval: Duration::from_secs(u64::from(self.update_interval) * 60),
            forecast_days: self.forecast_days,
            hourly_hours: self.hourly_forecast_hours,
        }
    }

    pub fn api_usage(&self) -> ApiUsageEstimate {
        ApiUsageEstimate::for_interval(self.update_interval)
    }

    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            // First run: no config file, return defaults.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Load and validate; the entry point for commands that poll.
    pub fn load_validated() -> Result<Self> {
        let cfg = Self::load()?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("Invalid configuration TOML")
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
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

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "gmweather", "gmweather")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}
