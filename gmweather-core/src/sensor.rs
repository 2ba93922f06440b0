//! Derived sensors read straight from the current-conditions payload, plus
//! the API usage estimate.

use serde::Serialize;
use serde_json::Value;

use crate::{path::get_path, snapshot::Snapshot};

/// Requests issued per poll cycle (current, daily, hourly).
pub const CALLS_PER_POLL: u32 = 3;

pub const FREE_TIER_MONTHLY_CALLS: u32 = 1000;

const MINUTES_PER_MONTH: u32 = 60 * 24 * 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorKind {
    UvIndex,
    DewPoint,
    HeatIndex,
    WindChill,
    WindGust,
    WindDirection,
    CloudCover,
    ThunderstormProbability,
    PrecipitationProbability,
    PrecipitationAmount,
}

impl SensorKind {
    pub const fn all() -> &'static [SensorKind] {
        &[
            SensorKind::UvIndex,
            SensorKind::DewPoint,
            SensorKind::HeatIndex,
            SensorKind::WindChill,
            SensorKind::WindGust,
            SensorKind::WindDirection,
            SensorKind::CloudCover,
            SensorKind::ThunderstormProbability,
            SensorKind::PrecipitationProbability,
            SensorKind::PrecipitationAmount,
        ]
    }

    pub fn id(&self) -> &'static str {
        match self {
            SensorKind::UvIndex => "uv_index",
            SensorKind::DewPoint => "dew_point",
            SensorKind::HeatIndex => "heat_index",
            SensorKind::WindChill => "wind_chill",
            SensorKind::WindGust => "wind_gust",
            SensorKind::WindDirection => "wind_direction",
            SensorKind::CloudCover => "cloud_cover",
            SensorKind::ThunderstormProbability => "thunderstorm_probability",
            SensorKind::PrecipitationProbability => "precipitation_probability",
            SensorKind::PrecipitationAmount => "precipitation_amount",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SensorKind::UvIndex => "UV Index",
            SensorKind::DewPoint => "Dew Point",
            SensorKind::HeatIndex => "Heat Index",
            SensorKind::WindChill => "Wind Chill",
            SensorKind::WindGust => "Wind Gust",
            SensorKind::WindDirection => "Wind Direction",
            SensorKind::CloudCover => "Cloud Cover",
            SensorKind::ThunderstormProbability => "Thunderstorm Probability",
            SensorKind::PrecipitationProbability => "Precipitation Probability",
            SensorKind::PrecipitationAmount => "Precipitation Amount",
        }
    }

    /// Dotted path into the current-conditions payload.
    pub fn data_path(&self) -> &'static str {
        match self {
            SensorKind::UvIndex => "uvIndex",
            SensorKind::DewPoint => "dewPoint.degrees",
            SensorKind::HeatIndex => "heatIndex.degrees",
            SensorKind::WindChill => "windChill.degrees",
            SensorKind::WindGust => "wind.gust.value",
            SensorKind::WindDirection => "wind.direction.cardinal",
            SensorKind::CloudCover => "cloudCover",
            SensorKind::ThunderstormProbability => "thunderstormProbability",
            SensorKind::PrecipitationProbability => "precipitation.probability.percent",
            SensorKind::PrecipitationAmount => "precipitation.qpf.quantity",
        }
    }

    /// Unit label; metric, as the upstream reports current conditions.
    pub fn unit(&self) -> Option<&'static str> {
        match self {
            SensorKind::DewPoint | SensorKind::HeatIndex | SensorKind::WindChill => Some("°C"),
            SensorKind::WindGust => Some("km/h"),
            SensorKind::CloudCover
            | SensorKind::ThunderstormProbability
            | SensorKind::PrecipitationProbability => Some("%"),
            SensorKind::PrecipitationAmount => Some("mm"),
            SensorKind::UvIndex | SensorKind::WindDirection => None,
        }
    }

    /// Sensor state, `None` when there is no snapshot or any path segment
    /// is missing.
    pub fn value<'a>(&self, snapshot: Option<&'a Snapshot>) -> Option<&'a Value> {
        get_path(&snapshot?.current, self.data_path()).filter(|v| !v.is_null())
    }
}

impl std::fmt::Display for SensorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Projected monthly call volume for a polling interval.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiUsageEstimate {
    pub update_interval_minutes: u32,
    pub estimated_monthly_calls: u32,
    pub free_tier_limit: u32,
    pub usage_percentage: f64,
    pub calls_per_day: f64,
    pub within_free_tier: bool,
}

impl ApiUsageEstimate {
    pub fn for_interval(interval_minutes: u32) -> Self {
        let interval = interval_minutes.max(1);
        let calls = CALLS_PER_POLL * (MINUTES_PER_MONTH / interval);
        let within = calls <= FREE_TIER_MONTHLY_CALLS;
        let percentage = if within {
            f64::from(calls) / f64::from(FREE_TIER_MONTHLY_CALLS) * 100.0
        } else {
            100.0
        };

        Self {
            update_interval_minutes: interval,
            estimated_monthly_calls: calls,
            free_tier_limit: FREE_TIER_MONTHLY_CALLS,
            usage_percentage: round1(percentage),
            calls_per_day: round1(f64::from(calls) / 30.0),
            within_free_tier: within,
        }
    }

    pub fn status(&self) -> &'static str {
        if self.within_free_tier {
            "within free tier"
        } else {
            "exceeds free tier"
        }
    }
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}
