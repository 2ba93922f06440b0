//! Poll results and the read-side view over them.

use std::sync::Arc;

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use serde_json::Value;

use crate::{
    condition::{DEFAULT_CONDITION_CODE, TargetCondition, map_condition_with_daytime},
    model::ForecastEntry,
    normalize::{normalize_daily, normalize_hourly},
    path::{first_f64, get_array, get_bool, get_f64, get_str},
};

/// Raw payloads of one successful poll cycle. Never mutated after creation.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub current: Value,
    pub forecast_daily: Vec<Value>,
    pub forecast_hourly: Vec<Value>,
    pub fetched_at: DateTime<Utc>,
}

impl Snapshot {
    /// Assemble a snapshot from the three resource payloads.
    pub fn from_payloads(current: Value, daily: &Value, hourly: &Value) -> Self {
        Self {
            current,
            forecast_daily: get_array(daily, "forecastDays").to_vec(),
            forecast_hourly: get_array(hourly, "forecastHours").to_vec(),
            fetched_at: Utc::now(),
        }
    }
}

/// Current-condition and forecast accessors over the latest snapshot, if any.
///
/// Every accessor yields `None` when there is no snapshot yet or the field is
/// missing from it. Forecast accessors build fresh rows on every call.
#[derive(Debug, Clone, Default)]
pub struct WeatherReport {
    snapshot: Option<Arc<Snapshot>>,
}

impl WeatherReport {
    pub fn new(snapshot: Option<Arc<Snapshot>>) -> Self {
        Self { snapshot }
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_deref()
    }

    pub fn is_available(&self) -> bool {
        self.snapshot.is_some()
    }

    fn current(&self) -> Option<&Value> {
        self.snapshot.as_deref().map(|s| &s.current)
    }

    fn number(&self, path: &str) -> Option<f64> {
        get_f64(self.current()?, path)
    }

    pub fn condition(&self) -> Option<TargetCondition> {
        let current = self.current()?;
        let code = get_str(current, "weatherCondition.type").unwrap_or(DEFAULT_CONDITION_CODE);
        let is_daytime = get_bool(current, "isDaytime").unwrap_or(true);
        Some(map_condition_with_daytime(code, is_daytime))
    }

    pub fn temperature(&self) -> Option<f64> {
        self.number("temperature.degrees")
    }

    pub fn apparent_temperature(&self) -> Option<f64> {
        self.number("feelsLikeTemperature.degrees")
    }

    pub fn humidity(&self) -> Option<f64> {
        self.number("relativeHumidity")
    }

    /// Mean sea-level pressure in millibars.
    pub fn pressure(&self) -> Option<f64> {
        self.number("airPressure.meanSeaLevelMillibars")
    }

    pub fn wind_speed(&self) -> Option<f64> {
        self.number("wind.speed.value")
    }

    pub fn wind_bearing(&self) -> Option<f64> {
        self.number("wind.direction.degrees")
    }

    pub fn visibility(&self) -> Option<f64> {
        first_f64(self.current()?, &["visibility.distance", "visibility.value"])
    }

    pub fn uv_index(&self) -> Option<f64> {
        self.number("uvIndex")
    }

    pub fn cloud_coverage(&self) -> Option<f64> {
        self.number("cloudCover")
    }

    /// Daily rows from today (in the local zone) onwards.
    pub fn forecast_daily(&self) -> Option<Vec<ForecastEntry>> {
        let now = Local::now();
        self.forecast_daily_at(now.date_naive(), &Local)
    }

    pub fn forecast_daily_at<Tz: TimeZone>(
        &self,
        today: NaiveDate,
        tz: &Tz,
    ) -> Option<Vec<ForecastEntry>> {
        let snapshot = self.snapshot.as_deref()?;
        Some(normalize_daily(&snapshot.forecast_daily, today, tz))
    }

    /// Hourly rows starting now or later.
    pub fn forecast_hourly(&self) -> Option<Vec<ForecastEntry>> {
        self.forecast_hourly_at(Utc::now())
    }

    pub fn forecast_hourly_at(&self, now: DateTime<Utc>) -> Option<Vec<ForecastEntry>> {
        let snapshot = self.snapshot.as_deref()?;
        Some(normalize_hourly(&snapshot.forecast_hourly, now))
    }
}
