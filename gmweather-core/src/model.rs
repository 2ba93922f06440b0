use chrono::NaiveDate;
use serde::Serialize;

use crate::condition::TargetCondition;

/// One normalized forecast row.
///
/// Daily rows carry `temperature_high` (always) and `temperature_low`
/// (optional) with a `YYYY-MM-DD` datetime; hourly rows carry `temperature`
/// with the upstream start instant as datetime.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastEntry {
    pub datetime: String,
    pub condition: TargetCondition,
    pub temperature_high: Option<f64>,
    pub temperature_low: Option<f64>,
    pub temperature: Option<f64>,
    pub precipitation_amount: f64,
    pub precipitation_probability: f64,
}

impl ForecastEntry {
    pub fn daily(
        date: NaiveDate,
        condition: TargetCondition,
        high: f64,
        low: Option<f64>,
        precipitation: Precipitation,
    ) -> Self {
        Self {
            datetime: date.format("%Y-%m-%d").to_string(),
            condition,
            temperature_high: Some(high),
            temperature_low: low,
            temperature: None,
            precipitation_amount: precipitation.amount,
            precipitation_probability: precipitation.probability,
        }
    }

    pub fn hourly(
        start_time: String,
        condition: TargetCondition,
        temperature: f64,
        precipitation: Precipitation,
    ) -> Self {
        Self {
            datetime: start_time,
            condition,
            temperature_high: None,
            temperature_low: None,
            temperature: Some(temperature),
            precipitation_amount: precipitation.amount,
            precipitation_probability: precipitation.probability,
        }
    }
}

/// Precipitation figures of a forecast row; both default to zero.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Precipitation {
    pub amount: f64,
    /// Percent, 0-100.
    pub probability: f64,
}
