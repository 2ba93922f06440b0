//! Raw forecast records to [`ForecastEntry`] rows.
//!
//! Records are handled one at a time: a record with a missing or malformed
//! required field is skipped and logged, its siblings are still produced.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    condition::{DEFAULT_CONDITION_CODE, map_condition, map_condition_with_daytime},
    model::{ForecastEntry, Precipitation},
    path::{first_f64, get_bool, get_f64, get_str},
};

const DAILY_HIGH_PATHS: &[&str] = &[
    "daytimeForecast.temperature.degrees",
    "daytimeForecast.maxTemperature.degrees",
    "maxTemperature.degrees",
];

const DAILY_LOW_PATHS: &[&str] = &[
    "nighttimeForecast.temperature.degrees",
    "nighttimeForecast.minTemperature.degrees",
    "minTemperature.degrees",
];

#[derive(Debug, Error, PartialEq)]
enum Skip {
    #[error("no maximum temperature")]
    NoMaxTemperature,
    #[error("no temperature")]
    NoTemperature,
    #[error("no start time")]
    NoStartTime,
    #[error("unparseable start time {0:?}")]
    BadStartTime(String),
    #[error("already in the past")]
    Stale,
}

/// Normalize daily records, dropping days before `today` (a calendar date
/// in `tz`, the caller's zone).
pub fn normalize_daily<Tz: TimeZone>(
    raw_days: &[Value],
    today: NaiveDate,
    tz: &Tz,
) -> Vec<ForecastEntry> {
    let entries = collect("daily", raw_days, |day| daily_entry(day, today, tz));
    debug!(received = raw_days.len(), emitted = entries.len(), "normalized daily forecast");
    entries
}

/// Normalize hourly records, dropping hours that start before `now`.
pub fn normalize_hourly(raw_hours: &[Value], now: DateTime<Utc>) -> Vec<ForecastEntry> {
    let entries = collect("hourly", raw_hours, |hour| hourly_entry(hour, now));
    debug!(received = raw_hours.len(), emitted = entries.len(), "normalized hourly forecast");
    entries
}

fn collect(
    kind: &str,
    records: &[Value],
    mut convert: impl FnMut(&Value) -> Result<ForecastEntry, Skip>,
) -> Vec<ForecastEntry> {
    records
        .iter()
        .enumerate()
        .filter_map(|(idx, record)| match convert(record) {
            Ok(entry) => Some(entry),
            Err(Skip::Stale) => None,
            Err(reason) => {
                warn!(kind, index = idx, %reason, "skipping forecast record");
                None
            }
        })
        .collect()
}

fn daily_entry<Tz: TimeZone>(
    day: &Value,
    today: NaiveDate,
    tz: &Tz,
) -> Result<ForecastEntry, Skip> {
    let high = first_f64(day, DAILY_HIGH_PATHS).ok_or(Skip::NoMaxTemperature)?;
    let low = first_f64(day, DAILY_LOW_PATHS);

    let code = get_str(day, "daytimeForecast.weatherCondition.type").unwrap_or(DEFAULT_CONDITION_CODE);
    let condition = map_condition(code);

    let precipitation = precipitation(day, "daytimeForecast.precipitation");

    let start = start_time(day)?;
    let date = start.with_timezone(tz).date_naive();
    if date < today {
        return Err(Skip::Stale);
    }

    Ok(ForecastEntry::daily(date, condition, high, low, precipitation))
}

fn hourly_entry(hour: &Value, now: DateTime<Utc>) -> Result<ForecastEntry, Skip> {
    let temperature = get_f64(hour, "temperature.degrees").ok_or(Skip::NoTemperature)?;

    let raw_start = get_str(hour, "interval.startTime").ok_or(Skip::NoStartTime)?;
    let start = parse_instant(raw_start)?;
    if start < now {
        return Err(Skip::Stale);
    }

    let code = get_str(hour, "weatherCondition.type").unwrap_or(DEFAULT_CONDITION_CODE);
    let is_daytime = get_bool(hour, "isDaytime").unwrap_or(true);
    let condition = map_condition_with_daytime(code, is_daytime);

    Ok(ForecastEntry::hourly(
        raw_start.to_string(),
        condition,
        temperature,
        precipitation(hour, "precipitation"),
    ))
}

fn precipitation(record: &Value, prefix: &str) -> Precipitation {
    Precipitation {
        amount: get_f64(record, &format!("{prefix}.qpf.quantity")).unwrap_or(0.0),
        probability: get_f64(record, &format!("{prefix}.probability.percent")).unwrap_or(0.0),
    }
}

fn start_time(record: &Value) -> Result<DateTime<Utc>, Skip> {
    let raw = get_str(record, "interval.startTime").ok_or(Skip::NoStartTime)?;
    parse_instant(raw)
}

fn parse_instant(raw: &str) -> Result<DateTime<Utc>, Skip> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| Skip::BadStartTime(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::TargetCondition;
    use chrono::FixedOffset;
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 10).unwrap()
    }

    fn now() -> DateTime<Utc> {
        "2025-06-10T12:00:00Z".parse().unwrap()
    }

    fn day(start: &str) -> Value {
        json!({
            "interval": {"startTime": start},
            "daytimeForecast": {"temperature": {"degrees": 20}}
        })
    }

    fn hour(start: &str, degrees: f64) -> Value {
        json!({
            "interval": {"startTime": start},
            "temperature": {"degrees": degrees}
        })
    }

    #[test]
    fn daily_high_without_nighttime() {
        let entries = normalize_daily(&[day("2025-06-10T00:00:00Z")], today(), &Utc);

        assert_eq!(entries.len(), 1);
        let e = &entries[0];
        assert_eq!(e.datetime, "2025-06-10");
        assert_eq!(e.temperature_high, Some(20.0));
        assert_eq!(e.temperature_low, None);
        assert_eq!(e.temperature, None);
        assert_eq!(e.condition, TargetCondition::Sunny);
        assert_eq!(e.precipitation_amount, 0.0);
        assert_eq!(e.precipitation_probability, 0.0);
    }

    #[test]
    fn daily_without_any_max_temperature_is_dropped() {
        let raw = vec![
            json!({
                "interval": {"startTime": "2025-06-10T00:00:00Z"},
                "nighttimeForecast": {"temperature": {"degrees": 9}},
                "minTemperature": {"degrees": 8}
            }),
            day("2025-06-11T00:00:00Z"),
        ];

        let entries = normalize_daily(&raw, today(), &Utc);

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].datetime, "2025-06-11");
    }

    #[test]
    fn daily_temperature_fallback_chain() {
        let raw = vec![
            json!({
                "interval": {"startTime": "2025-06-10T00:00:00Z"},
                "daytimeForecast": {"maxTemperature": {"degrees": 25.5}},
                "nighttimeForecast": {"minTemperature": {"degrees": 12.0}}
            }),
            json!({
                "interval": {"startTime": "2025-06-11T00:00:00Z"},
                "maxTemperature": {"degrees": 27.0},
                "minTemperature": {"degrees": 14.0}
            }),
            json!({
                "interval": {"startTime": "2025-06-12T00:00:00Z"},
                "daytimeForecast": {"temperature": {"degrees": 30.0}, "maxTemperature": {"degrees": 99.0}},
                "maxTemperature": {"degrees": 98.0},
                "nighttimeForecast": {"temperature": {"degrees": 16.0}},
                "minTemperature": {"degrees": -50.0}
            }),
        ];

        let entries = normalize_daily(&raw, today(), &Utc);

        let temps: Vec<_> = entries
            .iter()
            .map(|e| (e.temperature_high, e.temperature_low))
            .collect();
        assert_eq!(
            temps,
            vec![
                (Some(25.5), Some(12.0)),
                (Some(27.0), Some(14.0)),
                (Some(30.0), Some(16.0)),
            ]
        );
    }

    #[test]
    fn daily_condition_and_precipitation_from_daytime() {
        let raw = vec![json!({
            "interval": {"startTime": "2025-06-10T00:00:00Z"},
            "daytimeForecast": {
                "temperature": {"degrees": 18},
                "weatherCondition": {"type": "HEAVY_RAIN"},
                "precipitation": {"qpf": {"quantity": 12.4}, "probability": {"percent": 80}}
            },
            "nighttimeForecast": {"weatherCondition": {"type": "CLEAR"}}
        })];

        let entries = normalize_daily(&raw, today(), &Utc);

        assert_eq!(entries[0].condition, TargetCondition::Pouring);
        assert_eq!(entries[0].precipitation_amount, 12.4);
        assert_eq!(entries[0].precipitation_probability, 80.0);
    }

    #[test]
    fn daily_clear_is_never_clear_night() {
        let mut raw = day("2025-06-10T00:00:00Z");
        raw["daytimeForecast"]["weatherCondition"] = json!({"type": "CLEAR"});
        raw["isDaytime"] = json!(false);

        let entries = normalize_daily(&[raw], today(), &Utc);

        assert_eq!(entries[0].condition, TargetCondition::Sunny);
    }

    #[test]
    fn daily_date_filter_in_utc() {
        let raw = vec![day("2025-06-09T23:00:00Z"), day("2025-06-10T00:00:00Z")];

        let entries = normalize_daily(&raw, today(), &Utc);

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].datetime, "2025-06-10");
    }

    #[test]
    fn daily_date_uses_callers_zone() {
        let madrid = FixedOffset::east_opt(2 * 3600).unwrap();
        let raw = vec![day("2025-06-09T23:00:00Z")];

        let entries = normalize_daily(&raw, today(), &madrid);

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].datetime, "2025-06-10");
    }

    #[test]
    fn daily_missing_or_bad_start_time_is_isolated() {
        let raw = vec![
            json!({"daytimeForecast": {"temperature": {"degrees": 20}}}),
            day("not a time"),
            json!(42),
            json!({"daytimeForecast": "oops", "interval": []}),
            day("2025-06-12T00:00:00Z"),
        ];

        let entries = normalize_daily(&raw, today(), &Utc);

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].datetime, "2025-06-12");
    }

    #[test]
    fn daily_preserves_input_order() {
        let raw = vec![
            day("2025-06-12T00:00:00Z"),
            day("2025-06-10T00:00:00Z"),
            day("2025-06-11T00:00:00Z"),
        ];

        let dates: Vec<_> = normalize_daily(&raw, today(), &Utc)
            .into_iter()
            .map(|e| e.datetime)
            .collect();

        assert_eq!(dates, ["2025-06-12", "2025-06-10", "2025-06-11"]);
    }

    #[test]
    fn hourly_time_filter() {
        let raw = vec![
            hour("2025-06-10T11:00:00Z", 21.0),
            hour("2025-06-10T13:00:00Z", 23.0),
        ];

        let entries = normalize_hourly(&raw, now());

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].datetime, "2025-06-10T13:00:00Z");
        assert_eq!(entries[0].temperature, Some(23.0));
        assert_eq!(entries[0].temperature_high, None);
    }

    #[test]
    fn hourly_keeps_entry_starting_exactly_now() {
        let entries = normalize_hourly(&[hour("2025-06-10T12:00:00Z", 22.0)], now());
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn hourly_compares_offsets_as_instants() {
        // 13:30+02:00 is 11:30Z, before now.
        let raw = vec![
            hour("2025-06-10T13:30:00+02:00", 20.0),
            hour("2025-06-10T15:00:00+02:00", 21.0),
        ];

        let entries = normalize_hourly(&raw, now());

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].datetime, "2025-06-10T15:00:00+02:00");
    }

    #[test]
    fn hourly_night_override_and_precipitation() {
        let raw = vec![
            json!({
                "interval": {"startTime": "2025-06-10T22:00:00Z"},
                "temperature": {"degrees": 15},
                "isDaytime": false,
                "weatherCondition": {"type": "MOSTLY_CLEAR"},
                "precipitation": {"qpf": {"quantity": 0.2}, "probability": {"percent": 10}}
            }),
            json!({
                "interval": {"startTime": "2025-06-10T23:00:00Z"},
                "temperature": {"degrees": 14},
                "isDaytime": false,
                "weatherCondition": {"type": "RAIN"}
            }),
            json!({
                "interval": {"startTime": "2025-06-11T10:00:00Z"},
                "temperature": {"degrees": 19},
                "isDaytime": true,
                "weatherCondition": {"type": "CLEAR"}
            }),
        ];

        let entries = normalize_hourly(&raw, now());

        let conditions: Vec<_> = entries.iter().map(|e| e.condition).collect();
        assert_eq!(
            conditions,
            vec![TargetCondition::ClearNight, TargetCondition::Rainy, TargetCondition::Sunny]
        );
        assert_eq!(entries[0].precipitation_amount, 0.2);
        assert_eq!(entries[0].precipitation_probability, 10.0);
        assert_eq!(entries[1].precipitation_amount, 0.0);
    }

    #[test]
    fn hourly_requires_temperature_and_start_time() {
        let raw = vec![
            json!({"interval": {"startTime": "2025-06-10T13:00:00Z"}}),
            json!({"temperature": {"degrees": 20}}),
            json!({"interval": {"startTime": "2025-06-10T13:00:00Z"}, "temperature": {"degrees": "warm"}}),
            hour("2025-06-10T14:00:00Z", 20.0),
        ];

        let entries = normalize_hourly(&raw, now());

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].datetime, "2025-06-10T14:00:00Z");
    }

    #[test]
    fn empty_input_gives_empty_output() {
        assert!(normalize_daily(&[], today(), &Utc).is_empty());
        assert!(normalize_hourly(&[], now()).is_empty());
    }
}
