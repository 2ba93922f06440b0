//! Human-friendly and JSON rendering of a weather report.

use gmweather_core::{ApiUsageEstimate, ForecastEntry, SensorKind, UnitsSystem, WeatherReport};
use serde_json::{Map, Value, json};

fn fmt_opt(value: Option<f64>, unit: &str) -> String {
    match value {
        Some(v) => format!("{v:.1}{unit}"),
        None => "n/a".to_string(),
    }
}

fn forecast_units(units: UnitsSystem) -> (&'static str, &'static str) {
    match units {
        UnitsSystem::Metric => ("°C", " mm"),
        UnitsSystem::Imperial => ("°F", " in"),
    }
}

/// One line, printed on every new snapshot while watching.
pub fn print_summary(report: &WeatherReport, units: UnitsSystem) {
    let Some(snapshot) = report.snapshot() else {
        println!("No weather data yet.");
        return;
    };
    let condition = report.condition().map(|c| c.to_string()).unwrap_or_else(|| "n/a".into());
    let next_hour = report
        .forecast_hourly()
        .and_then(|rows| rows.into_iter().next())
        .map(|row| {
            let (temp_unit, _) = forecast_units(units);
            format!(", next hour {} {}", fmt_opt(row.temperature, temp_unit), row.condition)
        })
        .unwrap_or_default();

    println!(
        "[{}] {} {}{}",
        snapshot.fetched_at.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M"),
        fmt_opt(report.temperature(), "°C"),
        condition,
        next_hour,
    );
}

pub fn print_report(report: &WeatherReport, units: UnitsSystem, hourly_rows: usize) {
    println!("Current conditions");
    println!(
        "  Condition:      {}",
        report.condition().map(|c| c.to_string()).unwrap_or_else(|| "n/a".into())
    );
    println!("  Temperature:    {}", fmt_opt(report.temperature(), "°C"));
    println!("  Feels like:     {}", fmt_opt(report.apparent_temperature(), "°C"));
    println!("  Humidity:       {}", fmt_opt(report.humidity(), "%"));
    println!("  Pressure:       {}", fmt_opt(report.pressure(), " mbar"));
    println!("  Wind:           {} @ {}", fmt_opt(report.wind_speed(), " km/h"), fmt_opt(report.wind_bearing(), "°"));
    println!("  Visibility:     {}", fmt_opt(report.visibility(), " km"));
    println!("  UV index:       {}", fmt_opt(report.uv_index(), ""));
    println!("  Cloud cover:    {}", fmt_opt(report.cloud_coverage(), "%"));

    println!();
    println!("Sensors");
    for kind in SensorKind::all() {
        let value = match kind.value(report.snapshot()) {
            Some(Value::String(s)) => s.clone(),
            Some(v) => format!("{v}{}", kind.unit().map(|u| format!(" {u}")).unwrap_or_default()),
            None => "n/a".to_string(),
        };
        println!("  {:<26} {value}", format!("{}:", kind.name()));
    }

    let (temp_unit, precip_unit) = forecast_units(units);

    println!();
    println!("Daily forecast");
    for row in report.forecast_daily().unwrap_or_default() {
        println!(
            "  {}  {:<15} high {:>8}  low {:>8}  precip {} ({:.0}%)",
            row.datetime,
            row.condition.as_str(),
            fmt_opt(row.temperature_high, temp_unit),
            fmt_opt(row.temperature_low, temp_unit),
            fmt_opt(Some(row.precipitation_amount), precip_unit),
            row.precipitation_probability,
        );
    }

    println!();
    println!("Hourly forecast");
    for row in report.forecast_hourly().unwrap_or_default().into_iter().take(hourly_rows) {
        println!(
            "  {}  {:<15} {:>8}  precip {} ({:.0}%)",
            row.datetime,
            row.condition.as_str(),
            fmt_opt(row.temperature, temp_unit),
            fmt_opt(Some(row.precipitation_amount), precip_unit),
            row.precipitation_probability,
        );
    }
}

pub fn print_usage(usage: &ApiUsageEstimate) {
    println!("API usage estimate");
    println!("  Update interval:  {} min", usage.update_interval_minutes);
    println!("  Calls per month:  {}", usage.estimated_monthly_calls);
    println!("  Calls per day:    {:.1}", usage.calls_per_day);
    println!(
        "  Free tier:        {} calls/month ({:.1}% used, {})",
        usage.free_tier_limit,
        usage.usage_percentage,
        usage.status()
    );
}

pub fn report_json(report: &WeatherReport, usage: &ApiUsageEstimate) -> Value {
    let sensors: Map<String, Value> = SensorKind::all()
        .iter()
        .map(|kind| {
            let value = kind.value(report.snapshot()).cloned().unwrap_or(Value::Null);
            (kind.id().to_string(), value)
        })
        .collect();

    let daily: Vec<ForecastEntry> = report.forecast_daily().unwrap_or_default();
    let hourly: Vec<ForecastEntry> = report.forecast_hourly().unwrap_or_default();

    json!({
        "current": {
            "condition": report.condition(),
            "temperature": report.temperature(),
            "apparent_temperature": report.apparent_temperature(),
            "humidity": report.humidity(),
            "pressure": report.pressure(),
            "wind_speed": report.wind_speed(),
            "wind_bearing": report.wind_bearing(),
            "visibility": report.visibility(),
            "uv_index": report.uv_index(),
            "cloud_coverage": report.cloud_coverage(),
        },
        "sensors": sensors,
        "forecast_daily": daily,
        "forecast_hourly": hourly,
        "api_usage": usage,
        "fetched_at": report.snapshot().map(|s| s.fetched_at.to_rfc3339()),
    })
}
