use std::{fmt, sync::Arc};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use gmweather_core::{
    ApiUsageEstimate, Config, Coordinator, GoogleWeatherClient, UnitsSystem, WeatherSource,
    config::{HOURLY_FORECAST_OPTIONS, UPDATE_INTERVALS, describe_interval},
    validate_connection,
};
use inquire::{CustomType, CustomUserError, Password, Select, validator::Validation};
use tracing::{info, warn};

use crate::output;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "gmweather", version, about = "Google Maps Weather CLI")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure API key, location and polling options.
    Configure,

    /// Fetch once and show current conditions and forecasts.
    Show {
        /// Number of hourly rows to print.
        #[arg(long, default_value_t = 12)]
        hourly: usize,

        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Keep polling on the configured interval until Ctrl-C.
    Watch,

    /// Estimate monthly API calls for a polling interval.
    Usage {
        /// Interval in minutes; defaults to the configured one.
        #[arg(long)]
        interval: Option<u32>,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Configure => configure().await,
            Command::Show { hourly, json } => show(hourly, json).await,
            Command::Watch => watch().await,
            Command::Usage { interval } => usage(interval),
        }
    }
}

struct IntervalChoice(u32);

impl fmt::Display for IntervalChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&describe_interval(self.0))
    }
}

struct HoursChoice(u32, &'static str);

impl fmt::Display for HoursChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} h - {}", self.0, self.1)
    }
}

fn starting_cursor<T>(options: &[T], is_current: impl Fn(&T) -> bool) -> usize {
    options.iter().position(is_current).unwrap_or(0)
}

async fn configure() -> Result<()> {
    let mut cfg = Config::load()?;

    let api_key = Password::new("Google Maps Platform API key:")
        .without_confirmation()
        .prompt()
        .context("API key prompt aborted")?;

    let latitude = CustomType::<f64>::new("Latitude:")
        .with_default(cfg.latitude)
        .with_validator(|v: &f64| -> Result<Validation, CustomUserError> {
            Ok(if (-90.0..=90.0).contains(v) {
                Validation::Valid
            } else {
                Validation::Invalid("must be within [-90, 90]".into())
            })
        })
        .prompt()
        .context("Latitude prompt aborted")?;

    let longitude = CustomType::<f64>::new("Longitude:")
        .with_default(cfg.longitude)
        .with_validator(|v: &f64| -> Result<Validation, CustomUserError> {
            Ok(if (-180.0..=180.0).contains(v) {
                Validation::Valid
            } else {
                Validation::Invalid("must be within [-180, 180]".into())
            })
        })
        .prompt()
        .context("Longitude prompt aborted")?;

    let units_options = UnitsSystem::all().to_vec();
    let units_cursor = starting_cursor(&units_options, |u| *u == cfg.units);
    let units = Select::new("Units:", units_options)
        .with_starting_cursor(units_cursor)
        .prompt()
        .context("Units prompt aborted")?;

    let interval_options: Vec<_> = UPDATE_INTERVALS.iter().copied().map(IntervalChoice).collect();
    let interval_cursor = starting_cursor(&interval_options, |c| c.0 == cfg.update_interval);
    let interval = Select::new("Update interval:", interval_options)
        .with_starting_cursor(interval_cursor)
        .prompt()
        .context("Interval prompt aborted")?;

    let hours_options: Vec<_> = HOURLY_FORECAST_OPTIONS
        .iter()
        .map(|(h, desc)| HoursChoice(*h, *desc))
        .collect();
    let hours_cursor = starting_cursor(&hours_options, |c| c.0 == cfg.hourly_forecast_hours);
    let hours = Select::new("Hourly forecast length:", hours_options)
        .with_starting_cursor(hours_cursor)
        .prompt()
        .context("Hourly forecast prompt aborted")?;

    cfg.api_key = api_key.trim().to_string();
    cfg.latitude = latitude;
    cfg.longitude = longitude;
    cfg.units = units;
    cfg.update_interval = interval.0;
    cfg.hourly_forecast_hours = hours.0;
    cfg.validate()?;

    println!("Checking connection...");
    if let Err(err) = validate_connection(cfg.client_settings()).await {
        bail!("Cannot connect to Google Maps Weather: {err}");
    }

    cfg.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());

    let usage = cfg.api_usage();
    if !usage.within_free_tier {
        warn!(
            monthly_calls = usage.estimated_monthly_calls,
            "configured interval exceeds the free tier"
        );
    }
    output::print_usage(&usage);
    Ok(())
}

fn build_coordinator(cfg: &Config) -> Result<Coordinator> {
    let client = GoogleWeatherClient::new(cfg.client_settings())
        .context("Failed to create weather client")?;
    let source: Arc<dyn WeatherSource> = Arc::new(client);
    Ok(Coordinator::new(source, cfg.poll_settings()))
}

async fn show(hourly: usize, json: bool) -> Result<()> {
    let cfg = Config::load_validated()?;
    let coordinator = build_coordinator(&cfg)?;

    let refreshed = coordinator.first_refresh().await;
    coordinator.shutdown();
    refreshed.context("Initial weather update failed")?;

    let report = coordinator.report();
    if json {
        let doc = output::report_json(&report, &cfg.api_usage());
        println!("{}", serde_json::to_string_pretty(&doc)?);
    } else {
        output::print_report(&report, cfg.units, hourly);
    }
    Ok(())
}

async fn watch() -> Result<()> {
    let cfg = Config::load_validated()?;
    let coordinator = Arc::new(build_coordinator(&cfg)?);

    if let Err(err) = coordinator.first_refresh().await {
        coordinator.shutdown();
        return Err(err).context("Initial weather update failed");
    }
    output::print_summary(&coordinator.report(), cfg.units);

    let mut updates = coordinator.subscribe();

    let poller = {
        let coordinator = Arc::clone(&coordinator);
        tokio::spawn(async move { coordinator.run().await })
    };
    info!(location = %cfg.location_id(), interval_minutes = cfg.update_interval, "watching");

    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal.context("Failed to listen for Ctrl-C")?;
                break;
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                output::print_summary(&coordinator.report(), cfg.units);
            }
        }
    }

    coordinator.shutdown();
    poller.await.context("Polling task failed")?;
    Ok(())
}

fn usage(interval: Option<u32>) -> Result<()> {
    let interval = match interval {
        Some(minutes) if minutes > 0 => minutes,
        Some(_) => bail!("Interval must be at least one minute"),
        None => Config::load()?.update_interval,
    };

    output::print_usage(&ApiUsageEstimate::for_interval(interval));
    println!();
    println!("Available intervals:");
    for minutes in UPDATE_INTERVALS {
        println!("  • {}", describe_interval(*minutes));
    }
    Ok(())
}
