//! Core library for the `gmweather` adapter.
//!
//! This crate defines:
//! - An HTTP client for the Google Maps Weather API (current conditions,
//!   daily and paginated hourly forecasts)
//! - Mapping of upstream condition codes to a fixed condition vocabulary
//! - Normalization of raw forecast records into [`ForecastEntry`] rows
//! - A polling [`Coordinator`] that publishes whole snapshots atomically
//! - Current-condition accessors, derived sensors and an API usage estimate
//! - Configuration handling
//!
//! It is used by `gmweather-cli`, but can also be embedded in other hosts.

pub mod client;
pub mod condition;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod model;
pub mod normalize;
pub mod path;
pub mod sensor;
pub mod snapshot;

pub use client::{ClientSettings, GoogleWeatherClient, UnitsSystem, WeatherSource, validate_connection};
pub use condition::{TargetCondition, map_condition, map_condition_with_daytime};
pub use config::Config;
pub use coordinator::{Coordinator, PollSettings};
pub use error::{TransportError, UpdateFailed};
pub use model::ForecastEntry;
pub use normalize::{normalize_daily, normalize_hourly};
pub use sensor::{ApiUsageEstimate, SensorKind};
pub use snapshot::{Snapshot, WeatherReport};
