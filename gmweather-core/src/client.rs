use std::{
    fmt::Debug,
    future::Future,
    sync::{Mutex, PoisonError},
    time::Duration,
};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Deserializer, Serialize, de::DeserializeOwned};
use serde_json::{Value, json};
use tracing::debug;

use crate::error::TransportError;

pub const API_BASE_URL: &str = "https://weather.googleapis.com/v1";

pub const MAX_FORECAST_DAYS: u32 = 10;
pub const MAX_FORECAST_HOURS: u32 = 240;

/// Upstream page size limit for the hourly resource.
const HOURLY_PAGE_SIZE: u32 = 24;

/// Upper bound on followed continuation tokens; 240 hours fit in 10 pages.
const MAX_PAGES: usize = 64;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// The three upstream resources polled each cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    CurrentConditions,
    DailyForecast,
    HourlyForecast,
}

impl Resource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::CurrentConditions => "current conditions",
            Resource::DailyForecast => "daily forecast",
            Resource::HourlyForecast => "hourly forecast",
        }
    }

    pub fn endpoint(&self) -> &'static str {
        match self {
            Resource::CurrentConditions => "currentConditions:lookup",
            Resource::DailyForecast => "forecast/days:lookup",
            Resource::HourlyForecast => "forecast/hours:lookup",
        }
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UnitsSystem {
    #[default]
    Metric,
    Imperial,
}

impl UnitsSystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitsSystem::Metric => "METRIC",
            UnitsSystem::Imperial => "IMPERIAL",
        }
    }

    pub const fn all() -> &'static [UnitsSystem] {
        &[UnitsSystem::Metric, UnitsSystem::Imperial]
    }
}

impl std::fmt::Display for UnitsSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a client needs to address the upstream service.
#[derive(Clone)]
pub struct ClientSettings {
    pub api_key: String,
    pub latitude: f64,
    pub longitude: f64,
    pub units: UnitsSystem,
    pub base_url: String,
}

impl ClientSettings {
    pub fn new(api_key: impl Into<String>, latitude: f64, longitude: f64, units: UnitsSystem) -> Self {
        Self {
            api_key: api_key.into(),
            latitude,
            longitude,
            units,
            base_url: API_BASE_URL.to_string(),
        }
    }

    fn url(&self, resource: Resource) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), resource.endpoint())
    }

    /// Shared parameters followed by `extra`. Current conditions carry no
    /// unit-system selector.
    fn query(
        &self,
        resource: Resource,
        extra: Vec<(&'static str, String)>,
    ) -> Vec<(&'static str, String)> {
        let mut query = extra;
        query.push(("key", self.api_key.clone()));
        query.push(("location.latitude", self.latitude.to_string()));
        query.push(("location.longitude", self.longitude.to_string()));
        if resource != Resource::CurrentConditions {
            query.push(("unitsSystem", self.units.as_str().to_string()));
        }
        query
    }
}

// Keeps the API key out of debug output.
impl Debug for ClientSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSettings")
            .field("latitude", &self.latitude)
            .field("longitude", &self.longitude)
            .field("units", &self.units)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

fn daily_params(days: u32) -> Vec<(&'static str, String)> {
    let days = days.clamp(1, MAX_FORECAST_DAYS);
    vec![("days", days.to_string()), ("pageSize", days.to_string())]
}

fn hourly_params(hours: u32) -> Vec<(&'static str, String)> {
    let hours = hours.clamp(1, MAX_FORECAST_HOURS);
    vec![
        ("hours", hours.to_string()),
        ("pageSize", HOURLY_PAGE_SIZE.to_string()),
    ]
}

/// Source of raw upstream payloads.
#[async_trait]
pub trait WeatherSource: Send + Sync + Debug {
    async fn fetch_current(&self) -> Result<Value, TransportError>;

    /// Daily forecast; `days` is clamped into `1..=10`.
    async fn fetch_daily(&self, days: u32) -> Result<Value, TransportError>;

    /// Hourly forecast with all pages merged under `forecastHours`; `hours`
    /// is clamped into `1..=240`.
    async fn fetch_hourly(&self, hours: u32) -> Result<Value, TransportError>;

    /// Release held network resources. Must be idempotent.
    fn close(&self) {}
}

/// One page of the hourly resource.
#[derive(Debug, Default, Deserialize)]
pub struct HourlyPage {
    #[serde(rename = "forecastHours", default, deserialize_with = "null_as_empty")]
    pub forecast_hours: Vec<Value>,
    #[serde(rename = "nextPageToken", default)]
    pub next_page_token: Option<String>,
}

fn null_as_empty<'de, D: Deserializer<'de>>(de: D) -> Result<Vec<Value>, D::Error> {
    Ok(Option::<Vec<Value>>::deserialize(de)?.unwrap_or_default())
}

/// Follow continuation tokens until a page carries none, concatenating the
/// pages' entries in arrival order. Each request receives the token of the
/// page before it. A chain longer than `MAX_PAGES` is an error, never a
/// partial result.
pub async fn collect_pages<F, Fut>(mut fetch_page: F) -> Result<Vec<Value>, TransportError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<HourlyPage, TransportError>>,
{
    let mut merged = Vec::new();
    let mut token = None;

    for page_no in 1..=MAX_PAGES {
        let page = fetch_page(token.take()).await?;
        debug!(page = page_no, entries = page.forecast_hours.len(), "received hourly page");
        merged.extend(page.forecast_hours);

        match page.next_page_token.filter(|t| !t.is_empty()) {
            Some(next) => token = Some(next),
            None => return Ok(merged),
        }
    }

    Err(TransportError::Unterminated { pages: MAX_PAGES })
}

/// HTTP client for the Google Maps Weather API.
///
/// Owns one pooled `reqwest::Client` until [`GoogleWeatherClient::close`].
#[derive(Debug)]
pub struct GoogleWeatherClient {
    settings: ClientSettings,
    http: Mutex<Option<Client>>,
}

impl GoogleWeatherClient {
    pub fn new(settings: ClientSettings) -> Result<Self, TransportError> {
        let http = Client::builder()
            .user_agent(concat!("gmweather/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(TransportError::Client)?;

        Ok(Self {
            settings,
            http: Mutex::new(Some(http)),
        })
    }

    pub fn is_closed(&self) -> bool {
        self.http.lock().unwrap_or_else(PoisonError::into_inner).is_none()
    }

    fn http(&self) -> Result<Client, TransportError> {
        self.http
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(TransportError::Closed)
    }

    async fn fetch(
        &self,
        resource: Resource,
        extra: Vec<(&'static str, String)>,
    ) -> Result<Value, TransportError> {
        let http = self.http()?;
        let query = self.settings.query(resource, extra);
        get_json(http, self.settings.url(resource), resource, query).await
    }
}

#[async_trait]
impl WeatherSource for GoogleWeatherClient {
    async fn fetch_current(&self) -> Result<Value, TransportError> {
        self.fetch(Resource::CurrentConditions, Vec::new()).await
    }

    async fn fetch_daily(&self, days: u32) -> Result<Value, TransportError> {
        self.fetch(Resource::DailyForecast, daily_params(days)).await
    }

    async fn fetch_hourly(&self, hours: u32) -> Result<Value, TransportError> {
        let resource = Resource::HourlyForecast;
        let http = self.http()?;
        let url = self.settings.url(resource);
        let query = self.settings.query(resource, hourly_params(hours));

        let entries = collect_pages(|token| {
            let mut query = query.clone();
            if let Some(token) = token {
                query.push(("pageToken", token));
            }
            get_json::<HourlyPage>(http.clone(), url.clone(), resource, query)
        })
        .await?;

        Ok(json!({ "forecastHours": entries }))
    }

    fn close(&self) {
        let released = self.http.lock().unwrap_or_else(PoisonError::into_inner).take();
        if released.is_some() {
            debug!("weather client closed");
        }
    }
}

async fn get_json<T: DeserializeOwned>(
    http: Client,
    url: String,
    resource: Resource,
    query: Vec<(&'static str, String)>,
) -> Result<T, TransportError> {
    debug!(%resource, %url, "requesting");

    // `without_url` keeps the API key out of error text.
    let res = http
        .get(&url)
        .query(&query)
        .send()
        .await
        .map_err(|e| TransportError::Request { resource, source: e.without_url() })?;

    let status = res.status();
    let body = res
        .text()
        .await
        .map_err(|e| TransportError::Request { resource, source: e.without_url() })?;

    if !status.is_success() {
        return Err(TransportError::Status {
            resource,
            status,
            body: truncate_body(&body),
        });
    }

    serde_json::from_str(&body).map_err(|source| TransportError::Decode { resource, source })
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

/// One-shot credential/location check made before a configuration is saved.
/// The client is always closed afterwards.
pub async fn validate_connection(settings: ClientSettings) -> Result<(), TransportError> {
    let client = GoogleWeatherClient::new(settings)?;
    let result = client.fetch_current().await;
    client.close();
    result.map(|_| ())
}
