use thiserror::Error;

use crate::client::Resource;

/// Failure of a single resource fetch.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("{resource} request failed: {source}")]
    Request {
        resource: Resource,
        #[source]
        source: reqwest::Error,
    },

    #[error("{resource} request failed with status {status}: {body}")]
    Status {
        resource: Resource,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("failed to parse {resource} response: {source}")]
    Decode {
        resource: Resource,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("hourly forecast still paginating after {pages} pages")]
    Unterminated { pages: usize },

    #[error("weather client is closed")]
    Closed,

    #[error("poll cancelled by shutdown")]
    Cancelled,
}

/// A poll cycle failed; no snapshot was published.
#[derive(Debug, Error)]
#[error("Error communicating with API: {source}")]
pub struct UpdateFailed {
    #[from]
    pub source: TransportError,
}
