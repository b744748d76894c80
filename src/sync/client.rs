//! HTTP client for the remote travel API.
//!
//! Every call is a single GET with no retry, backoff or timeout override.
//! Resource lists are decoded as JSON arrays of a fixed record shape.

use reqwest::Url;
use serde::de::DeserializeOwned;

use super::error::FetchError;
use super::records::{ApiDestination, ApiTrip};

/// Base URL used when none is configured.
pub const DEFAULT_BASE_URL: &str = "https://67e9d41abdcaa2b7f5ba40cb.mockapi.io/";

pub const DESTINATIONS_PATH: &str = "destination";
pub const TRIPS_PATH: &str = "trips";

/// Client for the remote API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Joins a resource path onto the base URL, with exactly one `/` between them.
    pub fn resource_url(&self, path: &str) -> Result<Url, FetchError> {
        let joined = format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        parse_url(&joined)
    }

    pub async fn fetch_destinations(&self) -> Result<Vec<ApiDestination>, FetchError> {
        self.fetch_list(DESTINATIONS_PATH).await
    }

    pub async fn fetch_trips(&self) -> Result<Vec<ApiTrip>, FetchError> {
        self.fetch_list(TRIPS_PATH).await
    }

    /// GETs `path` and decodes the body as a JSON array of `T`.
    pub async fn fetch_list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, FetchError> {
        let url = self.resource_url(path)?;
        let (url, body) = self.get_bytes(url).await?;

        serde_json::from_slice(&body).map_err(|source| FetchError::Decode { url, source })
    }

    /// Downloads raw bytes, e.g. a destination picture.
    pub async fn download(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let url = parse_url(url)?;
        let (_, bytes) = self.get_bytes(url).await?;
        Ok(bytes)
    }

    /// Performs the GET and returns the URL string alongside a non-empty body.
    async fn get_bytes(&self, url: Url) -> Result<(String, Vec<u8>), FetchError> {
        let url_str = url.to_string();
        tracing::debug!("GET {}", url_str);

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url_str.clone(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                url: url_str,
                status: response.status(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|source| FetchError::Transport {
                url: url_str.clone(),
                source,
            })?;

        if bytes.is_empty() {
            return Err(FetchError::EmptyBody { url: url_str });
        }

        Ok((url_str, bytes.to_vec()))
    }
}

fn parse_url(value: &str) -> Result<Url, FetchError> {
    Url::parse(value).map_err(|e| FetchError::InvalidUrl {
        url: value.to_string(),
        reason: e.to_string(),
    })
}
