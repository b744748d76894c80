//! Sync error types.

use thiserror::Error;

use crate::db::StoreError;

/// Why a single request to the remote API failed.
///
/// Callers treat every variant the same way (the resource failed to sync);
/// the distinction only matters for log output.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        source: reqwest::Error,
    },

    #[error("Server returned status {status} for {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("Empty response body from {url}")]
    EmptyBody { url: String },

    #[error("Failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        source: serde_json::Error,
    },
}

/// Errors from one sync pass over a resource type.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
