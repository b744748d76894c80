//! One-time preload of reference data from the remote API.
//!
//! The pipeline is fetch → reconcile → commit, run once per resource type:
//! destinations first, then trips. Each pass upserts remote records into the
//! local store keyed by id and never deletes local records.
//!
//! # Usage
//!
//! ```ignore
//! let preloader = Preloader::new(ApiClient::new(DEFAULT_BASE_URL), pool);
//! if let PreloadOutcome::Completed(report) = preloader.preload_if_needed().await {
//!     report.images.wait().await;
//! }
//! ```

pub mod client;
pub mod error;
pub mod images;
pub mod preload;
pub mod reconcile;
pub mod records;

pub use client::{ApiClient, DEFAULT_BASE_URL, DESTINATIONS_PATH, TRIPS_PATH};
pub use error::{FetchError, SyncError};
pub use images::ImageDownloads;
pub use preload::{PreloadOutcome, PreloadReport, Preloader, SyncStage};
pub use reconcile::{ReconcileReport, Reconciler};
pub use records::{ApiDestination, ApiTrip};
