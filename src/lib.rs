//! Travelog
//!
//! A local trip journal: destinations and trips kept in SQLite, seeded once
//! from a remote read-only API.

pub mod config;
pub mod db;
pub mod models;
pub mod sync;

pub use config::{Config, ConfigError, ConfigSource, ConfigValue};
pub use db::{init_db, DestinationRepository, SettingsRepository, StoreError, TripRepository};
pub use models::{Destination, Trip, TripLength};
pub use sync::{ApiClient, PreloadOutcome, Preloader, SyncError};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
