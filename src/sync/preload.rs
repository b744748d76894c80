//! The one-time preload: destinations, then trips, gated by a persisted flag.

use sqlx::SqlitePool;
use std::fmt;
use tokio::sync::Mutex;

use super::client::ApiClient;
use super::error::SyncError;
use super::images::ImageDownloads;
use super::reconcile::{ReconcileReport, Reconciler};
use crate::db::{DestinationRepository, SettingsRepository};

/// The step a sync pass failed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStage {
    Settings,
    Destinations,
    Trips,
}

impl fmt::Display for SyncStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncStage::Settings => write!(f, "settings"),
            SyncStage::Destinations => write!(f, "destinations"),
            SyncStage::Trips => write!(f, "trips"),
        }
    }
}

/// Result of a successful pass over both resource types.
#[derive(Debug)]
pub struct PreloadReport {
    pub destinations: ReconcileReport,
    pub trips: ReconcileReport,
    /// Picture downloads still running in the background.
    pub images: ImageDownloads,
}

#[derive(Debug)]
pub enum PreloadOutcome {
    /// The flag was already set; nothing was fetched.
    AlreadyPreloaded,
    /// Another pass is in progress on this preloader.
    AlreadyRunning,
    Completed(PreloadReport),
    /// The pass stopped at `stage`. Destinations committed before the
    /// failure still have their picture downloads in `images`.
    Failed {
        stage: SyncStage,
        error: SyncError,
        images: ImageDownloads,
    },
}

impl PreloadOutcome {
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            PreloadOutcome::AlreadyPreloaded | PreloadOutcome::Completed(_)
        )
    }
}

/// Runs the remote-to-local sync.
///
/// Destinations are synced before trips, and trips only once destinations
/// succeeded. The `has_preloaded` flag is set only after both passes commit,
/// so any failure leaves it unset and the next launch starts over.
/// Passes on the same preloader never overlap.
pub struct Preloader {
    client: ApiClient,
    reconciler: Reconciler,
    destinations: DestinationRepository,
    settings: SettingsRepository,
    in_flight: Mutex<()>,
}

impl Preloader {
    pub fn new(client: ApiClient, pool: SqlitePool) -> Self {
        Self {
            client,
            reconciler: Reconciler::new(pool.clone()),
            destinations: DestinationRepository::new(pool.clone()),
            settings: SettingsRepository::new(pool),
            in_flight: Mutex::new(()),
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Syncs unless this installation has already been preloaded.
    pub async fn preload_if_needed(&self) -> PreloadOutcome {
        let Ok(_guard) = self.in_flight.try_lock() else {
            return PreloadOutcome::AlreadyRunning;
        };

        match self.settings.has_preloaded().await {
            Ok(true) => {
                tracing::debug!("Already preloaded, skipping sync");
                PreloadOutcome::AlreadyPreloaded
            }
            Ok(false) => self.run().await,
            Err(e) => PreloadOutcome::Failed {
                stage: SyncStage::Settings,
                error: e.into(),
                images: ImageDownloads::default(),
            },
        }
    }

    /// Syncs regardless of the flag, and sets it on success.
    pub async fn sync_now(&self) -> PreloadOutcome {
        let Ok(_guard) = self.in_flight.try_lock() else {
            return PreloadOutcome::AlreadyRunning;
        };
        self.run().await
    }

    async fn run(&self) -> PreloadOutcome {
        tracing::info!("Syncing from {}", self.client.base_url());

        let (destinations, images) = match self.sync_destinations().await {
            Ok(result) => result,
            Err(error) => {
                tracing::warn!("Failed syncing destinations: {}", error);
                return PreloadOutcome::Failed {
                    stage: SyncStage::Destinations,
                    error,
                    images: ImageDownloads::default(),
                };
            }
        };

        let trips = match self.sync_trips().await {
            Ok(report) => report,
            Err(error) => {
                tracing::warn!("Failed syncing trips: {}", error);
                return PreloadOutcome::Failed {
                    stage: SyncStage::Trips,
                    error,
                    images,
                };
            }
        };

        if let Err(e) = self.settings.set_has_preloaded(true).await {
            tracing::warn!("Failed to record preload: {}", e);
            return PreloadOutcome::Failed {
                stage: SyncStage::Settings,
                error: e.into(),
                images,
            };
        }

        tracing::info!(
            "Data preloaded: {} destination(s), {} trip(s)",
            destinations.total(),
            trips.total()
        );
        PreloadOutcome::Completed(PreloadReport {
            destinations,
            trips,
            images,
        })
    }

    /// Fetches and reconciles destinations, then starts their picture downloads.
    pub async fn sync_destinations(&self) -> Result<(ReconcileReport, ImageDownloads), SyncError> {
        let remote = self.client.fetch_destinations().await?;
        let report = self.reconciler.reconcile_destinations(&remote).await?;

        let images = ImageDownloads::spawn(
            &self.client,
            &self.destinations,
            remote.into_iter().map(|r| (r.id, r.picture_url)),
        );
        Ok((report, images))
    }

    pub async fn sync_trips(&self) -> Result<ReconcileReport, SyncError> {
        let remote = self.client.fetch_trips().await?;
        Ok(self.reconciler.reconcile_trips(&remote).await?)
    }
}
