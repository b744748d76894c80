//! Upsert of remote records into the local store.
//!
//! A pass loads every local record of one type, then walks the remote list
//! in order: ids already present get their mutable fields overwritten,
//! unknown ids are inserted. The whole pass commits as one transaction.
//! Local records missing from the remote list are left alone.

use serde::Serialize;
use sqlx::SqlitePool;
use std::collections::HashSet;

use super::records::{ApiDestination, ApiTrip};
use crate::db::{
    fetch_destination_ids, fetch_trip_ids, insert_destination, insert_trip,
    update_destination_fields, update_trip_fields, StoreError,
};

/// What one reconciliation pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub created: usize,
    pub updated: usize,
}

impl ReconcileReport {
    pub fn total(&self) -> usize {
        self.created + self.updated
    }
}

#[derive(Clone)]
pub struct Reconciler {
    pool: SqlitePool,
}

impl Reconciler {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Upserts destinations by id. City and country are overwritten; the
    /// picture is left as is and filled in by the image download.
    pub async fn reconcile_destinations(
        &self,
        remote: &[ApiDestination],
    ) -> Result<ReconcileReport, StoreError> {
        let mut tx = self.pool.begin().await?;
        let mut known: HashSet<i64> = fetch_destination_ids(&mut tx).await?.into_iter().collect();

        let mut report = ReconcileReport::default();
        for record in remote {
            let destination = record.to_destination();
            // A repeated id in the same payload lands here too: last write wins
            if known.contains(&record.id) {
                update_destination_fields(&mut tx, &destination).await?;
                report.updated += 1;
            } else {
                insert_destination(&mut tx, &destination).await?;
                known.insert(record.id);
                report.created += 1;
            }
        }

        tx.commit().await?;
        tracing::debug!(
            "Reconciled destinations: {} created, {} updated",
            report.created,
            report.updated
        );
        Ok(report)
    }

    /// Upserts trips by id. Title, dates and destination reference are
    /// overwritten; the reference is not checked against local destinations.
    pub async fn reconcile_trips(&self, remote: &[ApiTrip]) -> Result<ReconcileReport, StoreError> {
        let mut tx = self.pool.begin().await?;
        let mut known: HashSet<i64> = fetch_trip_ids(&mut tx).await?.into_iter().collect();

        let mut report = ReconcileReport::default();
        for record in remote {
            let trip = record.to_trip();
            if known.contains(&record.id) {
                update_trip_fields(&mut tx, &trip).await?;
                report.updated += 1;
            } else {
                insert_trip(&mut tx, &trip).await?;
                known.insert(record.id);
                report.created += 1;
            }
        }

        tx.commit().await?;
        tracing::debug!(
            "Reconciled trips: {} created, {} updated",
            report.created,
            report.updated
        );
        Ok(report)
    }
}
