mod destination_repo;
mod settings_repo;
mod trip_repo;

pub use destination_repo::DestinationRepository;
pub use settings_repo::SettingsRepository;
pub use trip_repo::TripRepository;

pub(crate) use destination_repo::{
    fetch_ids as fetch_destination_ids, insert as insert_destination,
    update_fields as update_destination_fields,
};
pub(crate) use trip_repo::{
    fetch_ids as fetch_trip_ids, insert as insert_trip, update_fields as update_trip_fields,
};

use rand::Rng;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqlitePool, SqlitePoolOptions};
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Range manual ids are drawn from. Remote ids are small sequential numbers.
pub const MANUAL_ID_RANGE: RangeInclusive<i64> = 100..=10_000;

/// Errors from the local store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to create database directory '{}': {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: i64 },

    #[error("Cannot delete destination {id}: it is linked to {trips} existing trip(s)")]
    DestinationInUse { id: i64, trips: i64 },

    #[error("No free id left in range {}..={}", MANUAL_ID_RANGE.start(), MANUAL_ID_RANGE.end())]
    IdsExhausted,
}

/// Initialize the database connection pool and run migrations
pub async fn init_db(path: &Path) -> Result<SqlitePool, StoreError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .map_err(|source| StoreError::CreateDir {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }
    }

    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

/// Draws a random id from [`MANUAL_ID_RANGE`] that is not yet used in `table`.
async fn draw_unused_id(conn: &mut SqliteConnection, table: &str) -> Result<i64, StoreError> {
    let used: Vec<(i64,)> = sqlx::query_as(&format!(
        "SELECT id FROM {} WHERE id BETWEEN ? AND ?",
        table
    ))
    .bind(MANUAL_ID_RANGE.start())
    .bind(MANUAL_ID_RANGE.end())
    .fetch_all(&mut *conn)
    .await?;

    let capacity = MANUAL_ID_RANGE.end() - MANUAL_ID_RANGE.start() + 1;
    if used.len() as i64 >= capacity {
        return Err(StoreError::IdsExhausted);
    }

    let used: std::collections::HashSet<i64> = used.into_iter().map(|(id,)| id).collect();
    let mut rng = rand::rng();
    loop {
        let candidate = rng.random_range(MANUAL_ID_RANGE);
        if !used.contains(&candidate) {
            return Ok(candidate);
        }
    }
}
