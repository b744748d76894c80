use chrono::NaiveDate;
use sqlx::sqlite::SqliteConnection;
use sqlx::SqlitePool;

use super::{draw_unused_id, StoreError};
use crate::models::{Trip, DATE_FORMAT};

#[derive(Clone)]
pub struct TripRepository {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct TripRow {
    id: i64,
    title: String,
    start_date: String,
    end_date: String,
    destination_id: Option<i64>,
}

impl TryFrom<TripRow> for Trip {
    type Error = sqlx::Error;

    fn try_from(row: TripRow) -> Result<Self, Self::Error> {
        Ok(Trip {
            id: row.id,
            title: row.title,
            start_date: parse_stored_date(&row.start_date)?,
            end_date: parse_stored_date(&row.end_date)?,
            destination_id: row.destination_id,
        })
    }
}

fn parse_stored_date(value: &str) -> Result<NaiveDate, sqlx::Error> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|e| sqlx::Error::Decode(Box::new(e)))
}

fn hydrate(rows: Vec<TripRow>) -> Result<Vec<Trip>, sqlx::Error> {
    rows.into_iter().map(Trip::try_from).collect()
}

/// Ids of every stored trip. Only the ids are read, so rows with
/// unparseable dates do not block an upsert over them.
pub(crate) async fn fetch_ids(conn: &mut SqliteConnection) -> Result<Vec<i64>, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT id FROM trips")
        .fetch_all(&mut *conn)
        .await
}

pub(crate) async fn insert(conn: &mut SqliteConnection, trip: &Trip) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO trips (id, title, start_date, end_date, destination_id)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(trip.id)
    .bind(&trip.title)
    .bind(trip.start_date.format(DATE_FORMAT).to_string())
    .bind(trip.end_date.format(DATE_FORMAT).to_string())
    .bind(trip.destination_id)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Overwrites every mutable field of the trip with the given id.
pub(crate) async fn update_fields(
    conn: &mut SqliteConnection,
    trip: &Trip,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE trips
        SET title = ?, start_date = ?, end_date = ?, destination_id = ?
        WHERE id = ?
        "#,
    )
    .bind(&trip.title)
    .bind(trip.start_date.format(DATE_FORMAT).to_string())
    .bind(trip.end_date.format(DATE_FORMAT).to_string())
    .bind(trip.destination_id)
    .bind(trip.id)
    .execute(&mut *conn)
    .await?;
    Ok(result.rows_affected())
}

impl TripRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Inserts a trip under its own id.
    pub async fn create(&self, trip: &Trip) -> Result<Trip, StoreError> {
        let mut conn = self.pool.acquire().await?;
        insert(&mut conn, trip).await?;
        drop(conn);

        self.require(trip.id).await
    }

    /// Inserts a trip under a freshly drawn id, ignoring `trip.id`.
    pub async fn create_with_new_id(&self, trip: &Trip) -> Result<Trip, StoreError> {
        let mut tx = self.pool.begin().await?;
        let id = draw_unused_id(&mut tx, "trips").await?;
        let trip = Trip {
            id,
            ..trip.clone()
        };
        insert(&mut tx, &trip).await?;
        tx.commit().await?;

        self.require(id).await
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Trip>, StoreError> {
        let row: Option<TripRow> = sqlx::query_as("SELECT * FROM trips WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Trip::try_from).transpose()?)
    }

    /// All trips, sorted by start date.
    pub async fn list(&self) -> Result<Vec<Trip>, StoreError> {
        let rows: Vec<TripRow> = sqlx::query_as("SELECT * FROM trips ORDER BY start_date, id")
            .fetch_all(&self.pool)
            .await?;
        Ok(hydrate(rows)?)
    }

    pub async fn list_for_destination(&self, destination_id: i64) -> Result<Vec<Trip>, StoreError> {
        let rows: Vec<TripRow> = sqlx::query_as(
            "SELECT * FROM trips WHERE destination_id = ? ORDER BY start_date, id",
        )
        .bind(destination_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(hydrate(rows)?)
    }

    pub async fn update(&self, trip: &Trip) -> Result<Trip, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let affected = update_fields(&mut conn, trip).await?;
        drop(conn);

        if affected == 0 {
            return Err(StoreError::NotFound {
                kind: "Trip",
                id: trip.id,
            });
        }
        self.require(trip.id).await
    }

    pub async fn delete(&self, id: i64) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM trips WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound { kind: "Trip", id });
        }
        Ok(())
    }

    async fn require(&self, id: i64) -> Result<Trip, StoreError> {
        self.get_by_id(id)
            .await?
            .ok_or(StoreError::NotFound { kind: "Trip", id })
    }
}
