use sqlx::sqlite::SqliteConnection;
use sqlx::SqlitePool;

use super::{draw_unused_id, StoreError};
use crate::models::Destination;

#[derive(Clone)]
pub struct DestinationRepository {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct DestinationRow {
    id: i64,
    city: String,
    country: String,
    picture: Option<Vec<u8>>,
}

impl From<DestinationRow> for Destination {
    fn from(row: DestinationRow) -> Self {
        Destination {
            id: row.id,
            city: row.city,
            country: row.country,
            picture: row.picture,
        }
    }
}

/// Ids of every stored destination, in no particular order.
pub(crate) async fn fetch_ids(conn: &mut SqliteConnection) -> Result<Vec<i64>, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT id FROM destinations")
        .fetch_all(&mut *conn)
        .await
}

pub(crate) async fn insert(
    conn: &mut SqliteConnection,
    destination: &Destination,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO destinations (id, city, country, picture) VALUES (?, ?, ?, ?)")
        .bind(destination.id)
        .bind(&destination.city)
        .bind(&destination.country)
        .bind(&destination.picture)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Overwrites the text fields only; the picture is written separately.
pub(crate) async fn update_fields(
    conn: &mut SqliteConnection,
    destination: &Destination,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE destinations SET city = ?, country = ? WHERE id = ?")
        .bind(&destination.city)
        .bind(&destination.country)
        .bind(destination.id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected())
}

impl DestinationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Inserts a destination under its own id.
    pub async fn create(&self, destination: &Destination) -> Result<Destination, StoreError> {
        let mut conn = self.pool.acquire().await?;
        insert(&mut conn, destination).await?;
        drop(conn);

        self.require(destination.id).await
    }

    /// Inserts a destination under a freshly drawn id, ignoring `destination.id`.
    pub async fn create_with_new_id(
        &self,
        destination: &Destination,
    ) -> Result<Destination, StoreError> {
        let mut tx = self.pool.begin().await?;
        let id = draw_unused_id(&mut tx, "destinations").await?;
        let destination = Destination {
            id,
            ..destination.clone()
        };
        insert(&mut tx, &destination).await?;
        tx.commit().await?;

        self.require(id).await
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Destination>, StoreError> {
        let row: Option<DestinationRow> =
            sqlx::query_as("SELECT * FROM destinations WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(Destination::from))
    }

    /// All destinations, sorted by city.
    pub async fn list(&self) -> Result<Vec<Destination>, StoreError> {
        let rows: Vec<DestinationRow> =
            sqlx::query_as("SELECT * FROM destinations ORDER BY city COLLATE NOCASE, id")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(Destination::from).collect())
    }

    /// Writes every field, picture included.
    pub async fn update(&self, destination: &Destination) -> Result<Destination, StoreError> {
        let result =
            sqlx::query("UPDATE destinations SET city = ?, country = ?, picture = ? WHERE id = ?")
                .bind(&destination.city)
                .bind(&destination.country)
                .bind(&destination.picture)
                .bind(destination.id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                kind: "Destination",
                id: destination.id,
            });
        }
        self.require(destination.id).await
    }

    /// Stores downloaded image bytes. Returns false if the destination is gone.
    pub async fn set_picture(&self, id: i64, picture: &[u8]) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE destinations SET picture = ? WHERE id = ?")
            .bind(picture)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Deletes a destination unless a trip still points at it.
    pub async fn delete(&self, id: i64) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        let (trips,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM trips WHERE destination_id = ?")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
        if trips > 0 {
            return Err(StoreError::DestinationInUse { id, trips });
        }

        let result = sqlx::query("DELETE FROM destinations WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                kind: "Destination",
                id,
            });
        }

        tx.commit().await?;
        Ok(())
    }

    async fn require(&self, id: i64) -> Result<Destination, StoreError> {
        self.get_by_id(id).await?.ok_or(StoreError::NotFound {
            kind: "Destination",
            id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::setup_db;
    use crate::db::{TripRepository, MANUAL_ID_RANGE};
    use crate::models::Trip;
    use chrono::NaiveDate;

    #[tokio::test]
    async fn test_create_and_get_destination() {
        let db = setup_db().await;
        let repo = DestinationRepository::new(db.pool.clone());

        let created = repo
            .create(&Destination::new(1, "Lisbon", "Portugal"))
            .await
            .unwrap();
        assert_eq!(created.city, "Lisbon");

        let fetched = repo.get_by_id(1).await.unwrap().unwrap();
        assert_eq!(fetched, created);
        assert!(repo.get_by_id(2).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_duplicate_id_fails() {
        let db = setup_db().await;
        let repo = DestinationRepository::new(db.pool.clone());

        repo.create(&Destination::new(1, "Lisbon", "Portugal"))
            .await
            .unwrap();
        let result = repo.create(&Destination::new(1, "Porto", "Portugal")).await;
        assert!(matches!(result, Err(StoreError::Database(_))));
    }

    #[tokio::test]
    async fn test_create_with_new_id() {
        let db = setup_db().await;
        let repo = DestinationRepository::new(db.pool.clone());

        let created = repo
            .create_with_new_id(&Destination::new(0, "Hanoi", "Vietnam"))
            .await
            .unwrap();
        assert!(MANUAL_ID_RANGE.contains(&created.id));
        assert_eq!(created.city, "Hanoi");
    }

    #[tokio::test]
    async fn test_list_sorted_by_city() {
        let db = setup_db().await;
        let repo = DestinationRepository::new(db.pool.clone());

        repo.create(&Destination::new(1, "rome", "Italy")).await.unwrap();
        repo.create(&Destination::new(2, "Athens", "Greece")).await.unwrap();
        repo.create(&Destination::new(3, "Madrid", "Spain")).await.unwrap();

        let cities: Vec<String> = repo
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.city)
            .collect();
        assert_eq!(cities, vec!["Athens", "Madrid", "rome"]);
    }

    #[tokio::test]
    async fn test_update_and_set_picture() {
        let db = setup_db().await;
        let repo = DestinationRepository::new(db.pool.clone());

        let mut dest = repo
            .create(&Destination::new(1, "Bombay", "India"))
            .await
            .unwrap();
        dest.city = "Mumbai".to_string();
        let updated = repo.update(&dest).await.unwrap();
        assert_eq!(updated.city, "Mumbai");

        assert!(repo.set_picture(1, &[0xff, 0xd8]).await.unwrap());
        let fetched = repo.get_by_id(1).await.unwrap().unwrap();
        assert_eq!(fetched.picture, Some(vec![0xff, 0xd8]));

        assert!(!repo.set_picture(42, &[1]).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let db = setup_db().await;
        let repo = DestinationRepository::new(db.pool.clone());

        let result = repo.update(&Destination::new(9, "Nowhere", "None")).await;
        assert!(matches!(result, Err(StoreError::NotFound { id: 9, .. })));
    }

    #[tokio::test]
    async fn test_delete_unreferenced_destination() {
        let db = setup_db().await;
        let repo = DestinationRepository::new(db.pool.clone());

        repo.create(&Destination::new(1, "Cairo", "Egypt")).await.unwrap();
        repo.delete(1).await.unwrap();
        assert!(repo.get_by_id(1).await.unwrap().is_none());

        let again = repo.delete(1).await;
        assert!(matches!(again, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_delete_referenced_destination_is_rejected() {
        let db = setup_db().await;
        let repo = DestinationRepository::new(db.pool.clone());
        let trips = TripRepository::new(db.pool.clone());

        repo.create(&Destination::new(1, "Cairo", "Egypt")).await.unwrap();
        let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        trips
            .create(&Trip::new(5, "Pyramids", start, end).with_destination(1))
            .await
            .unwrap();

        let result = repo.delete(1).await;
        assert!(matches!(
            result,
            Err(StoreError::DestinationInUse { id: 1, trips: 1 })
        ));
        assert!(repo.get_by_id(1).await.unwrap().is_some());

        // Once the trip is gone the destination can be deleted
        trips.delete(5).await.unwrap();
        repo.delete(1).await.unwrap();
        assert!(repo.get_by_id(1).await.unwrap().is_none());
    }
}
