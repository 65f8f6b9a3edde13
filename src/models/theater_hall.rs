use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor};
use validator::Validate;

use crate::database::Database;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TheaterHall {
    pub id: i64,
    pub name: String,
    pub rows: i32,
    pub seats_in_row: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct NewTheaterHall {
    #[validate(length(min = 1, max = 255, message = "name must be 1..255 characters"))]
    pub name: String,
    #[validate(range(min = 1, message = "rows must be a positive integer"))]
    pub rows: i32,
    #[validate(range(min = 1, message = "seats_in_row must be a positive integer"))]
    pub seats_in_row: i32,
}

impl TheaterHall {
    /// Вместимость зала. Не хранится в БД, чтобы не устаревать.
    pub fn capacity(&self) -> i64 {
        i64::from(self.rows) * i64::from(self.seats_in_row)
    }

    pub async fn list(db: &Database) -> Result<Vec<TheaterHall>, sqlx::Error> {
        sqlx::query_as::<_, TheaterHall>(
            "SELECT id, name, rows, seats_in_row FROM theater_halls ORDER BY name, id"
        )
        .fetch_all(&db.pool)
        .await
    }

    pub async fn find<'e, E: PgExecutor<'e>>(executor: E, id: i64) -> Result<Option<TheaterHall>, sqlx::Error> {
        sqlx::query_as::<_, TheaterHall>(
            "SELECT id, name, rows, seats_in_row FROM theater_halls WHERE id = $1"
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    pub async fn create(db: &Database, new: &NewTheaterHall) -> Result<TheaterHall, sqlx::Error> {
        sqlx::query_as::<_, TheaterHall>(
            "INSERT INTO theater_halls (name, rows, seats_in_row)
             VALUES ($1, $2, $3)
             RETURNING id, name, rows, seats_in_row"
        )
        .bind(new.name.trim())
        .bind(new.rows)
        .bind(new.seats_in_row)
        .fetch_one(&db.pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_is_rows_times_seats() {
        let hall = TheaterHall { id: 1, name: "Main".into(), rows: 5, seats_in_row: 8 };
        assert_eq!(hall.capacity(), 40);
    }

    #[test]
    fn zero_rows_fail_validation() {
        let new = NewTheaterHall { name: "Small".into(), rows: 0, seats_in_row: 8 };
        let errors = new.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("rows"));
        assert!(!errors.field_errors().contains_key("seats_in_row"));
    }
}
