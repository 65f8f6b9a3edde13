use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::database::Database;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Genre {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct NewGenre {
    #[validate(length(min = 1, max = 255, message = "name must be 1..255 characters"))]
    pub name: String,
}

impl Genre {
    pub async fn list(db: &Database) -> Result<Vec<Genre>, sqlx::Error> {
        sqlx::query_as::<_, Genre>("SELECT id, name FROM genres ORDER BY name")
            .fetch_all(&db.pool)
            .await
    }

    // Дубликат имени ловит uq_genres_name -> 409
    pub async fn create(db: &Database, new: &NewGenre) -> Result<Genre, sqlx::Error> {
        sqlx::query_as::<_, Genre>(
            "INSERT INTO genres (name) VALUES ($1) RETURNING id, name"
        )
        .bind(new.name.trim())
        .fetch_one(&db.pool)
        .await
    }
}
