use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::FromRow;

use crate::database::Database;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Reservation {
    pub id: i64,
    pub user_id: i64,
    pub created_at: NaiveDateTime,
}

impl Reservation {
    /// Страница бронирований пользователя, новые первыми.
    pub async fn page_for_user(
        db: &Database,
        user_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Reservation>, sqlx::Error> {
        sqlx::query_as::<_, Reservation>(
            "SELECT id, user_id, created_at
             FROM reservations
             WHERE user_id = $1
             ORDER BY created_at DESC, id DESC
             LIMIT $2 OFFSET $3"
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&db.pool)
        .await
    }

    pub async fn count_for_user(db: &Database, user_id: i64) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM reservations WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&db.pool)
            .await
    }

    // Чужая бронь неотличима от несуществующей
    pub async fn find_for_user(db: &Database, id: i64, user_id: i64) -> Result<Option<Reservation>, sqlx::Error> {
        sqlx::query_as::<_, Reservation>(
            "SELECT id, user_id, created_at FROM reservations WHERE id = $1 AND user_id = $2"
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&db.pool)
        .await
    }

    /// Удаляет бронь владельца; билеты уходят каскадом. Возвращает false, если удалять нечего.
    pub async fn delete_for_user(db: &Database, id: i64, user_id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM reservations WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&db.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
