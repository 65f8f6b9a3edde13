use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor};
use tracing::info;

use crate::database::Database;
use crate::error::{AppError, AppResult};
use crate::models::{Play, TheaterHall};

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Performance {
    pub id: i64,
    pub show_time: NaiveDateTime,
    pub play_id: i64,
    pub theater_hall_id: i64,
}

/// Строка списка спектаклей: плоские поля пьесы и зала плюс свободные места.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PerformanceSummary {
    pub id: i64,
    pub show_time: NaiveDateTime,
    pub play_title: String,
    pub theater_hall_name: String,
    pub theater_hall_capacity: i64,
    pub tickets_available: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct SeatCoordinate {
    pub row: i32,
    pub seat: i32,
}

#[derive(Debug, Default, Clone)]
pub struct PerformanceFilter {
    pub date: Option<NaiveDate>,
    pub play: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPerformance {
    pub show_time: NaiveDateTime,
    pub play: i64,
    pub theater_hall: i64,
}

// tickets_available считается при каждом чтении, счетчик не хранится
const SUMMARY_SELECT: &str = r#"
    SELECT
        p.id,
        p.show_time,
        pl.title AS play_title,
        h.name AS theater_hall_name,
        (h.rows::BIGINT * h.seats_in_row) AS theater_hall_capacity,
        (h.rows::BIGINT * h.seats_in_row - COUNT(t.id)) AS tickets_available
    FROM performances p
    JOIN plays pl ON pl.id = p.play_id
    JOIN theater_halls h ON h.id = p.theater_hall_id
    LEFT JOIN tickets t ON t.performance_id = p.id
"#;

const SUMMARY_GROUP: &str =
    " GROUP BY p.id, p.show_time, pl.title, h.name, h.rows, h.seats_in_row ORDER BY p.show_time, p.id";

impl Performance {
    pub async fn list(db: &Database, filter: &PerformanceFilter) -> Result<Vec<PerformanceSummary>, sqlx::Error> {
        let mut q = format!("{} WHERE TRUE", SUMMARY_SELECT);
        let mut bind_idx = 1;
        if filter.date.is_some() {
            q.push_str(&format!(" AND p.show_time::date = ${}", bind_idx));
            bind_idx += 1;
        }
        if filter.play.is_some() {
            q.push_str(&format!(" AND p.play_id = ${}", bind_idx));
        }
        q.push_str(SUMMARY_GROUP);

        let mut dbq = sqlx::query_as::<_, PerformanceSummary>(&q);
        if let Some(date) = filter.date {
            dbq = dbq.bind(date);
        }
        if let Some(play) = filter.play {
            dbq = dbq.bind(play);
        }

        dbq.fetch_all(&db.pool).await
    }

    /// Сводки по конкретным спектаклям (для вложения в билеты).
    pub async fn summaries_by_ids(db: &Database, ids: &[i64]) -> Result<Vec<PerformanceSummary>, sqlx::Error> {
        let q = format!("{} WHERE p.id = ANY($1) {}", SUMMARY_SELECT, SUMMARY_GROUP);
        sqlx::query_as::<_, PerformanceSummary>(&q)
            .bind(ids)
            .fetch_all(&db.pool)
            .await
    }

    pub async fn find<'e, E: PgExecutor<'e>>(executor: E, id: i64) -> Result<Option<Performance>, sqlx::Error> {
        sqlx::query_as::<_, Performance>(
            "SELECT id, show_time, play_id, theater_hall_id FROM performances WHERE id = $1"
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    /// Занятые места спектакля, для отрисовки схемы зала.
    pub async fn taken_seats(db: &Database, id: i64) -> Result<Vec<SeatCoordinate>, sqlx::Error> {
        sqlx::query_as::<_, SeatCoordinate>(
            "SELECT row, seat FROM tickets WHERE performance_id = $1 ORDER BY row, seat"
        )
        .bind(id)
        .fetch_all(&db.pool)
        .await
    }

    pub async fn create(db: &Database, new: &NewPerformance) -> AppResult<Performance> {
        let mut tx = db.pool.begin().await?;

        ensure_references(&mut *tx, new).await?;

        let performance = sqlx::query_as::<_, Performance>(
            "INSERT INTO performances (show_time, play_id, theater_hall_id)
             VALUES ($1, $2, $3)
             RETURNING id, show_time, play_id, theater_hall_id"
        )
        .bind(new.show_time)
        .bind(new.play)
        .bind(new.theater_hall)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(performance_id = performance.id, play_id = new.play, hall_id = new.theater_hall, "Performance created");
        Ok(performance)
    }

    /// Полная замена полей спектакля.
    ///
    /// UPDATE берет блокировку строки и ждет незавершенные бронирования
    /// этого спектакля (они держат FOR SHARE), поэтому проверка уже
    /// проданных билетов ниже видит все зафиксированные места.
    pub async fn update(db: &Database, id: i64, new: &NewPerformance) -> AppResult<Performance> {
        let mut tx = db.pool.begin().await?;

        let hall = ensure_references(&mut *tx, new).await?;

        let performance = sqlx::query_as::<_, Performance>(
            "UPDATE performances
             SET show_time = $2, play_id = $3, theater_hall_id = $4
             WHERE id = $1
             RETURNING id, show_time, play_id, theater_hall_id"
        )
        .bind(id)
        .bind(new.show_time)
        .bind(new.play)
        .bind(new.theater_hall)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found("Performance", id))?;

        // Уже проданные билеты должны поместиться в новый зал
        let misplaced = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM tickets WHERE performance_id = $1 AND (row > $2 OR seat > $3)"
        )
        .bind(id)
        .bind(hall.rows)
        .bind(hall.seats_in_row)
        .fetch_one(&mut *tx)
        .await?;

        if misplaced > 0 {
            // tx откатится при drop
            return Err(AppError::field(
                "theater_hall",
                format!("{} sold tickets do not fit into hall {} ({} rows x {} seats)",
                    misplaced, hall.name, hall.rows, hall.seats_in_row),
            ));
        }

        tx.commit().await?;

        info!(performance_id = id, "Performance updated");
        Ok(performance)
    }

    /// Удаляет спектакль; билеты удаляются каскадом.
    pub async fn delete(db: &Database, id: i64) -> AppResult<()> {
        let deleted = sqlx::query("DELETE FROM performances WHERE id = $1")
            .bind(id)
            .execute(&db.pool)
            .await?
            .rows_affected();

        if deleted == 0 {
            return Err(AppError::not_found("Performance", id));
        }

        info!(performance_id = id, "Performance deleted");
        Ok(())
    }
}

async fn ensure_references(
    conn: &mut sqlx::PgConnection,
    new: &NewPerformance,
) -> AppResult<TheaterHall> {
    Play::find(&mut *conn, new.play)
        .await?
        .ok_or_else(|| AppError::not_found("Play", new.play))?;

    TheaterHall::find(&mut *conn, new.theater_hall)
        .await?
        .ok_or_else(|| AppError::not_found("TheaterHall", new.theater_hall))
}
