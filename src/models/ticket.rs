use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::database::Database;
use crate::error::{AppError, AppResult};
use crate::models::TheaterHall;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Ticket {
    pub id: i64,
    pub row: i32,
    pub seat: i32,
    pub performance_id: i64,
    pub reservation_id: i64,
}

/// Запрошенное место в бронировании.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TicketRequest {
    pub row: i32,
    pub seat: i32,
    pub performance: i64,
}

impl Ticket {
    /// Место должно лежать внутри зала: 1..=rows и 1..=seats_in_row.
    pub fn validate_position(row: i32, seat: i32, hall: &TheaterHall) -> AppResult<()> {
        if !(1..=hall.rows).contains(&row) {
            return Err(AppError::field(
                "row",
                format!("row number must be in available range: (1, rows): (1, {})", hall.rows),
            ));
        }
        if !(1..=hall.seats_in_row).contains(&seat) {
            return Err(AppError::field(
                "seat",
                format!(
                    "seat number must be in available range: (1, seats_in_row): (1, {})",
                    hall.seats_in_row
                ),
            ));
        }
        Ok(())
    }

    pub async fn for_reservations(db: &Database, reservation_ids: &[i64]) -> Result<Vec<Ticket>, sqlx::Error> {
        sqlx::query_as::<_, Ticket>(
            "SELECT id, row, seat, performance_id, reservation_id
             FROM tickets
             WHERE reservation_id = ANY($1)
             ORDER BY reservation_id, id"
        )
        .bind(reservation_ids)
        .fetch_all(&db.pool)
        .await
    }
}
