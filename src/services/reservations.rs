//! reservations.rs
//!
//! Движок бронирования мест.
//!
//! Бронь создается целиком или не создается вовсе:
//! 1.  Находим залы спектаклей (строки спектаклей блокируются `FOR SHARE`,
//!     чтобы зал нельзя было подменить до коммита) и проверяем, что ряд и
//!     место каждого билета лежат внутри зала.
//! 2.  Вставляем бронь и все билеты в одной транзакции, места в порядке
//!     (спектакль, ряд, место). Повторная продажа места ловится ограничением
//!     `uq_tickets_performance_row_seat` в момент вставки, без
//!     предварительной проверки, так что две параллельные брони одного места
//!     не могут обе зафиксироваться.
//! 3.  Любая ошибка откатывает транзакцию целиком.

use sqlx::PgConnection;
use std::collections::HashMap;
use tracing::{info, warn};

use crate::{
    database::Database,
    error::{is_unique_violation, AppError, AppResult},
    models::{
        performance::PerformanceSummary,
        ticket::TicketRequest,
        Performance, Reservation, TheaterHall, Ticket,
    },
};

const SEAT_CONSTRAINT: &str = "uq_tickets_performance_row_seat";

/// Бронь вместе с ее билетами.
#[derive(Debug, Clone)]
pub struct ReservationWithTickets {
    pub reservation: Reservation,
    pub tickets: Vec<Ticket>,
}

/// Страница броней пользователя и сводки по спектаклям их билетов.
#[derive(Debug, Clone)]
pub struct ReservationListing {
    pub count: i64,
    pub reservations: Vec<ReservationWithTickets>,
    pub performances: HashMap<i64, PerformanceSummary>,
}

/// Создает бронь с билетами одной транзакцией.
pub async fn create_reservation(
    db: &Database,
    user_id: i64,
    requests: &[TicketRequest],
) -> AppResult<ReservationWithTickets> {
    if requests.is_empty() {
        return Err(AppError::field("tickets", "This list may not be empty."));
    }

    let mut tx = db.pool.begin().await?;

    // Фаза 1: границы зала. Спектакли блокируем по возрастанию id,
    // а проверяем билеты в порядке запроса.
    let mut performance_ids: Vec<i64> = requests.iter().map(|r| r.performance).collect();
    performance_ids.sort_unstable();
    performance_ids.dedup();

    let mut halls: HashMap<i64, TheaterHall> = HashMap::with_capacity(performance_ids.len());
    for performance_id in performance_ids {
        let hall = lock_performance_hall(&mut *tx, performance_id).await?;
        halls.insert(performance_id, hall);
    }

    for request in requests {
        let hall = halls
            .get(&request.performance)
            .ok_or_else(|| AppError::not_found("Performance", request.performance))?;
        Ticket::validate_position(request.row, request.seat, hall)?;
    }

    // Фаза 2: запись. Уникальность мест проверяет сама БД.
    let reservation = sqlx::query_as::<_, Reservation>(
        "INSERT INTO reservations (user_id) VALUES ($1) RETURNING id, user_id, created_at"
    )
    .bind(user_id)
    .fetch_one(&mut *tx)
    .await?;

    // Все транзакции занимают места в одном порядке (спектакль, ряд, место),
    // иначе две брони одних мест в разном порядке ждут друг друга по кругу
    let mut insert_order: Vec<usize> = (0..requests.len()).collect();
    insert_order.sort_by_key(|&i| (requests[i].performance, requests[i].row, requests[i].seat));

    let mut inserted: Vec<Option<Ticket>> = (0..requests.len()).map(|_| None).collect();
    for i in insert_order {
        let request = &requests[i];
        let ticket = sqlx::query_as::<_, Ticket>(
            "INSERT INTO tickets (row, seat, performance_id, reservation_id)
             VALUES ($1, $2, $3, $4)
             RETURNING id, row, seat, performance_id, reservation_id"
        )
        .bind(request.row)
        .bind(request.seat)
        .bind(request.performance)
        .bind(reservation.id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e, SEAT_CONSTRAINT) {
                warn!(
                    user_id,
                    performance_id = request.performance,
                    row = request.row,
                    seat = request.seat,
                    "Seat already taken, rolling back reservation"
                );
                AppError::Conflict(format!(
                    "seat (row {}, seat {}) is already taken for performance {}",
                    request.row, request.seat, request.performance
                ))
            } else {
                AppError::Database(e)
            }
        })?;
        inserted[i] = Some(ticket);
    }

    // билеты в ответе идут в порядке запроса
    let tickets: Vec<Ticket> = inserted.into_iter().flatten().collect();

    tx.commit().await?;

    info!(
        reservation_id = reservation.id,
        user_id,
        tickets = tickets.len(),
        "Reservation created"
    );

    Ok(ReservationWithTickets { reservation, tickets })
}

/// Зал спектакля; строка спектакля остается заблокированной до конца транзакции.
async fn lock_performance_hall(conn: &mut PgConnection, performance_id: i64) -> AppResult<TheaterHall> {
    sqlx::query_as::<_, TheaterHall>(
        r#"
        SELECT h.id, h.name, h.rows, h.seats_in_row
        FROM performances p
        JOIN theater_halls h ON h.id = p.theater_hall_id
        WHERE p.id = $1
        FOR SHARE OF p
        "#
    )
    .bind(performance_id)
    .fetch_optional(conn)
    .await?
    .ok_or_else(|| AppError::not_found("Performance", performance_id))
}

/// Брони пользователя постранично, новые первыми.
pub async fn list_reservations(
    db: &Database,
    user_id: i64,
    limit: i64,
    offset: i64,
) -> AppResult<ReservationListing> {
    let count = Reservation::count_for_user(db, user_id).await?;
    let page = Reservation::page_for_user(db, user_id, limit, offset).await?;

    let ids: Vec<i64> = page.iter().map(|r| r.id).collect();
    let mut by_reservation: HashMap<i64, Vec<Ticket>> = HashMap::new();
    for ticket in Ticket::for_reservations(db, &ids).await? {
        by_reservation.entry(ticket.reservation_id).or_default().push(ticket);
    }

    let mut performance_ids: Vec<i64> = by_reservation
        .values()
        .flatten()
        .map(|t| t.performance_id)
        .collect();
    performance_ids.sort_unstable();
    performance_ids.dedup();

    let performances = Performance::summaries_by_ids(db, &performance_ids)
        .await?
        .into_iter()
        .map(|summary| (summary.id, summary))
        .collect();

    let reservations = page
        .into_iter()
        .map(|reservation| {
            let tickets = by_reservation.remove(&reservation.id).unwrap_or_default();
            ReservationWithTickets { reservation, tickets }
        })
        .collect();

    Ok(ReservationListing { count, reservations, performances })
}

/// Одна бронь пользователя. Чужая бронь отдается как несуществующая.
pub async fn get_reservation(db: &Database, user_id: i64, id: i64) -> AppResult<ReservationWithTickets> {
    let reservation = Reservation::find_for_user(db, id, user_id)
        .await?
        .ok_or_else(|| AppError::not_found("Reservation", id))?;
    let tickets = Ticket::for_reservations(db, &[reservation.id]).await?;
    Ok(ReservationWithTickets { reservation, tickets })
}

/// Удаляет бронь пользователя; места освобождаются вместе с билетами.
pub async fn delete_reservation(db: &Database, user_id: i64, id: i64) -> AppResult<()> {
    if !Reservation::delete_for_user(db, id, user_id).await? {
        return Err(AppError::not_found("Reservation", id));
    }
    info!(reservation_id = id, user_id, "Reservation deleted");
    Ok(())
}
