use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Router,
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    extract::{Json, Path, Query},
    error::AppResult,
    middleware::AuthUser,
    models::{performance::PerformanceSummary, ticket::TicketRequest, Ticket},
    pagination::{Page, PageParams, PageRequest},
    services::reservations::{self, ReservationWithTickets},
    AppState,
};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/reservations", get(list_reservations).post(create_reservation))
        .route("/reservations/{id}", get(get_reservation).delete(delete_reservation))
}

#[derive(Debug, Deserialize)]
struct CreateReservationRequest {
    #[serde(default)]
    tickets: Vec<TicketRequest>,
}

#[derive(Debug, Serialize)]
struct TicketView {
    id: i64,
    row: i32,
    seat: i32,
    performance: i64,
}

#[derive(Debug, Serialize)]
struct TicketListView {
    id: i64,
    row: i32,
    seat: i32,
    performance: PerformanceSummary,
}

#[derive(Debug, Serialize)]
struct ReservationView {
    id: i64,
    tickets: Vec<TicketView>,
    created_at: NaiveDateTime,
}

#[derive(Debug, Serialize)]
struct ReservationListView {
    id: i64,
    tickets: Vec<TicketListView>,
    created_at: NaiveDateTime,
}

fn ticket_view(ticket: Ticket) -> TicketView {
    TicketView {
        id: ticket.id,
        row: ticket.row,
        seat: ticket.seat,
        performance: ticket.performance_id,
    }
}

fn reservation_view(item: ReservationWithTickets) -> ReservationView {
    ReservationView {
        id: item.reservation.id,
        created_at: item.reservation.created_at,
        tickets: item.tickets.into_iter().map(ticket_view).collect(),
    }
}

// GET /api/reservations?page=&page_size=
async fn list_reservations(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(params): Query<PageParams>,
) -> AppResult<Json<Page<ReservationListView>>> {
    let page = PageRequest::resolve(&params, &state.config.reservations)?;
    let listing =
        reservations::list_reservations(&state.db, user.user_id, page.limit(), page.offset()).await?;

    let performances = listing.performances;
    let results = listing
        .reservations
        .into_iter()
        .map(|item| ReservationListView {
            id: item.reservation.id,
            created_at: item.reservation.created_at,
            tickets: item
                .tickets
                .into_iter()
                .filter_map(|t| {
                    performances.get(&t.performance_id).map(|summary| TicketListView {
                        id: t.id,
                        row: t.row,
                        seat: t.seat,
                        performance: summary.clone(),
                    })
                })
                .collect(),
        })
        .collect();

    Ok(Json(page.into_page(listing.count, results)))
}

// POST /api/reservations
async fn create_reservation(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<CreateReservationRequest>,
) -> AppResult<impl IntoResponse> {
    let created = reservations::create_reservation(&state.db, user.user_id, &req.tickets).await?;
    Ok((StatusCode::CREATED, Json(reservation_view(created))))
}

// GET /api/reservations/{id}
async fn get_reservation(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<Json<ReservationView>> {
    let item = reservations::get_reservation(&state.db, user.user_id, id).await?;
    Ok(Json(reservation_view(item)))
}

// DELETE /api/reservations/{id}
async fn delete_reservation(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    reservations::delete_reservation(&state.db, user.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
