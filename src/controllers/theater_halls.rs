use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use validator::Validate;

use crate::{
    extract::Json,
    error::AppResult,
    models::{theater_hall::NewTheaterHall, TheaterHall},
    AppState,
};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/theater-halls", get(list_halls).post(create_hall))
}

/// Зал с вычисленной вместимостью.
#[derive(Debug, Serialize)]
pub struct HallView {
    pub id: i64,
    pub name: String,
    pub rows: i32,
    pub seats_in_row: i32,
    pub capacity: i64,
}

pub fn hall_view(hall: TheaterHall) -> HallView {
    HallView {
        capacity: hall.capacity(),
        id: hall.id,
        name: hall.name,
        rows: hall.rows,
        seats_in_row: hall.seats_in_row,
    }
}

// GET /api/theater-halls
async fn list_halls(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<HallView>>> {
    let halls = TheaterHall::list(&state.db).await?;
    Ok(Json(halls.into_iter().map(hall_view).collect()))
}

// POST /api/theater-halls
async fn create_hall(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewTheaterHall>,
) -> AppResult<impl IntoResponse> {
    req.validate()?;
    let hall = TheaterHall::create(&state.db, &req).await?;
    tracing::info!(hall_id = hall.id, capacity = hall.capacity(), "Theater hall created");
    Ok((StatusCode::CREATED, Json(hall_view(hall))))
}
