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
    controllers::{
        filters::{parse_date, parse_id},
        plays::{play_list_items, PlayListItem},
        theater_halls::{hall_view, HallView},
    },
    error::{AppError, AppResult},
    models::{
        performance::{NewPerformance, PerformanceFilter, PerformanceSummary, SeatCoordinate},
        Performance, Play, TheaterHall,
    },
    AppState,
};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/performances", get(list_performances).post(create_performance))
        .route(
            "/performances/{id}",
            get(get_performance).put(update_performance).delete(delete_performance),
        )
}

#[derive(Debug, Deserialize)]
struct PerformancesQuery {
    date: Option<String>,
    play: Option<String>,
}

#[derive(Debug, Serialize)]
struct PerformanceDetail {
    id: i64,
    show_time: NaiveDateTime,
    play: PlayListItem,
    theater_hall: HallView,
    tickets_available: i64,
    taken_places: Vec<SeatCoordinate>,
}

#[derive(Debug, Serialize)]
struct PerformanceWriteView {
    id: i64,
    show_time: NaiveDateTime,
    play: i64,
    theater_hall: i64,
}

impl From<Performance> for PerformanceWriteView {
    fn from(p: Performance) -> Self {
        PerformanceWriteView {
            id: p.id,
            show_time: p.show_time,
            play: p.play_id,
            theater_hall: p.theater_hall_id,
        }
    }
}

// GET /api/performances?date=YYYY-MM-DD&play=ID
async fn list_performances(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PerformancesQuery>,
) -> AppResult<Json<Vec<PerformanceSummary>>> {
    let filter = PerformanceFilter {
        date: parse_date("date", params.date.as_deref())?,
        play: parse_id("play", params.play.as_deref())?,
    };
    Ok(Json(Performance::list(&state.db, &filter).await?))
}

// GET /api/performances/{id}
async fn get_performance(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> AppResult<Json<PerformanceDetail>> {
    let performance = Performance::find(&state.db.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("Performance", id))?;

    let play = Play::find(&state.db.pool, performance.play_id)
        .await?
        .ok_or_else(|| AppError::not_found("Play", performance.play_id))?;
    let hall = TheaterHall::find(&state.db.pool, performance.theater_hall_id)
        .await?
        .ok_or_else(|| AppError::not_found("TheaterHall", performance.theater_hall_id))?;

    let taken_places = Performance::taken_seats(&state.db, id).await?;
    let play = play_list_items(&state.db, vec![play])
        .await?
        .pop()
        .ok_or_else(|| AppError::Internal(format!("play view for performance {id} is missing")))?;

    Ok(Json(PerformanceDetail {
        id: performance.id,
        show_time: performance.show_time,
        play,
        tickets_available: hall.capacity() - taken_places.len() as i64,
        theater_hall: hall_view(hall),
        taken_places,
    }))
}

// POST /api/performances
async fn create_performance(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewPerformance>,
) -> AppResult<impl IntoResponse> {
    let performance = Performance::create(&state.db, &req).await?;
    Ok((StatusCode::CREATED, Json(PerformanceWriteView::from(performance))))
}

// PUT /api/performances/{id}
async fn update_performance(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<NewPerformance>,
) -> AppResult<Json<PerformanceWriteView>> {
    let performance = Performance::update(&state.db, id, &req).await?;
    Ok(Json(PerformanceWriteView::from(performance)))
}

// DELETE /api/performances/{id}
async fn delete_performance(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    Performance::delete(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
