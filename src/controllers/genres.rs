use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Router,
};
use std::sync::Arc;
use validator::Validate;

use crate::{
    extract::Json,
    error::AppResult,
    models::{genre::NewGenre, Genre},
    AppState,
};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/genres", get(list_genres).post(create_genre))
}

// GET /api/genres
async fn list_genres(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<Genre>>> {
    Ok(Json(Genre::list(&state.db).await?))
}

// POST /api/genres
async fn create_genre(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewGenre>,
) -> AppResult<impl IntoResponse> {
    req.validate()?;
    let genre = Genre::create(&state.db, &req).await?;
    Ok((StatusCode::CREATED, Json(genre)))
}
