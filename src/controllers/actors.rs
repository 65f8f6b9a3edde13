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
    models::{actor::NewActor, Actor},
    AppState,
};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/actors", get(list_actors).post(create_actor))
}

// GET /api/actors
async fn list_actors(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<Actor>>> {
    Ok(Json(Actor::list(&state.db).await?))
}

// POST /api/actors
async fn create_actor(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewActor>,
) -> AppResult<impl IntoResponse> {
    req.validate()?;
    let actor = Actor::create(&state.db, &req).await?;
    Ok((StatusCode::CREATED, Json(actor)))
}
