use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use validator::Validate;

use crate::{
    extract::Json,
    error::AppResult,
    middleware::AuthUser,
    models::{user::NewUser, User},
    AppState,
};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users", post(register))
        .route("/users/me", get(me))
}

// POST /api/users
async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewUser>,
) -> AppResult<impl IntoResponse> {
    req.validate()?;
    let user = User::create(&state.db, &req, state.config.auth.bcrypt_cost).await?;
    tracing::info!(user_id = user.id, "User registered");
    Ok((StatusCode::CREATED, Json(user)))
}

// GET /api/users/me
async fn me(user: AuthUser) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "id": user.user_id,
        "username": user.username,
    }))
}
