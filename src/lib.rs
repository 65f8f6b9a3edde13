pub mod config;
pub mod database;
pub mod error;
pub mod extract;
pub mod models;
pub mod controllers;
pub mod middleware;
pub mod pagination;
pub mod services;

use axum::{http::HeaderValue, routing::get, Router};
use std::sync::Arc;
use tower_http::{cors::{AllowOrigin, Any, CorsLayer}, trace::TraceLayer};

// Shared state для всего приложения
#[derive(Clone)]
pub struct AppState {
    pub db: database::Database,
    pub config: config::Config,
}

impl AppState {
    pub async fn new(config: config::Config) -> Result<Arc<Self>, Box<dyn std::error::Error + Send + Sync>> {
        let db = database::Database::new(
            &config.database.url,
            config.database.pool_size,
            config.database.acquire_timeout_seconds,
        )
        .await?;

        db.run_migrations().await?;

        Ok(Arc::new(Self { db, config }))
    }
}

/// Собирает роутер приложения: служебные маршруты и API под /api.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(|| async { "Theater API v1.0" }))
        .route("/health", get(|| async { "OK" }))
        .nest("/api", controllers::routes())
        .with_state(state.clone())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config.app.cors_allowed_origins))
}

// Без настроенных origin'ов разрешаем всех (удобно для разработки)
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(AllowOrigin::list(origins))
    }
}
