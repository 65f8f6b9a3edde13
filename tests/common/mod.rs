#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, Response, StatusCode};
use axum::Router;
use base64::{engine::general_purpose, Engine as _};
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::PgPool;
use tower::ServiceExt;

use theater_api::config::Config;
use theater_api::database::Database;
use theater_api::AppState;

/// Конфигурация для тестов: минимальная стоимость bcrypt, остальное по умолчанию.
pub fn test_config() -> Config {
    Config::from_lookup(|key| match key {
        "DATABASE_URL" => Some("postgres://localhost/unused".to_string()),
        "BCRYPT_COST" => Some("4".to_string()),
        _ => None,
    })
    .expect("test config must be valid")
}

pub fn build_test_app(pool: PgPool) -> Router {
    let state = Arc::new(AppState {
        db: Database::from_pool(pool),
        config: test_config(),
    });
    theater_api::app(state)
}

pub fn basic_auth(username: &str, password: &str) -> String {
    let token = general_purpose::STANDARD.encode(format!("{username}:{password}"));
    format!("Basic {token}")
}

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
    auth: Option<&str>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    app.clone().oneshot(request).await.unwrap()
}

pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, None).await
}

pub async fn post_json(app: &Router, uri: &str, body: Value) -> Response<Body> {
    send(app, Method::POST, uri, Some(body), None).await
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Отправляет запрос и проверяет статус, возвращая JSON-тело.
pub async fn expect_json(response: Response<Body>, status: StatusCode) -> Value {
    assert_eq!(response.status(), status);
    body_json(response).await
}

// ---------------------------------------------------------------------------
// Seed helpers: пишем напрямую в БД, минуя HTTP
// ---------------------------------------------------------------------------

pub async fn create_user(pool: &PgPool, username: &str, password: &str) -> i64 {
    let hash = bcrypt::hash(password, 4).unwrap();
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO users (username, password_hash) VALUES ($1, $2) RETURNING id",
    )
    .bind(username)
    .bind(hash)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn create_hall(pool: &PgPool, name: &str, rows: i32, seats_in_row: i32) -> i64 {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO theater_halls (name, rows, seats_in_row) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(name)
    .bind(rows)
    .bind(seats_in_row)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn create_play(pool: &PgPool, title: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO plays (title, description) VALUES ($1, '') RETURNING id",
    )
    .bind(title)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn create_performance(pool: &PgPool, play_id: i64, hall_id: i64, show_time: &str) -> i64 {
    let show_time = chrono::NaiveDateTime::parse_from_str(show_time, "%Y-%m-%dT%H:%M:%S").unwrap();
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO performances (show_time, play_id, theater_hall_id) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(show_time)
    .bind(play_id)
    .bind(hall_id)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn count_tickets(pool: &PgPool) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM tickets")
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn count_reservations(pool: &PgPool) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM reservations")
        .fetch_one(pool)
        .await
        .unwrap()
}
