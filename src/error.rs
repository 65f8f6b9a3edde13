//! error.rs
//!
//! Единый тип ошибок HTTP-слоя. Любой обработчик возвращает `AppResult<T>`,
//! а `IntoResponse` превращает ошибку в JSON-ответ:
//! - ошибки валидации отдаются объектом `{"поле": "сообщение"}`;
//! - все остальные ошибки отдаются как `{"detail": "..."}`.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::collections::BTreeMap;

/// Сообщения об ошибках по полям запроса.
pub type FieldErrors = BTreeMap<String, String>;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Некорректные данные запроса, с привязкой к полям.
    #[error("validation failed: {0:?}")]
    Validation(FieldErrors),

    /// Тело или параметры запроса не разобрать (битый JSON, не тот Content-Type).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Конфликт с уже сохраненными данными (например, место занято).
    #[error("{0}")]
    Conflict(String),

    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// Нет или неверные учетные данные.
    #[error("authentication credentials were not provided or are invalid")]
    Unauthorized,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Ошибка валидации одного поля.
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.into(), message.into());
        AppError::Validation(errors)
    }

    pub fn not_found(entity: &'static str, id: i64) -> Self {
        AppError::NotFound { entity, id }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let fields = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let message = errs
                    .iter()
                    .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                    .next()
                    .unwrap_or_else(|| format!("invalid value for {field}"));
                (field.to_string(), message)
            })
            .collect();
        AppError::Validation(fields)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Validation(fields) => (StatusCode::BAD_REQUEST, json!(fields)),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "detail": msg })),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, json!({ "detail": msg })),
            AppError::NotFound { entity, id } => (
                StatusCode::NOT_FOUND,
                json!({ "detail": format!("{entity} with id {id} not found") }),
            ),
            AppError::Unauthorized => {
                let body = json!({ "detail": "Authentication credentials were not provided or are invalid." });
                return (
                    StatusCode::UNAUTHORIZED,
                    [(header::WWW_AUTHENTICATE, "Basic realm=\"api\"")],
                    Json(body),
                )
                    .into_response();
            }
            AppError::Database(err) => classify_sqlx_error(&err),
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "detail": "An internal error occurred" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Раскладывает ошибку sqlx по HTTP-статусам.
///
/// - `RowNotFound` -> 404;
/// - нарушение уникальности (23505) на ограничении `uq_*` -> 409;
/// - нарушение CHECK (23514) -> 400;
/// - взаимоблокировка (40P01) или сбой сериализации (40001) -> 409;
/// - остальное -> 500 без подробностей наружу.
fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, serde_json::Value) {
    match err {
        sqlx::Error::RowNotFound => (StatusCode::NOT_FOUND, json!({ "detail": "Not found." })),
        sqlx::Error::Database(db_err) => {
            let constraint = db_err.constraint().unwrap_or("unknown");
            match db_err.code().as_deref() {
                Some("23505") if constraint.starts_with("uq_") => (
                    StatusCode::CONFLICT,
                    json!({ "detail": format!("Duplicate value violates unique constraint: {constraint}") }),
                ),
                Some("23514") => (
                    StatusCode::BAD_REQUEST,
                    json!({ "detail": format!("Value violates check constraint: {constraint}") }),
                ),
                code if is_transaction_conflict(code) => {
                    tracing::warn!(error = %db_err, "Transaction aborted by a concurrent one");
                    (
                        StatusCode::CONFLICT,
                        json!({ "detail": "Conflicting concurrent request, please retry." }),
                    )
                }
                _ => {
                    tracing::error!(error = %db_err, "Database error");
                    internal()
                }
            }
        }
        other => {
            tracing::error!(error = %other, "Database error");
            internal()
        }
    }
}

fn internal() -> (StatusCode, serde_json::Value) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({ "detail": "An internal error occurred" }),
    )
}

// Postgres прервал транзакцию из-за встречной блокировки или сериализации
fn is_transaction_conflict(code: Option<&str>) -> bool {
    matches!(code, Some("40P01") | Some("40001"))
}

/// Проверяет, что ошибка sqlx - нарушение указанного ограничения уникальности.
pub fn is_unique_violation(err: &sqlx::Error, constraint: &str) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.code().as_deref() == Some("23505") && db_err.constraint() == Some(constraint)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn error_to_response(err: AppError) -> (StatusCode, Response, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let (parts, body) = response.into_parts();
        let bytes = body.collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        (status, Response::from_parts(parts, axum::body::Body::empty()), json)
    }

    #[tokio::test]
    async fn validation_error_is_a_field_map() {
        let err = AppError::field("row", "row number must be in available range: (1, rows): (1, 12)");
        let (status, _, json) = error_to_response(err).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["row"], "row number must be in available range: (1, rows): (1, 12)");
    }

    #[tokio::test]
    async fn not_found_names_entity_and_id() {
        let (status, _, json) = error_to_response(AppError::not_found("Performance", 42)).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["detail"], "Performance with id 42 not found");
    }

    #[tokio::test]
    async fn conflict_returns_409() {
        let (status, _, json) = error_to_response(AppError::Conflict("seat taken".into())).await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["detail"], "seat taken");
    }

    #[tokio::test]
    async fn unauthorized_asks_for_basic_auth() {
        let (status, response, _) = error_to_response(AppError::Unauthorized).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(response.headers().contains_key(header::WWW_AUTHENTICATE));
    }

    #[tokio::test]
    async fn internal_error_is_sanitized() {
        let err = AppError::Internal("connection string with password".into());
        let (status, _, json) = error_to_response(err).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["detail"], "An internal error occurred");
    }

    #[tokio::test]
    async fn row_not_found_maps_to_404() {
        let (status, _, _) = error_to_response(AppError::Database(sqlx::Error::RowNotFound)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn bad_request_is_a_detail() {
        let (status, _, json) = error_to_response(AppError::BadRequest("Expected request with `Content-Type: application/json`".into())).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["detail"].is_string());
    }

    #[test]
    fn deadlock_and_serialization_failures_are_conflicts() {
        assert!(is_transaction_conflict(Some("40P01")));
        assert!(is_transaction_conflict(Some("40001")));
        assert!(!is_transaction_conflict(Some("23505")));
        assert!(!is_transaction_conflict(None));
    }

    #[test]
    fn unique_violation_check_ignores_other_errors() {
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound, "uq_tickets_performance_row_seat"));
    }
}
