//! Обертки над экстракторами axum.
//!
//! Стандартные `Json`, `Query` и `Path` отвечают на плохой запрос обычным
//! текстом. Эти обертки переводят отказ в `AppError`, так что клиент всегда
//! получает карту `{"поле": "сообщение"}` или `{"detail": ...}`.

use axum::{
    extract::{
        path::ErrorKind,
        rejection::{JsonRejection, PathRejection, QueryRejection},
        FromRequest, FromRequestParts, Request,
    },
    http::request::Parts,
    response::{IntoResponse, Response},
};
use serde::{de::DeserializeOwned, Serialize};

use crate::error::AppError;

const JSON_PREFIX: &str = "Failed to deserialize the JSON body into the target type: ";
const QUERY_PREFIX: &str = "Failed to deserialize query string: ";
const NON_FIELD: &str = "non_field_errors";

/// JSON-тело запроса и JSON-ответ.
#[derive(Debug, Clone, Copy, Default)]
pub struct Json<T>(pub T);

impl<T, S> FromRequest<S> for Json<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(Json(value)),
            Err(JsonRejection::JsonDataError(err)) => {
                let text = err.body_text();
                Err(field_error(text.strip_prefix(JSON_PREFIX).unwrap_or(&text)))
            }
            Err(other) => Err(AppError::BadRequest(other.body_text())),
        }
    }
}

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Query<T>(pub T);

impl<T, S> FromRequestParts<S> for Query<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match axum::extract::Query::<T>::from_request_parts(parts, state).await {
            Ok(axum::extract::Query(value)) => Ok(Query(value)),
            Err(QueryRejection::FailedToDeserializeQueryString(err)) => {
                let text = err.body_text();
                Err(field_error(text.strip_prefix(QUERY_PREFIX).unwrap_or(&text)))
            }
            Err(other) => Err(AppError::BadRequest(other.body_text())),
        }
    }
}

/// Параметры пути. Единственный безымянный параметр считается полем `id`.
#[derive(Debug, Clone, Copy)]
pub struct Path<T>(pub T);

impl<T, S> FromRequestParts<S> for Path<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match axum::extract::Path::<T>::from_request_parts(parts, state).await {
            Ok(axum::extract::Path(value)) => Ok(Path(value)),
            Err(PathRejection::FailedToDeserializePathParams(err)) => {
                let (field, message) = match err.kind() {
                    ErrorKind::ParseErrorAtKey { key, value, expected_type } => {
                        (key.clone(), format!("cannot parse {value:?} as {expected_type}"))
                    }
                    ErrorKind::ParseError { value, expected_type } => {
                        ("id".to_string(), format!("cannot parse {value:?} as {expected_type}"))
                    }
                    _ => ("id".to_string(), err.body_text()),
                };
                Err(AppError::field(field, message))
            }
            // Параметров нет в маршруте: ошибка сборки роутера, не клиента
            Err(other) => Err(AppError::Internal(other.body_text())),
        }
    }
}

fn field_error(detail: &str) -> AppError {
    let (field, message) = split_field_error(detail);
    AppError::field(field, message)
}

/// Разбирает сообщение serde вида `tickets[0].row: invalid type: ...` на
/// путь к полю и текст ошибки.
fn split_field_error(detail: &str) -> (String, String) {
    let (path, message) = match detail.split_once(": ") {
        // путь к полю не содержит пробелов, текст ошибки содержит
        Some((path, message)) if !path.is_empty() && !path.contains(' ') => (Some(path), message),
        _ => (None, detail),
    };
    let message = message.split(" at line ").next().unwrap_or(message);

    // missing field `x` относится к самому полю x, а не к объекту над ним
    if let Some(name) = message
        .strip_prefix("missing field `")
        .and_then(|rest| rest.split('`').next())
    {
        let field = match path {
            Some(path) => format!("{path}.{name}"),
            None => name.to_string(),
        };
        return (field, "This field is required.".to_string());
    }

    (path.unwrap_or(NON_FIELD).to_string(), message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_type_is_keyed_by_its_path() {
        let (field, message) = split_field_error(
            "tickets[0].row: invalid type: string \"x\", expected i32 at line 1 column 20",
        );
        assert_eq!(field, "tickets[0].row");
        assert_eq!(message, "invalid type: string \"x\", expected i32");
    }

    #[test]
    fn missing_nested_field_names_the_field() {
        let (field, message) =
            split_field_error("tickets[0]: missing field `performance` at line 1 column 22");
        assert_eq!(field, "tickets[0].performance");
        assert_eq!(message, "This field is required.");
    }

    #[test]
    fn missing_top_level_field() {
        let (field, _) = split_field_error("missing field `show_time` at line 1 column 2");
        assert_eq!(field, "show_time");
    }

    #[test]
    fn query_parameter_error() {
        let (field, message) = split_field_error("page: invalid digit found in string");
        assert_eq!(field, "page");
        assert_eq!(message, "invalid digit found in string");
    }

    #[test]
    fn message_without_path_goes_to_non_field_errors() {
        let (field, message) = split_field_error("invalid type: integer `5`, expected a map");
        assert_eq!(field, NON_FIELD);
        assert_eq!(message, "invalid type: integer `5`, expected a map");
    }
}
