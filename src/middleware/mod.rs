use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use base64::{Engine as _, engine::general_purpose};
use std::sync::Arc;

use crate::error::AppError;
use crate::models::User;

/// Аутентифицированный пользователь запроса (HTTP Basic).
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i64,
    pub username: String,
}

/// Разбирает заголовок `Basic base64(username:password)`.
pub fn parse_basic_credentials(header_value: &str) -> Option<(String, String)> {
    let encoded = header_value.strip_prefix("Basic ")?;
    let decoded = general_purpose::STANDARD.decode(encoded.trim()).ok()?;
    let credentials = String::from_utf8(decoded).ok()?;

    // Разделяем username:password, пароль может содержать ':'
    let (username, password) = credentials.split_once(':')?;
    if username.is_empty() {
        return None;
    }
    Some((username.to_string(), password.to_string()))
}

// Basic Auth extractor
impl FromRequestParts<Arc<crate::AppState>> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<crate::AppState>
    ) -> Result<Self, Self::Rejection> {
        let (username, password) = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_basic_credentials)
            .ok_or(AppError::Unauthorized)?;

        let user = match User::find_active_by_username(&username, &state.db).await? {
            Some(user) => user,
            None => {
                User::verify_password_without_user(&password, state.config.auth.bcrypt_cost).await;
                tracing::debug!(username = %username, "Unknown user");
                return Err(AppError::Unauthorized);
            }
        };

        if !user.verify_password(&password).await {
            tracing::debug!(username = %username, "Rejected credentials");
            return Err(AppError::Unauthorized);
        }

        // Обновляем last_login, ошибка не критична
        if let Err(e) = user.touch_last_login(&state.db).await {
            tracing::warn!(user_id = user.id, "failed to update last_login: {:?}", e);
        }

        Ok(AuthUser {
            user_id: user.id,
            username: user.username,
        })
    }
}
