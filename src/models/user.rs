use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use chrono::NaiveDateTime;
use std::sync::OnceLock;
use validator::Validate;

use crate::database::Database;
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_active: bool,
    pub date_joined: NaiveDateTime,
    pub last_login: Option<NaiveDateTime>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct NewUser {
    #[validate(length(min = 1, max = 150, message = "username must be 1..150 characters"))]
    pub username: String,
    #[validate(length(min = 8, max = 128, message = "password must be 8..128 characters"))]
    pub password: String,
}

impl User {
    // Найти активного пользователя по имени
    pub async fn find_active_by_username(username: &str, db: &Database) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash, is_active, date_joined, last_login
             FROM users
             WHERE username = $1 AND is_active = true"
        )
        .bind(username)
        .fetch_optional(&db.pool)
        .await
    }

    /// Регистрирует пользователя. Занятое имя -> 409 через uq_users_username.
    pub async fn create(db: &Database, new: &NewUser, bcrypt_cost: u32) -> AppResult<User> {
        let password = new.password.clone();
        // bcrypt тяжелый, уносим с рантайма
        let password_hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, bcrypt_cost))
            .await
            .map_err(|e| AppError::Internal(format!("password hashing task failed: {e}")))?
            .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))?;

        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (username, password_hash)
             VALUES ($1, $2)
             RETURNING id, username, password_hash, is_active, date_joined, last_login"
        )
        .bind(new.username.trim())
        .bind(password_hash)
        .fetch_one(&db.pool)
        .await?;

        Ok(user)
    }

    // Проверить пароль по bcrypt-хешу
    pub async fn verify_password(&self, password: &str) -> bool {
        let password = password.to_string();
        let hash = self.password_hash.clone();
        tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash).unwrap_or(false))
            .await
            .unwrap_or(false)
    }

    /// Проверка пароля для несуществующего пользователя: тратит столько же
    /// времени, сколько настоящая, и всегда возвращает false. Иначе по
    /// времени ответа видно, какие имена зарегистрированы.
    pub async fn verify_password_without_user(password: &str, bcrypt_cost: u32) -> bool {
        let password = password.to_string();
        let _ = tokio::task::spawn_blocking(move || {
            let hash = dummy_hash(bcrypt_cost);
            bcrypt::verify(password, hash).unwrap_or(false)
        })
        .await;
        false
    }

    pub async fn touch_last_login(&self, db: &Database) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET last_login = NOW() WHERE id = $1")
            .bind(self.id)
            .execute(&db.pool)
            .await?;
        Ok(())
    }
}

static DUMMY_HASH: OnceLock<String> = OnceLock::new();

// Хеш считается один раз, с той же стоимостью, что и у настоящих паролей
fn dummy_hash(bcrypt_cost: u32) -> &'static str {
    DUMMY_HASH.get_or_init(|| bcrypt::hash("theater-api-dummy-password", bcrypt_cost).unwrap_or_default())
}
