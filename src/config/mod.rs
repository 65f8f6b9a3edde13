use serde::Deserialize;
use std::env;
use std::str::FromStr;

// Главная структура конфигурации - контейнер для всех настроек
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub reservations: ReservationsConfig,
    pub auth: AuthConfig,
}

// Настройки приложения
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub rust_log: String,
    pub log_format: LogFormat,
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

// Настройки базы данных
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_size: u32,
    pub acquire_timeout_seconds: u64,
}

// Пагинация списка бронирований
#[derive(Debug, Clone, Deserialize)]
pub struct ReservationsConfig {
    pub page_size: u32,
    pub max_page_size: u32,
}

// Настройки авторизации
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub bcrypt_cost: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has invalid value {value:?}")]
    Invalid { name: &'static str, value: String },
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Собирает конфигурацию из произвольного источника переменных.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let log_format = match var_or("LOG_FORMAT", "pretty").to_lowercase().as_str() {
            "pretty" => LogFormat::Pretty,
            "json" => LogFormat::Json,
            other => {
                return Err(ConfigError::Invalid { name: "LOG_FORMAT", value: other.to_string() })
            }
        };

        let config = Config {
            app: AppConfig {
                host: var_or("HOST", "0.0.0.0"),
                port: parse_var(&lookup, "PORT", "8000")?,
                environment: var_or("ENVIRONMENT", "development"),
                rust_log: var_or("RUST_LOG", "theater_api=debug,tower_http=debug"),
                log_format,
                cors_allowed_origins: var_or("CORS_ALLOWED_ORIGINS", "")
                    .split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty())
                    .map(str::to_string)
                    .collect(),
            },
            database: DatabaseConfig {
                url: lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?,
                pool_size: parse_var(&lookup, "DB_POOL_SIZE", "20")?,
                acquire_timeout_seconds: parse_var(&lookup, "DB_ACQUIRE_TIMEOUT_SECONDS", "5")?,
            },
            reservations: ReservationsConfig {
                page_size: parse_var(&lookup, "RESERVATIONS_PAGE_SIZE", "10")?,
                max_page_size: parse_var(&lookup, "RESERVATIONS_MAX_PAGE_SIZE", "100")?,
            },
            auth: AuthConfig {
                bcrypt_cost: parse_var(&lookup, "BCRYPT_COST", "12")?,
            },
        };

        if config.reservations.page_size == 0
            || config.reservations.page_size > config.reservations.max_page_size
        {
            return Err(ConfigError::Invalid {
                name: "RESERVATIONS_PAGE_SIZE",
                value: config.reservations.page_size.to_string(),
            });
        }

        Ok(config)
    }
}

fn parse_var<F, T>(lookup: &F, name: &'static str, default: &str) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    let value = lookup(name).unwrap_or_else(|| default.to_string());
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid { name, value })
}
