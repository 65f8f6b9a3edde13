//! Разбор query-параметров фильтров. Пустое значение = фильтра нет.

use chrono::NaiveDate;

use crate::error::{AppError, AppResult};

/// "3,7" -> [3, 7]
pub fn parse_id_list(field: &str, raw: Option<&str>) -> AppResult<Option<Vec<i64>>> {
    let raw = match raw.map(str::trim) {
        Some(value) if !value.is_empty() => value,
        _ => return Ok(None),
    };

    raw.split(',')
        .map(|part| part.trim().parse::<i64>())
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
        .map_err(|_| AppError::field(field, format!("{field} must be a comma-separated list of integer ids")))
}

pub fn parse_id(field: &str, raw: Option<&str>) -> AppResult<Option<i64>> {
    match raw.map(str::trim) {
        Some(value) if !value.is_empty() => value
            .parse::<i64>()
            .map(Some)
            .map_err(|_| AppError::field(field, format!("{field} must be an integer id"))),
        _ => Ok(None),
    }
}

/// Дата в формате YYYY-MM-DD.
pub fn parse_date(field: &str, raw: Option<&str>) -> AppResult<Option<NaiveDate>> {
    match raw.map(str::trim) {
        Some(value) if !value.is_empty() => NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| AppError::field(field, format!("{field} must be a date in YYYY-MM-DD format"))),
        _ => Ok(None),
    }
}
