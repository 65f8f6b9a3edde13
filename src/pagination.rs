use serde::{Deserialize, Serialize};

use crate::config::ReservationsConfig;
use crate::error::{AppError, AppResult};

/// Параметры страницы из query string.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

/// Проверенная страница: номер с 1, размер в пределах лимита.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub page_size: i64,
}

#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub count: i64,
    pub next: Option<i64>,
    pub previous: Option<i64>,
    pub results: Vec<T>,
}

impl PageRequest {
    pub fn resolve(params: &PageParams, limits: &ReservationsConfig) -> AppResult<Self> {
        let page = params.page.unwrap_or(1);
        if page < 1 {
            return Err(AppError::field("page", "page must be a positive integer"));
        }

        // 0 или отрицательный размер -> размер по умолчанию, сверху режем по максимуму
        let page_size = match params.page_size {
            Some(size) if size > 0 => size.min(i64::from(limits.max_page_size)),
            _ => i64::from(limits.page_size),
        };

        Ok(PageRequest { page, page_size })
    }

    pub fn limit(&self) -> i64 {
        self.page_size
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.page_size)
    }

    pub fn into_page<T>(self, count: i64, results: Vec<T>) -> Page<T> {
        let next = (self.page.saturating_mul(self.page_size) < count).then_some(self.page + 1);
        let previous = (self.page > 1).then_some(self.page - 1);
        Page { count, next, previous, results }
    }
}
