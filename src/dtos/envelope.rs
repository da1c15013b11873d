use axum::extract::FromRequest;
use serde::Serialize;

use crate::error::AppError;
use crate::store::Page;

/// JSON body extractor whose rejection uses the error envelope.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// Uniform success envelope: `{ success, count?, pagination?, data?, message? }`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self { success: true, count: None, pagination: None, data: Some(data), message: None }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = Some(pagination);
        self
    }
}

impl<T> ApiResponse<Vec<T>> {
    pub fn list(items: Vec<T>) -> Self {
        let count = items.len();
        Self { count: Some(count), ..Self::ok(items) }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct PageRef {
    pub page: i64,
    pub limit: i64,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct Pagination {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<PageRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<PageRef>,
}

impl Pagination {
    pub fn new(page: Page, total: i64) -> Self {
        let next = (page.page.saturating_mul(page.limit) < total)
            .then(|| PageRef { page: page.page + 1, limit: page.limit });
        let prev = (page.offset() > 0).then_some(PageRef { page: page.page - 1, limit: page.limit });
        Self { next, prev }
    }
}
