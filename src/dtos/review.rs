use serde::Deserialize;

use crate::store::Page;

pub const DEFAULT_REVIEW_LIMIT: i64 = 5;

#[derive(Debug, Default, Deserialize)]
pub struct CreateReviewRequest {
    #[serde(default)]
    pub header: String,
    #[serde(default)]
    pub comment: String,
    pub rating: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateReviewRequest {
    pub header: Option<String>,
    pub comment: Option<String>,
    pub rating: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReviewListParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl ReviewListParams {
    pub fn page(&self) -> Page {
        Page::new(self.page, self.limit, DEFAULT_REVIEW_LIMIT)
    }
}
