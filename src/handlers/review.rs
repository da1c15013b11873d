use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

use crate::dtos::review::{CreateReviewRequest, ReviewListParams, UpdateReviewRequest};
use crate::dtos::{ApiResponse, AppJson, Pagination};
use crate::error::AppError;
use crate::middleware::auth::AuthContext;
use crate::models::review::{Review, ReviewListing};
use crate::state::AppState;

pub async fn list_reviews(
    State(state): State<AppState>,
    Path(shop_id): Path<i64>,
    Query(params): Query<ReviewListParams>,
) -> Result<Json<ApiResponse<Vec<ReviewListing>>>, AppError> {
    let page = params.page();
    let (reviews, total) = state.reviews().list(shop_id, page).await?;
    Ok(Json(ApiResponse::list(reviews).with_pagination(Pagination::new(page, total))))
}

pub async fn create_review(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(shop_id): Path<i64>,
    AppJson(body): AppJson<CreateReviewRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Review>>), AppError> {
    let review = state.reviews().create(&auth, shop_id, body).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(review))))
}

pub async fn update_review(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
    AppJson(body): AppJson<UpdateReviewRequest>,
) -> Result<Json<ApiResponse<Review>>, AppError> {
    let review = state.reviews().update(&auth, id, body).await?;
    Ok(Json(ApiResponse::ok(review)))
}

pub async fn delete_review(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    state.reviews().delete(&auth, id).await?;
    Ok(Json(ApiResponse::ok(json!({}))))
}
