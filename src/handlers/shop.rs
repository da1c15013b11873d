use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use crate::dtos::shop::ShopListParams;
use crate::dtos::{ApiResponse, AppJson, Pagination};
use crate::error::AppError;
use crate::middleware::auth::AuthContext;
use crate::models::shop::{Shop, ShopDraft, ShopDraftPatch};
use crate::state::AppState;

pub async fn list_shops(
    State(state): State<AppState>,
    Query(params): Query<ShopListParams>,
) -> Result<Json<ApiResponse<Vec<Shop>>>, AppError> {
    let query = params.into_query()?;
    let (shops, total) = state.shops().list(&query).await?;
    Ok(Json(ApiResponse::list(shops).with_pagination(Pagination::new(query.page, total))))
}

pub async fn get_shop(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Shop>>, AppError> {
    let shop = state.shops().get(id).await?;
    Ok(Json(ApiResponse::ok(shop)))
}

pub async fn create_shop(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppJson(draft): AppJson<ShopDraft>,
) -> Result<(StatusCode, Json<ApiResponse<Shop>>), AppError> {
    let shop = state.shops().create(&auth, draft).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(shop))))
}

pub async fn update_shop(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
    AppJson(patch): AppJson<ShopDraftPatch>,
) -> Result<Json<ApiResponse<Shop>>, AppError> {
    let shop = state.shops().update(&auth, id, patch).await?;
    Ok(Json(ApiResponse::ok(shop)))
}

pub async fn delete_shop(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Shop>>, AppError> {
    let shop = state.shops().delete(&auth, id).await?;
    Ok(Json(ApiResponse::ok(shop).with_message("Shop deleted")))
}
