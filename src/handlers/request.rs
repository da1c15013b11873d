use axum::body::Bytes;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::Value;

use crate::dtos::request::{ReasonBody, RequestDetail, RequestListParams};
use crate::dtos::{ApiResponse, AppJson};
use crate::error::AppError;
use crate::middleware::auth::AuthContext;
use crate::models::request::{Request, RequestListing};
use crate::models::shop::Shop;
use crate::state::AppState;

pub async fn submit_request(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppJson(body): AppJson<Value>,
) -> Result<(StatusCode, Json<ApiResponse<Request>>), AppError> {
    let request = state.workflow().submit(&auth, body).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(request))))
}

pub async fn list_requests(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(params): Query<RequestListParams>,
) -> Result<Json<ApiResponse<Vec<RequestListing>>>, AppError> {
    let requests = state.workflow().list(&auth, params.status()?).await?;
    Ok(Json(ApiResponse::list(requests)))
}

pub async fn get_request(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<RequestDetail>>, AppError> {
    let request = state.workflow().get(&auth, id).await?;
    Ok(Json(ApiResponse::ok(request)))
}

pub async fn edit_request(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
    AppJson(patch): AppJson<Value>,
) -> Result<Json<ApiResponse<Request>>, AppError> {
    let request = state.workflow().edit_payload(&auth, id, patch).await?;
    Ok(Json(ApiResponse::ok(request)))
}

pub async fn delete_request(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Request>>, AppError> {
    let request = state.workflow().delete(&auth, id).await?;
    Ok(Json(ApiResponse::ok(request).with_message("Request deleted")))
}

pub async fn approve_request(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Shop>>, AppError> {
    let shop = state.workflow().approve(&auth, id).await?;
    Ok(Json(ApiResponse::ok(shop).with_message(format!("Request {id} approved"))))
}

/// The body is optional; without one the default reason is used.
pub async fn reject_request(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
    body: Bytes,
) -> Result<Json<ApiResponse<Request>>, AppError> {
    let reason = if body.iter().all(u8::is_ascii_whitespace) {
        None
    } else {
        serde_json::from_slice::<ReasonBody>(&body)
            .map_err(|e| AppError::invalid_argument(format!("Invalid reject body: {e}")))?
            .reason
    };
    let request = state.workflow().reject(&auth, id, reason).await?;
    Ok(Json(ApiResponse::ok(request)))
}

pub async fn edit_reason(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
    AppJson(body): AppJson<ReasonBody>,
) -> Result<Json<ApiResponse<Request>>, AppError> {
    let request = state.workflow().edit_reason(&auth, id, body.reason).await?;
    Ok(Json(ApiResponse::ok(request)))
}
