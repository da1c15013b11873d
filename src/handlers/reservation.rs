use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

use crate::dtos::reservation::{parse_appt_date, ReservationBody};
use crate::dtos::{ApiResponse, AppJson};
use crate::error::AppError;
use crate::middleware::auth::AuthContext;
use crate::models::reservation::Reservation;
use crate::state::AppState;

pub async fn list_reservations(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<ApiResponse<Vec<Reservation>>>, AppError> {
    let reservations = state.reservations().list(&auth, None).await?;
    Ok(Json(ApiResponse::list(reservations)))
}

pub async fn list_shop_reservations(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(shop_id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<Reservation>>>, AppError> {
    let reservations = state.reservations().list(&auth, Some(shop_id)).await?;
    Ok(Json(ApiResponse::list(reservations)))
}

pub async fn get_reservation(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Reservation>>, AppError> {
    let reservation = state.reservations().get(&auth, id).await?;
    Ok(Json(ApiResponse::ok(reservation)))
}

pub async fn create_reservation(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(shop_id): Path<i64>,
    AppJson(body): AppJson<ReservationBody>,
) -> Result<(StatusCode, Json<ApiResponse<Reservation>>), AppError> {
    let appt_date = appt_date(body)?;
    let reservation = state.reservations().create(&auth, shop_id, appt_date).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(reservation))))
}

pub async fn update_reservation(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
    AppJson(body): AppJson<ReservationBody>,
) -> Result<Json<ApiResponse<Reservation>>, AppError> {
    let appt_date = appt_date(body)?;
    let reservation = state.reservations().update(&auth, id, appt_date).await?;
    Ok(Json(ApiResponse::ok(reservation)))
}

pub async fn delete_reservation(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Value>>, AppError> {
    state.reservations().delete(&auth, id).await?;
    Ok(Json(ApiResponse::ok(json!({}))))
}

fn appt_date(body: ReservationBody) -> Result<chrono::NaiveDateTime, AppError> {
    let raw = body
        .appt_date
        .ok_or_else(|| AppError::invalid_argument("Please add a reservation date"))?;
    parse_appt_date(&raw)
}
