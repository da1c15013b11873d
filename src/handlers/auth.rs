use axum::extract::{Extension, State};
use http::{header, StatusCode};
use axum::Json;

use crate::dtos::user::{LoginRequest, RegisterUserRequest, TokenResponse};
use crate::dtos::{ApiResponse, AppJson};
use crate::error::AppError;
use crate::middleware::auth::AuthContext;
use crate::models::user::User;
use crate::services::AccountService;
use crate::state::AppState;

type SetCookie = [(header::HeaderName, String); 1];

pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterUserRequest>,
) -> Result<(StatusCode, SetCookie, Json<ApiResponse<TokenResponse>>), AppError> {
    let accounts = state.accounts();
    let (user, token) = accounts.register(payload).await?;
    Ok((StatusCode::CREATED, token_cookie(&accounts, &token), Json(ApiResponse::ok(TokenResponse::new(token, &user)))))
}

pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<(SetCookie, Json<ApiResponse<TokenResponse>>), AppError> {
    let accounts = state.accounts();
    let (user, token) = accounts.login(payload).await?;
    tracing::info!(user_id = user.id, "User logged in");
    Ok((token_cookie(&accounts, &token), Json(ApiResponse::ok(TokenResponse::new(token, &user)))))
}

pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<ApiResponse<User>>, AppError> {
    let user = state.accounts().me(auth.user_id).await?;
    Ok(Json(ApiResponse::ok(user)))
}

/// Overwrites the token cookie with a short-lived placeholder.
pub async fn logout(Extension(auth): Extension<AuthContext>) -> (SetCookie, Json<ApiResponse<()>>) {
    tracing::info!(user_id = auth.user_id, "User logged out");
    let cookie = [(header::SET_COOKIE, "token=none; Path=/; Max-Age=10; HttpOnly".to_string())];
    (cookie, Json(ApiResponse { data: None, ..ApiResponse::ok(()) }.with_message("Logged out")))
}

fn token_cookie(accounts: &AccountService, token: &str) -> SetCookie {
    let mut cookie = format!(
        "token={token}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax",
        accounts.cookie_max_age_secs()
    );
    if accounts.secure_cookies() {
        cookie.push_str("; Secure");
    }
    [(header::SET_COOKIE, cookie)]
}
