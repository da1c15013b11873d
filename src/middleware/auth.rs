use axum::extract::{Request, State};
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::auth::jwt::verify_token;
use crate::error::AppError;
use crate::models::user::Role;
use crate::state::AppState;

#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: i64,
    pub role: Role,
    pub name: String,
}

pub async fn require_auth(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let token = match bearer_token(req.headers()).or_else(|| cookie_token(req.headers())) {
        Some(t) => t,
        None => return unauthorized("Not authorized to access this route"),
    };

    let claims = match verify_token(&token, &state.config.jwt_secret) {
        Ok(c) => c,
        Err(e) => {
            tracing::debug!(error = %e, "Rejected token");
            return unauthorized("Not authorized to access this route");
        }
    };

    // Reload so role changes and deleted accounts take effect immediately.
    let user = match state.store.find_user(claims.sub).await {
        Ok(Some(u)) => u,
        Ok(None) => return unauthorized("Not authorized to access this route"),
        Err(e) => return AppError::from(e).into_response(),
    };

    req.extensions_mut().insert(AuthContext {
        user_id: user.id,
        role: user.role,
        name: user.name,
    });

    next.run(req).await
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

fn cookie_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == "token")
        .map(|(_, value)| value.to_string())
        .filter(|t| !t.is_empty() && t != "none")
}

fn unauthorized(msg: &str) -> Response {
    AppError::unauthorized(msg).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn token_is_read_from_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark; token=abc.def.ghi"));
        assert_eq!(cookie_token(&headers).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn logged_out_cookie_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("token=none"));
        assert_eq!(cookie_token(&headers), None);
    }

    #[test]
    fn bearer_prefix_is_required() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Token abc"));
        assert_eq!(bearer_token(&headers), None);
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(bearer_token(&headers).as_deref(), Some("abc"));
    }
}
