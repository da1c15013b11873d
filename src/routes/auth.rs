use axum::{middleware, routing::{get, post}, Router};

use crate::handlers::auth::{login, logout, me, register};
use crate::middleware::auth::require_auth;
use crate::state::AppState;

pub fn routes(state: &AppState) -> Router<AppState> {
    let open = Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login));

    let protected = Router::new()
        .route("/auth/me", get(me))
        .route("/auth/logout", get(logout))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    open.merge(protected)
}
