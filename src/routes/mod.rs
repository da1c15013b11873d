pub mod auth;
pub mod requests;
pub mod reservations;
pub mod reviews;
pub mod shops;

use axum::Router;

use crate::state::AppState;

pub fn create_router(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(auth::routes(state))
        .merge(requests::routes(state))
        .merge(shops::routes(state))
        .merge(reservations::routes(state))
        .merge(reviews::routes(state))
}
