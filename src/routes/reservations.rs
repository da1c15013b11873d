use axum::{middleware, routing::get, Router};

use crate::handlers::reservation::{
    create_reservation, delete_reservation, get_reservation, list_reservations, list_shop_reservations,
    update_reservation,
};
use crate::middleware::auth::require_auth;
use crate::state::AppState;

pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/reservations", get(list_reservations))
        .route(
            "/reservations/{id}",
            get(get_reservation).put(update_reservation).delete(delete_reservation),
        )
        .route("/shops/{id}/reservations", get(list_shop_reservations).post(create_reservation))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
}
