use axum::{middleware, routing::{get, post, put}, Router};

use crate::handlers::shop::{create_shop, delete_shop, get_shop, list_shops, update_shop};
use crate::middleware::auth::require_auth;
use crate::state::AppState;

pub fn routes(state: &AppState) -> Router<AppState> {
    // Browsing is public
    let open = Router::new()
        .route("/shops", get(list_shops))
        .route("/shops/{id}", get(get_shop));

    // Admins only
    let protected = Router::new()
        .route("/shops", post(create_shop))
        .route("/shops/{id}", put(update_shop).delete(delete_shop))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    open.merge(protected)
}
