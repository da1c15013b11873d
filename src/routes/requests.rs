use axum::{middleware, routing::{get, patch, put}, Router};

use crate::handlers::request::{
    approve_request, delete_request, edit_reason, edit_request, get_request, list_requests, reject_request,
    submit_request,
};
use crate::middleware::auth::require_auth;
use crate::state::AppState;

/// Every request route needs a caller; role checks happen in the workflow.
pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/requests", get(list_requests).post(submit_request))
        .route("/requests/{id}", get(get_request).put(edit_request).delete(delete_request))
        .route("/requests/{id}/approve", put(approve_request))
        .route("/requests/{id}/reject", put(reject_request))
        .route("/requests/{id}/reason", patch(edit_reason))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
}
