//! Request approval workflow.
//!
//! A request moves `pending -> approved`, `pending -> rejected`, and back from
//! `rejected -> pending` when its submitter edits it. Approval creates the
//! shop and flips the status inside one unit of work.
use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;

use crate::auth::policy::{allowed, has_role};
use crate::dtos::request::{patch_from_json, RequestDetail, SubmitRequestBody, SubmitterProfile};
use crate::error::AppError;
use crate::middleware::auth::AuthContext;
use crate::models::request::{
    NewRequest, Request, RequestFilter, RequestListing, RequestStatus, DEFAULT_REJECT_REASON, MAX_REASON_LEN,
};
use crate::models::shop::Shop;
use crate::models::user::Role;
use crate::services::provisioning::provision;
use crate::store::Store;

#[derive(Clone)]
pub struct RequestWorkflow {
    store: Arc<dyn Store>,
}

impl RequestWorkflow {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn submit(&self, caller: &AuthContext, body: Value) -> Result<Request, AppError> {
        if caller.role != Role::ShopOwner {
            return Err(AppError::unauthorized(format!(
                "User {} is not authorized to create request",
                caller.user_id
            )));
        }

        let body = SubmitRequestBody::from_json(body)?;
        AppError::check(body.payload.validate())?;

        let request = self
            .store
            .insert_request(NewRequest {
                submitter_id: caller.user_id,
                payload: body.payload,
                request_type: body.request_type,
            })
            .await?;

        tracing::info!(request_id = request.id, submitter = caller.user_id, "Request submitted");
        Ok(request)
    }

    pub async fn list(
        &self,
        caller: &AuthContext,
        status: Option<RequestStatus>,
    ) -> Result<Vec<RequestListing>, AppError> {
        let submitter_id = match caller.role {
            Role::Admin => None,
            Role::ShopOwner => Some(caller.user_id),
            Role::User => {
                return Err(AppError::unauthorized(format!(
                    "User {} is not authorized to view requests",
                    caller.user_id
                )))
            }
        };

        let requests = self.store.list_requests(&RequestFilter { submitter_id, status }).await?;
        Ok(requests)
    }

    pub async fn get(&self, caller: &AuthContext, id: i64) -> Result<RequestDetail, AppError> {
        if !has_role(caller.role, &[Role::Admin, Role::ShopOwner]) {
            return Err(not_authorized(caller, id));
        }

        let request = self.load(id).await?;
        if !allowed(caller.role, request.submitter_id, caller.user_id) {
            return Err(not_authorized(caller, id));
        }

        let submitter = self.store.find_user(request.submitter_id).await?.map(SubmitterProfile::from);
        Ok(RequestDetail::new(request, submitter))
    }

    /// Creates the shop and marks the request approved, or neither.
    pub async fn approve(&self, caller: &AuthContext, id: i64) -> Result<Shop, AppError> {
        require_admin(caller, "approve requests")?;

        let request = self.load(id).await?;
        ensure_transition(&request, RequestStatus::Approved)?;

        let mut uow = self.store.begin().await?;
        if !uow.transition_request(id, RequestStatus::Pending, RequestStatus::Approved).await? {
            // Lost a race with another reviewer; dropping the uow rolls back.
            return Err(AppError::invalid_state(format!("Request {id} is no longer pending")));
        }

        let shop = match provision(uow.as_mut(), &request.payload).await {
            Ok(shop) => shop,
            Err(err @ AppError::Validation(_)) => return Err(err),
            Err(err) => {
                tracing::warn!(request_id = id, error = %err, "Provisioning aborted approval");
                return Err(AppError::internal(format!("Shop provisioning failed: {err}")));
            }
        };

        uow.commit()
            .await
            .map_err(|e| AppError::internal(format!("Shop provisioning failed: {e}")))?;

        tracing::info!(request_id = id, shop_id = shop.id, admin = caller.user_id, "Request approved");
        Ok(shop)
    }

    pub async fn reject(&self, caller: &AuthContext, id: i64, reason: Option<String>) -> Result<Request, AppError> {
        require_admin(caller, "reject requests")?;

        let reason = match reason.map(|r| r.trim().to_string()).filter(|r| !r.is_empty()) {
            Some(r) => check_reason(r)?,
            None => DEFAULT_REJECT_REASON.to_string(),
        };

        let mut request = self.load(id).await?;
        ensure_transition(&request, RequestStatus::Rejected)?;

        request.status = RequestStatus::Rejected;
        request.reason = Some(reason);
        let request = self.save(request, RequestStatus::Pending).await?;

        tracing::info!(request_id = id, admin = caller.user_id, "Request rejected");
        Ok(request)
    }

    /// Replaces the reason on a rejected request and nothing else.
    pub async fn edit_reason(
        &self,
        caller: &AuthContext,
        id: i64,
        reason: Option<String>,
    ) -> Result<Request, AppError> {
        require_admin(caller, "edit request reasons")?;

        let reason = reason.ok_or_else(|| AppError::invalid_argument("Reason must be a string"))?;
        let reason = check_reason(reason)?;

        let mut request = self.load(id).await?;
        if request.status != RequestStatus::Rejected {
            return Err(AppError::invalid_state(format!(
                "Only rejected requests can have their reason edited; request is {}",
                request.status
            )));
        }

        request.reason = Some(reason);
        let request = self.save(request, RequestStatus::Rejected).await?;

        tracing::info!(request_id = id, admin = caller.user_id, "Request reason edited");
        Ok(request)
    }

    /// Merges `patch` into the payload and resubmits the request as pending.
    pub async fn edit_payload(&self, caller: &AuthContext, id: i64, patch: Value) -> Result<Request, AppError> {
        let mut request = self.load(id).await?;
        if request.submitter_id != caller.user_id {
            return Err(not_authorized(caller, id));
        }

        let patch = patch_from_json(patch)?;
        // Editing a pending request keeps it pending; otherwise it is a resubmission.
        let previous = request.status;
        if previous != RequestStatus::Pending && !previous.can_transition_to(RequestStatus::Pending) {
            return Err(AppError::invalid_state(format!("{previous} requests can not be edited")));
        }

        request.payload.merge(patch);
        request.payload = request.payload.normalized();
        AppError::check(request.payload.validate())?;

        request.status = RequestStatus::Pending;
        request.edited = Some(Utc::now());
        let request = self.save(request, previous).await?;

        tracing::info!(request_id = id, submitter = caller.user_id, "Request edited and resubmitted");
        Ok(request)
    }

    pub async fn delete(&self, caller: &AuthContext, id: i64) -> Result<Request, AppError> {
        let request = self.load(id).await?;
        if request.submitter_id != caller.user_id {
            return Err(not_authorized(caller, id));
        }
        ensure_deletable(&request)?;

        if !self.store.delete_request(id).await? {
            return Err(AppError::invalid_state(format!("Request {id} can no longer be deleted")));
        }

        tracing::info!(request_id = id, submitter = caller.user_id, "Request deleted");
        Ok(request)
    }

    async fn load(&self, id: i64) -> Result<Request, AppError> {
        self.store
            .find_request(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Request not found with id of {id}")))
    }

    async fn save(&self, request: Request, expected: RequestStatus) -> Result<Request, AppError> {
        let id = request.id;
        self.store
            .save_request(&request, expected)
            .await?
            .ok_or_else(|| AppError::invalid_state(format!("Request {id} changed concurrently; reload and retry")))
    }
}

fn require_admin(caller: &AuthContext, action: &str) -> Result<(), AppError> {
    if caller.role == Role::Admin {
        Ok(())
    } else {
        Err(AppError::forbidden(format!("Only admins can {action}")))
    }
}

fn not_authorized(caller: &AuthContext, id: i64) -> AppError {
    AppError::unauthorized(format!("User {} is not authorized to access request {id}", caller.user_id))
}

fn ensure_transition(request: &Request, next: RequestStatus) -> Result<(), AppError> {
    if request.status.can_transition_to(next) {
        Ok(())
    } else {
        Err(AppError::invalid_state(format!("Request already {}", request.status)))
    }
}

fn ensure_deletable(request: &Request) -> Result<(), AppError> {
    match request.status {
        RequestStatus::Approved => Err(AppError::invalid_state("Approved requests can not be deleted")),
        RequestStatus::Pending | RequestStatus::Rejected => Ok(()),
    }
}

fn check_reason(reason: String) -> Result<String, AppError> {
    if reason.chars().count() > MAX_REASON_LEN {
        return Err(AppError::invalid_argument(format!(
            "Reason can not be more than {MAX_REASON_LEN} characters"
        )));
    }
    Ok(reason)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_in(status: RequestStatus) -> Request {
        Request {
            id: 1,
            submitter_id: 2,
            payload: Default::default(),
            request_type: Default::default(),
            status,
            reason: None,
            created_at: Utc::now(),
            edited: None,
        }
    }

    #[test]
    fn decisions_only_leave_pending() {
        use RequestStatus::*;
        assert!(ensure_transition(&request_in(Pending), Approved).is_ok());
        assert!(ensure_transition(&request_in(Pending), Rejected).is_ok());
        for (from, to) in [(Approved, Rejected), (Rejected, Approved), (Rejected, Rejected), (Approved, Approved)] {
            let err = ensure_transition(&request_in(from), to).unwrap_err();
            assert!(matches!(err, AppError::InvalidState(ref msg) if msg == &format!("Request already {from}")));
        }
    }

    #[test]
    fn long_reason_is_refused() {
        assert!(check_reason("x".repeat(MAX_REASON_LEN)).is_ok());
        assert!(matches!(
            check_reason("x".repeat(MAX_REASON_LEN + 1)),
            Err(AppError::InvalidArgument(_))
        ));
    }
}
