use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::AppError;
use crate::models::request::{Request, RequestStatus, RequestType, RESERVED_FIELDS};
use crate::models::shop::{ShopDraft, ShopDraftPatch};
use crate::models::user::User;

/// A parsed submission: either `{ shop: {...}, requestType? }` or a flat draft.
#[derive(Debug)]
pub struct SubmitRequestBody {
    pub request_type: RequestType,
    pub payload: ShopDraft,
}

impl SubmitRequestBody {
    /// Discards the workflow-owned keys instead of rejecting them.
    pub fn from_json(body: Value) -> Result<Self, AppError> {
        let mut map = into_object(body)?;
        for key in RESERVED_FIELDS.iter().chain(["user", "submitter", "id"].iter()) {
            if map.remove(*key).is_some() {
                tracing::debug!(field = key, "Dropped system-controlled field from submission");
            }
        }

        let request_type = match map.remove("requestType") {
            None | Some(Value::Null) => RequestType::default(),
            Some(v) => serde_json::from_value(v)
                .map_err(|_| AppError::invalid_argument("requestType must be one of create, update, delete"))?,
        };

        let payload: ShopDraft = serde_json::from_value(draft_object(map)?)
            .map_err(|e| AppError::invalid_argument(format!("Invalid shop payload: {e}")))?;

        Ok(Self { request_type, payload: payload.normalized() })
    }
}

/// Parses an edit body; any workflow-owned key rejects the whole patch.
pub fn patch_from_json(body: Value) -> Result<ShopDraftPatch, AppError> {
    let mut map = into_object(body)?;
    if RESERVED_FIELDS.iter().any(|key| map.contains_key(*key)) {
        return Err(AppError::invalid_argument(
            "You are not allowed to edit 'createdAt', 'status', 'reason' or 'edited' fields",
        ));
    }
    map.remove("requestType");
    serde_json::from_value(draft_object(map)?)
        .map_err(|e| AppError::invalid_argument(format!("Invalid shop payload: {e}")))
}

fn into_object(body: Value) -> Result<Map<String, Value>, AppError> {
    match body {
        Value::Object(map) => Ok(map),
        _ => Err(AppError::invalid_argument("Request body must be a JSON object")),
    }
}

fn draft_object(mut map: Map<String, Value>) -> Result<Value, AppError> {
    match map.remove("shop") {
        Some(shop @ Value::Object(_)) => Ok(shop),
        Some(_) => Err(AppError::invalid_argument("shop must be an object")),
        None => Ok(Value::Object(map)),
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ReasonBody {
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RequestListParams {
    pub status: Option<String>,
}

impl RequestListParams {
    pub fn status(&self) -> Result<Option<RequestStatus>, AppError> {
        self.status
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(|s| s.parse().map_err(AppError::InvalidArgument))
            .transpose()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmitterProfile {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub tel: String,
}

impl From<User> for SubmitterProfile {
    fn from(user: User) -> Self {
        Self { id: user.id, name: user.name, email: user.email, tel: user.tel }
    }
}

/// Single-request view with the submitter's contact details.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestDetail {
    pub id: i64,
    pub submitter: Option<SubmitterProfile>,
    pub shop: ShopDraft,
    pub request_type: RequestType,
    pub status: RequestStatus,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub edited: Option<DateTime<Utc>>,
}

impl RequestDetail {
    pub fn new(request: Request, submitter: Option<SubmitterProfile>) -> Self {
        Self {
            id: request.id,
            submitter,
            shop: request.payload,
            request_type: request.request_type,
            status: request.status,
            reason: request.reason,
            created_at: request.created_at,
            edited: request.edited,
        }
    }
}
