use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;

use crate::models::shop::ShopDraft;

pub const MAX_REASON_LEN: usize = 250;
pub const DEFAULT_REJECT_REASON: &str = "No reason provided";

/// Keys a caller may never set on a request; the workflow owns them.
pub const RESERVED_FIELDS: [&str; 4] = ["createdAt", "status", "reason", "edited"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
        }
    }

    /// Whether the workflow permits moving from `self` to `next`.
    pub fn can_transition_to(&self, next: RequestStatus) -> bool {
        matches!(
            (self, next),
            (RequestStatus::Pending, RequestStatus::Approved)
                | (RequestStatus::Pending, RequestStatus::Rejected)
                | (RequestStatus::Rejected, RequestStatus::Pending)
        )
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RequestStatus::Pending),
            "approved" => Ok(RequestStatus::Approved),
            "rejected" => Ok(RequestStatus::Rejected),
            other => Err(format!("Unknown request status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestType {
    #[default]
    Create,
    Update,
    Delete,
}

impl RequestType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestType::Create => "create",
            RequestType::Update => "update",
            RequestType::Delete => "delete",
        }
    }
}

impl FromStr for RequestType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(RequestType::Create),
            "update" => Ok(RequestType::Update),
            "delete" => Ok(RequestType::Delete),
            other => Err(format!("Unknown request type '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub id: i64,
    #[serde(rename = "submitter")]
    pub submitter_id: i64,
    #[serde(rename = "shop")]
    pub payload: ShopDraft,
    pub request_type: RequestType,
    pub status: RequestStatus,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub edited: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewRequest {
    pub submitter_id: i64,
    pub payload: ShopDraft,
    pub request_type: RequestType,
}

#[derive(Debug, Clone, Default)]
pub struct RequestFilter {
    pub submitter_id: Option<i64>,
    pub status: Option<RequestStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmitterRef {
    pub id: i64,
    pub name: String,
}

/// The list projection: no request type and no edit stamp.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestListing {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub submitter: SubmitterRef,
    pub reason: Option<String>,
    pub shop: ShopDraft,
    pub status: RequestStatus,
}
