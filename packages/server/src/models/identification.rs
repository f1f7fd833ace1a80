use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::classifier::Identification;
use crate::error::AppError;
use crate::store::IdentificationView;

/// Query parameters for the identification listing.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct IdentificationListQuery {
    /// 1-based page number.
    pub page: Option<u64>,
    /// Items per page (clamped to 1-100).
    pub per_page: Option<u64>,
    /// Exact match on the classification outcome.
    pub is_boat: Option<bool>,
    /// Case-insensitive substring match on the make.
    pub make: Option<String>,
    /// Case-insensitive substring match on the boat type.
    pub boat_type: Option<String>,
    /// Exact match: `high`, `medium` or `low`.
    pub confidence: Option<String>,
}

/// Query parameters for free-text search.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct SearchQuery {
    /// Search term, matched against make, model and description.
    pub q: Option<String>,
    /// Maximum results (clamped to 1-100, default 50).
    pub limit: Option<u64>,
}

/// One stored identification record as returned to clients.
#[derive(Serialize, utoipa::ToSchema)]
pub struct IdentificationResponse {
    pub id: i32,
    /// Presigned image URL, or a same-origin fallback path when URL
    /// minting is unavailable.
    pub image_url: String,
    pub filename: String,
    pub created_at: DateTime<Utc>,
    /// The full classification payload as stored.
    #[schema(value_type = Object)]
    pub identification_data: serde_json::Value,
    pub is_boat: bool,
}

impl From<IdentificationView> for IdentificationResponse {
    fn from(view: IdentificationView) -> Self {
        Self {
            id: view.id,
            image_url: view.image.into_url(),
            filename: view.filename,
            created_at: view.created_at,
            identification_data: view.identification_data,
            is_boat: view.is_boat,
        }
    }
}

/// Paginated identification listing.
#[derive(Serialize, utoipa::ToSchema)]
pub struct IdentificationListResponse {
    pub results: Vec<IdentificationResponse>,
    /// Filtered record count before pagination.
    pub total_count: u64,
    pub page: u64,
    pub per_page: u64,
    pub total_pages: u64,
}

/// Outcome of a classification request.
#[derive(Serialize, utoipa::ToSchema)]
pub struct IdentifyResponse {
    pub success: bool,
    /// Assigned record id; absent when storing was skipped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identification_id: Option<i32>,
    pub filename: String,
    pub is_boat: bool,
    /// Boat attributes reported by the classifier, for positive
    /// determinations only.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub boat_details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Search results.
#[derive(Serialize, utoipa::ToSchema)]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<IdentificationResponse>,
    pub count: usize,
}

/// Validate a confidence filter value.
pub fn validate_confidence(value: &str) -> Result<(), AppError> {
    match value {
        "high" | "medium" | "low" => Ok(()),
        _ => Err(AppError::Validation(
            "confidence must be one of: high, medium, low".into(),
        )),
    }
}

/// Boat attributes for the identify response: the outcome minus the
/// flag and confidence already surfaced at the top level.
pub fn boat_details(outcome: &Identification) -> Option<serde_json::Value> {
    if !outcome.is_boat {
        return None;
    }

    let mut value = serde_json::to_value(outcome).ok()?;
    if let Some(object) = value.as_object_mut() {
        object.remove("is_boat");
        object.remove("confidence");
    }
    Some(value)
}
