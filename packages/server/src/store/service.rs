use std::sync::Arc;

use chrono::{DateTime, Utc};
use common::storage::{ObjectStore, StorageError, StoredObject};
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Condition, Func, LikeExpr, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ExprTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::classifier::Identification;
use crate::entity::boat_identification;
use crate::error::AppError;
use crate::models::shared::escape_like;

/// TTL for presigned image URLs.
const PRESIGN_TTL_SECS: u32 = 3600;

/// Key prefix for stored images.
const KEY_PREFIX: &str = "boat-images";

/// Reference to a stored image, resolved anew on every read.
///
/// Minting a presigned URL can fail independently of the read itself.
/// The fallback points at the same-origin streaming endpoint and is
/// substituted silently; a failed mint is never a request failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageRef {
    Presigned(String),
    FallbackPath(String),
}

impl ImageRef {
    pub fn into_url(self) -> String {
        match self {
            Self::Presigned(url) => url,
            Self::FallbackPath(path) => path,
        }
    }
}

/// Read view over one identification record.
#[derive(Debug, Clone)]
pub struct IdentificationView {
    pub id: i32,
    pub image: ImageRef,
    pub filename: String,
    pub created_at: DateTime<Utc>,
    pub identification_data: serde_json::Value,
    pub is_boat: bool,
}

/// Filters and pagination for `list`. Filters are conjunctive; `make`
/// and `boat_type` match as case-insensitive substrings, `is_boat` and
/// `confidence` exactly.
#[derive(Debug, Clone, Default)]
pub struct ListParams {
    pub limit: u64,
    pub offset: u64,
    pub is_boat: Option<bool>,
    pub make: Option<String>,
    pub boat_type: Option<String>,
    pub confidence: Option<String>,
}

/// One page of list results. `total_count` is the filtered set size
/// before pagination, independent of limit and offset.
#[derive(Debug)]
pub struct ListPage {
    pub results: Vec<IdentificationView>,
    pub total_count: u64,
    pub page_size: u64,
    pub offset: u64,
}

/// Single authoritative gateway between the classification pipeline and
/// durable storage; the only component that writes identification
/// records. Constructed once at startup and cloned into request state.
#[derive(Clone)]
pub struct ResultStore {
    db: DatabaseConnection,
    objects: Arc<dyn ObjectStore>,
}

impl ResultStore {
    pub fn new(db: DatabaseConnection, objects: Arc<dyn ObjectStore>) -> Self {
        Self { db, objects }
    }

    /// Persist one classification outcome: image blob first, then the
    /// relational record. A failed blob write leaves no record; a failed
    /// insert leaves an orphan blob (accepted, not compensated).
    ///
    /// Negative determinations are stored like positive ones.
    #[instrument(skip(self, image, outcome), fields(filename = %filename, is_boat = outcome.is_boat))]
    pub async fn store(
        &self,
        filename: &str,
        image: &[u8],
        outcome: &Identification,
    ) -> Result<i32, AppError> {
        let now = Utc::now();
        let blob_key = derive_blob_key(filename, now);
        let content_type = mime_guess::from_path(filename)
            .first()
            .map(|m| m.to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let metadata = [
            ("original-filename".to_string(), filename.to_string()),
            ("upload-timestamp".to_string(), now.to_rfc3339()),
            ("is-boat".to_string(), outcome.is_boat.to_string()),
            (
                "confidence".to_string(),
                outcome
                    .confidence
                    .clone()
                    .unwrap_or_else(|| "unknown".to_string()),
            ),
        ];

        self.objects
            .put(&blob_key, image, &content_type, &metadata)
            .await?;

        let payload = serde_json::to_value(outcome)
            .map_err(|e| AppError::Internal(format!("payload serialization failed: {e}")))?;

        // Denormalized columns are derived from the payload here, in the
        // same insert, and never written again.
        let record = boat_identification::ActiveModel {
            image_filename: Set(filename.to_string()),
            blob_key: Set(blob_key),
            is_boat: Set(outcome.is_boat),
            confidence: Set(outcome.confidence.clone()),
            identification_data: Set(payload),
            make: Set(outcome.make.clone()),
            model: Set(outcome.model.clone()),
            boat_type: Set(outcome.boat_type.clone()),
            year_estimate: Set(outcome.year.clone()),
            created_at: Set(now),
            ..Default::default()
        };

        let inserted = record.insert(&self.db).await?;
        Ok(inserted.id)
    }

    /// Look up one record by id. Absence is an expected outcome, not an
    /// error.
    pub async fn get(&self, id: i32) -> Result<Option<IdentificationView>, AppError> {
        let Some(record) = boat_identification::Entity::find_by_id(id)
            .one(&self.db)
            .await?
        else {
            return Ok(None);
        };

        Ok(Some(self.view(record).await))
    }

    /// List records with optional conjunctive filters, newest first.
    pub async fn list(&self, params: &ListParams) -> Result<ListPage, AppError> {
        let mut select = boat_identification::Entity::find();

        if let Some(is_boat) = params.is_boat {
            select = select.filter(boat_identification::Column::IsBoat.eq(is_boat));
        }
        if let Some(term) = normalized(&params.make) {
            select = select.filter(contains_ci(boat_identification::Column::Make, &term));
        }
        if let Some(term) = normalized(&params.boat_type) {
            select = select.filter(contains_ci(boat_identification::Column::BoatType, &term));
        }
        if let Some(ref confidence) = params.confidence {
            select = select.filter(boat_identification::Column::Confidence.eq(confidence));
        }

        let total_count = select.clone().count(&self.db).await?;

        // id is the tie-break so equal timestamps still yield a total order.
        let records = select
            .order_by_desc(boat_identification::Column::CreatedAt)
            .order_by_desc(boat_identification::Column::Id)
            .offset(Some(params.offset))
            .limit(Some(params.limit))
            .all(&self.db)
            .await?;

        let mut results = Vec::with_capacity(records.len());
        for record in records {
            results.push(self.view(record).await);
        }

        Ok(ListPage {
            results,
            total_count,
            page_size: params.limit,
            offset: params.offset,
        })
    }

    /// Case-insensitive substring search over make, model and the payload
    /// description. Only positive determinations match; all matches rank
    /// equally, newest first.
    pub async fn search(
        &self,
        term: &str,
        limit: u64,
    ) -> Result<Vec<IdentificationView>, AppError> {
        let pattern = like_pattern(term);
        let description = Expr::cust("identification_data ->> 'description'");

        let records = boat_identification::Entity::find()
            .filter(boat_identification::Column::IsBoat.eq(true))
            .filter(
                Condition::any()
                    .add(
                        Expr::expr(Func::lower(Expr::col(boat_identification::Column::Make)))
                            .like(LikeExpr::new(pattern.clone()).escape('\\')),
                    )
                    .add(
                        Expr::expr(Func::lower(Expr::col(boat_identification::Column::Model)))
                            .like(LikeExpr::new(pattern.clone()).escape('\\')),
                    )
                    .add(
                        Expr::expr(Func::lower(description))
                            .like(LikeExpr::new(pattern).escape('\\')),
                    ),
            )
            .order_by_desc(boat_identification::Column::CreatedAt)
            .limit(Some(limit))
            .all(&self.db)
            .await?;

        let mut results = Vec::with_capacity(records.len());
        for record in records {
            results.push(self.view(record).await);
        }
        Ok(results)
    }

    /// Fetch the stored image bytes for the same-origin streaming
    /// endpoint. A missing record and a missing blob both read as absent.
    pub async fn image(&self, id: i32) -> Result<Option<StoredObject>, AppError> {
        let Some(record) = boat_identification::Entity::find_by_id(id)
            .one(&self.db)
            .await?
        else {
            return Ok(None);
        };

        match self.objects.get(&record.blob_key).await {
            Ok(object) => Ok(Some(object)),
            Err(StorageError::NotFound(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn view(&self, record: boat_identification::Model) -> IdentificationView {
        let image = self.image_ref(record.id, &record.blob_key).await;
        IdentificationView {
            id: record.id,
            image,
            filename: record.image_filename,
            created_at: record.created_at,
            identification_data: record.identification_data,
            is_boat: record.is_boat,
        }
    }

    async fn image_ref(&self, id: i32, blob_key: &str) -> ImageRef {
        match self.objects.presigned_url(blob_key, PRESIGN_TTL_SECS).await {
            Ok(url) => ImageRef::Presigned(url),
            Err(err) => {
                warn!(id, error = %err, "presigned URL unavailable, falling back to internal image path");
                ImageRef::FallbackPath(fallback_image_path(id))
            }
        }
    }
}

/// Same-origin path the HTTP layer resolves by streaming the blob.
pub fn fallback_image_path(id: i32) -> String {
    format!("/api/v1/identifications/{id}/image")
}

/// Derive a fresh blob key: time-partitioned prefix from the write
/// instant (never a client timestamp), a random unique token, and the
/// lowercased file extension.
fn derive_blob_key(filename: &str, now: DateTime<Utc>) -> String {
    let date_path = now.format("%Y/%m/%d");
    let token = Uuid::new_v4();
    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
        .unwrap_or_else(|| "bin".to_string());

    format!("{KEY_PREFIX}/{date_path}/{token}.{extension}")
}

fn normalized(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn contains_ci(column: boat_identification::Column, term: &str) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col(column))).like(LikeExpr::new(like_pattern(term)).escape('\\'))
}

fn like_pattern(term: &str) -> String {
    format!("%{}%", escape_like(term.trim()).to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blob_keys_are_time_partitioned_with_lowercase_extensions() {
        let now = "2026-08-06T12:30:00Z".parse::<DateTime<Utc>>().unwrap();
        let key = derive_blob_key("My Boat.JPG", now);

        assert!(key.starts_with("boat-images/2026/08/06/"));
        assert!(key.ends_with(".jpg"));
    }

    #[test]
    fn identical_filenames_produce_distinct_keys() {
        let now = Utc::now();
        let a = derive_blob_key("boat.png", now);
        let b = derive_blob_key("boat.png", now);
        assert_ne!(a, b);
    }

    #[test]
    fn extensionless_filenames_get_a_fallback_extension() {
        let key = derive_blob_key("noext", Utc::now());
        assert!(key.ends_with(".bin"));
    }

    #[test]
    fn like_patterns_escape_wildcards_and_lowercase() {
        assert_eq!(like_pattern("Sea Ray"), "%sea ray%");
        assert_eq!(like_pattern("100%_sure"), "%100\\%\\_sure%");
        assert_eq!(like_pattern("  padded  "), "%padded%");
    }

    #[test]
    fn fallback_path_targets_the_streaming_endpoint() {
        assert_eq!(
            fallback_image_path(7),
            "/api/v1/identifications/7/image"
        );
    }

    #[test]
    fn image_ref_resolves_to_a_single_url() {
        let presigned = ImageRef::Presigned("https://bucket/key?sig=abc".into());
        assert_eq!(presigned.into_url(), "https://bucket/key?sig=abc");

        let fallback = ImageRef::FallbackPath(fallback_image_path(3));
        assert_eq!(fallback.into_url(), "/api/v1/identifications/3/image");
    }
}
