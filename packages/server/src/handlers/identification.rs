use axum::Json;
use axum::body::Body;
use axum::extract::{DefaultBodyLimit, Multipart, Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::models::identification::{
    IdentificationListQuery, IdentificationListResponse, IdentificationResponse, IdentifyResponse,
    SearchQuery, SearchResponse, boat_details, validate_confidence,
};
use crate::state::AppState;
use crate::store::ListParams;
use crate::utils::filename::validate_image_filename;

const DEFAULT_PER_PAGE: u64 = 20;
const MAX_PER_PAGE: u64 = 100;
const DEFAULT_SEARCH_LIMIT: u64 = 50;

pub fn upload_body_limit() -> DefaultBodyLimit {
    DefaultBodyLimit::max(10 * 1024 * 1024) // 10 MB
}

#[utoipa::path(
    post,
    path = "/api/v1/identifications",
    tag = "Identifications",
    operation_id = "identify",
    summary = "Classify an uploaded image and optionally store the result",
    description = "Uploads an image for boat identification. The `image` multipart field is \
        required. An optional `fields` field selects which boat attributes to request \
        (comma-separated); an optional `store` boolean (default true) controls whether the \
        result is persisted. Negative determinations are stored too.",
    request_body(content_type = "multipart/form-data", description = "Image upload with options"),
    responses(
        (status = 200, description = "Classification outcome", body = IdentifyResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 502, description = "Upstream failure (CLASSIFIER_UNAVAILABLE, CLASSIFIER_RESPONSE_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(user_id = auth_user.user_id))]
pub async fn identify(
    auth_user: AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<IdentifyResponse>, AppError> {
    let mut image: Option<(String, Vec<u8>)> = None;
    let mut requested_fields: Vec<String> = Vec::new();
    let mut store_result = true;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        match field.name() {
            Some("image") => {
                let filename = field
                    .file_name()
                    .ok_or_else(|| {
                        AppError::Validation("Image field must have a filename".into())
                    })?
                    .to_string();
                if !field
                    .content_type()
                    .is_some_and(|ct| ct.starts_with("image/"))
                {
                    return Err(AppError::Validation("File must be an image".into()));
                }
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Upload read error: {e}")))?;
                image = Some((filename, bytes.to_vec()));
            }
            Some("fields") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read fields: {e}")))?;
                requested_fields = text
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect();
            }
            Some("store") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read store flag: {e}")))?;
                store_result = text
                    .trim()
                    .parse::<bool>()
                    .map_err(|_| AppError::Validation("store must be true or false".into()))?;
            }
            _ => {} // Ignore unknown fields.
        }
    }

    let (filename, bytes) =
        image.ok_or_else(|| AppError::Validation("Missing 'image' field".into()))?;
    let filename = validate_image_filename(&filename)
        .map_err(|e| AppError::Validation(e.message().into()))?
        .to_string();
    if bytes.is_empty() {
        return Err(AppError::Validation("Uploaded image is empty".into()));
    }

    let outcome = state.classifier.classify(&bytes, &requested_fields).await?;

    let identification_id = if store_result {
        Some(state.store.store(&filename, &bytes, &outcome).await?)
    } else {
        None
    };

    let message =
        (!outcome.is_boat).then(|| "The image does not appear to contain a boat".to_string());

    Ok(Json(IdentifyResponse {
        success: true,
        identification_id,
        filename,
        is_boat: outcome.is_boat,
        boat_details: boat_details(&outcome),
        confidence: outcome.confidence,
        message,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/identifications",
    tag = "Identifications",
    operation_id = "listIdentifications",
    summary = "List identification records",
    description = "Paginated listing of all stored identifications, newest first, with \
        optional filters. Requires the admin role.",
    params(IdentificationListQuery),
    responses(
        (status = 200, description = "One page of records", body = IdentificationListResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = auth_user.user_id))]
pub async fn list_identifications(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<IdentificationListQuery>,
) -> Result<Json<IdentificationListResponse>, AppError> {
    auth_user.require_admin()?;

    let page = Ord::max(query.page.unwrap_or(1), 1);
    let per_page = query
        .per_page
        .unwrap_or(DEFAULT_PER_PAGE)
        .clamp(1, MAX_PER_PAGE);
    if let Some(ref confidence) = query.confidence {
        validate_confidence(confidence)?;
    }

    let params = ListParams {
        limit: per_page,
        offset: (page - 1) * per_page,
        is_boat: query.is_boat,
        make: query.make,
        boat_type: query.boat_type,
        confidence: query.confidence,
    };

    let page_data = state.store.list(&params).await?;
    let total_pages = page_data.total_count.div_ceil(per_page);

    Ok(Json(IdentificationListResponse {
        results: page_data.results.into_iter().map(Into::into).collect(),
        total_count: page_data.total_count,
        page,
        per_page,
        total_pages,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/identifications/{id}",
    tag = "Identifications",
    operation_id = "getIdentification",
    summary = "Get one identification record",
    params(("id" = i32, Path, description = "Identification ID")),
    responses(
        (status = 200, description = "The record", body = IdentificationResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id, id))]
pub async fn get_identification(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<IdentificationResponse>, AppError> {
    let view = state
        .store
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Identification not found".into()))?;

    Ok(Json(view.into()))
}

#[utoipa::path(
    get,
    path = "/api/v1/identifications/{id}/image",
    tag = "Identifications",
    operation_id = "getIdentificationImage",
    summary = "Stream the stored image",
    description = "Serves the raw image bytes with the stored content type. This is also the \
        fallback target emitted when presigned URLs are unavailable.",
    params(("id" = i32, Path, description = "Identification ID")),
    responses(
        (status = 200, description = "Image content"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Record or image missing (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id, id))]
pub async fn get_identification_image(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, AppError> {
    let object = state
        .store
        .image(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Image not found".into()))?;

    let content_type = object
        .content_type
        .unwrap_or_else(|| "application/octet-stream".to_string());

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, object.bytes.len().to_string())
        .header(header::CACHE_CONTROL, "private, max-age=3600")
        .body(Body::from(object.bytes))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))?;

    Ok(response)
}

#[utoipa::path(
    get,
    path = "/api/v1/search",
    tag = "Search",
    operation_id = "searchIdentifications",
    summary = "Search stored boats",
    description = "Case-insensitive substring search over make, model and description. Only \
        records classified as boats are searched; matches are returned newest first.",
    params(SearchQuery),
    responses(
        (status = 200, description = "Matching records", body = SearchResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = auth_user.user_id))]
pub async fn search_identifications(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, AppError> {
    let term = query.q.as_deref().map(str::trim).unwrap_or_default();
    if term.is_empty() {
        return Err(AppError::Validation(
            "Query parameter 'q' must not be empty".into(),
        ));
    }
    let limit = query
        .limit
        .unwrap_or(DEFAULT_SEARCH_LIMIT)
        .clamp(1, MAX_PER_PAGE);

    let views = state.store.search(term, limit).await?;
    let results: Vec<IdentificationResponse> = views.into_iter().map(Into::into).collect();

    Ok(Json(SearchResponse {
        query: term.to_string(),
        count: results.len(),
        results,
    }))
}
