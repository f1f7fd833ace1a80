use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::storage::StorageError;
use sea_orm::DbErr;
use serde::Serialize;

use crate::classifier::ClassifierError;

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `TOKEN_MISSING`,
    /// `TOKEN_INVALID`, `INVALID_CREDENTIALS`, `PERMISSION_DENIED`, `NOT_FOUND`,
    /// `USERNAME_TAKEN`, `CLASSIFIER_UNAVAILABLE`, `CLASSIFIER_RESPONSE_INVALID`,
    /// `STORAGE_CREDENTIALS`, `STORAGE_BUCKET_MISSING`, `STORAGE_ACCESS_DENIED`,
    /// `STORAGE_ERROR`, `INTERNAL_ERROR`.
    #[schema(example = "VALIDATION_ERROR")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "File must be an image")]
    pub message: String,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    TokenMissing,
    TokenInvalid,
    InvalidCredentials,
    PermissionDenied,
    NotFound(String),
    UsernameTaken,
    /// The classification upstream could not be reached or failed.
    ClassifierUnavailable(String),
    /// The classification upstream answered with an unparseable payload.
    ClassifierUnparseable(String),
    /// Object storage credentials are missing or unresolvable.
    StorageCredentials(String),
    /// The configured storage bucket does not exist.
    StorageBucketMissing(String),
    /// The storage backend denied access.
    StorageAccessDenied(String),
    /// Any other storage failure.
    Storage(String),
    Internal(String),
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        match self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "VALIDATION_ERROR",
                    message: msg,
                },
            ),
            AppError::TokenMissing => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "TOKEN_MISSING",
                    message: "Authentication required".into(),
                },
            ),
            AppError::TokenInvalid => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "TOKEN_INVALID",
                    message: "Invalid or expired token".into(),
                },
            ),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "INVALID_CREDENTIALS",
                    message: "Invalid username or password".into(),
                },
            ),
            AppError::PermissionDenied => (
                StatusCode::FORBIDDEN,
                ErrorBody {
                    code: "PERMISSION_DENIED",
                    message: "Insufficient permissions".into(),
                },
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    code: "NOT_FOUND",
                    message: msg,
                },
            ),
            AppError::UsernameTaken => (
                StatusCode::CONFLICT,
                ErrorBody {
                    code: "USERNAME_TAKEN",
                    message: "Username is already taken".into(),
                },
            ),
            AppError::ClassifierUnavailable(detail) => {
                tracing::error!("Classification service failure: {}", detail);
                (
                    StatusCode::BAD_GATEWAY,
                    ErrorBody {
                        code: "CLASSIFIER_UNAVAILABLE",
                        message: "The image classification service is unavailable".into(),
                    },
                )
            }
            AppError::ClassifierUnparseable(detail) => {
                tracing::error!("Unparseable classifier response: {}", detail);
                (
                    StatusCode::BAD_GATEWAY,
                    ErrorBody {
                        code: "CLASSIFIER_RESPONSE_INVALID",
                        message: "The image classification service returned an invalid response"
                            .into(),
                    },
                )
            }
            AppError::StorageCredentials(detail) => {
                tracing::error!("Storage credential failure: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "STORAGE_CREDENTIALS",
                        message: "Storage credentials are not configured properly".into(),
                    },
                )
            }
            AppError::StorageBucketMissing(detail) => {
                tracing::error!("Storage bucket missing: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "STORAGE_BUCKET_MISSING",
                        message: "The configured storage bucket does not exist".into(),
                    },
                )
            }
            AppError::StorageAccessDenied(detail) => {
                tracing::error!("Storage access denied: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "STORAGE_ACCESS_DENIED",
                        message: "Access to the storage bucket was denied - check permissions"
                            .into(),
                    },
                )
            }
            AppError::Storage(detail) => {
                tracing::error!("Storage failure: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "STORAGE_ERROR",
                        message: "Failed to store identification result".into(),
                    },
                )
            }
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "INTERNAL_ERROR",
                        message: "An unexpected error occurred".into(),
                    },
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(_) => AppError::NotFound("Stored image not found".into()),
            StorageError::CredentialsMissing(detail) => AppError::StorageCredentials(detail),
            StorageError::BucketMissing(detail) => AppError::StorageBucketMissing(detail),
            StorageError::AccessDenied(detail) => AppError::StorageAccessDenied(detail),
            StorageError::Backend(detail) => AppError::Storage(detail),
        }
    }
}

impl From<ClassifierError> for AppError {
    fn from(err: ClassifierError) -> Self {
        match err {
            ClassifierError::Parse(detail) => AppError::ClassifierUnparseable(detail),
            ClassifierError::Service(detail) => AppError::ClassifierUnavailable(detail),
        }
    }
}
