use std::fmt;

/// Errors that can occur during object storage operations.
///
/// The kinds are kept distinct so callers can surface a different
/// user-facing message for each of them.
#[derive(Debug)]
pub enum StorageError {
    /// No object exists under the requested key.
    NotFound(String),
    /// The configured bucket does not exist.
    BucketMissing(String),
    /// The backend rejected the request for lack of permissions.
    AccessDenied(String),
    /// Credentials are absent or could not be resolved.
    CredentialsMissing(String),
    /// Any other backend failure.
    Backend(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(key) => write!(f, "object not found: {key}"),
            Self::BucketMissing(detail) => write!(f, "bucket does not exist: {detail}"),
            Self::AccessDenied(detail) => write!(f, "access denied: {detail}"),
            Self::CredentialsMissing(detail) => write!(f, "credentials missing: {detail}"),
            Self::Backend(detail) => write!(f, "storage backend error: {detail}"),
        }
    }
}

impl std::error::Error for StorageError {}
