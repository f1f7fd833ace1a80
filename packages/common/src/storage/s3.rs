use async_trait::async_trait;
use http::{HeaderMap, HeaderName, HeaderValue};
use s3::creds::Credentials;
use s3::error::S3Error;
use s3::{Bucket, Region};
use serde::Deserialize;
use tracing::info;

use super::error::StorageError;
use super::traits::{ObjectStore, StoredObject};

/// S3-compatible object storage configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct S3Config {
    pub bucket: String,
    pub region: String,
    /// Custom endpoint for MinIO/LocalStack-style deployments.
    pub endpoint: Option<String>,
    /// Force path-style addressing (required by most custom endpoints).
    #[serde(default)]
    pub path_style: bool,
}

/// Object storage backed by an S3-compatible bucket.
///
/// Credentials come from the standard provider chain (environment,
/// profile, instance metadata); a resolution failure surfaces as
/// `StorageError::CredentialsMissing` at construction time.
pub struct S3ObjectStore {
    bucket: Box<Bucket>,
}

impl S3ObjectStore {
    pub fn new(config: &S3Config) -> Result<Self, StorageError> {
        let region = match &config.endpoint {
            Some(endpoint) => Region::Custom {
                region: config.region.clone(),
                endpoint: endpoint.clone(),
            },
            None => config
                .region
                .parse()
                .map_err(|e| StorageError::Backend(format!("invalid region: {e}")))?,
        };

        let credentials =
            Credentials::default().map_err(|e| StorageError::CredentialsMissing(e.to_string()))?;

        let bucket = Bucket::new(&config.bucket, region, credentials).map_err(classify)?;
        let bucket = if config.path_style {
            bucket.with_path_style()
        } else {
            bucket
        };

        info!(bucket = %config.bucket, region = %config.region, "object store initialized");

        Ok(Self { bucket })
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put(
        &self,
        key: &str,
        bytes: &[u8],
        content_type: &str,
        metadata: &[(String, String)],
    ) -> Result<(), StorageError> {
        let mut headers = HeaderMap::new();
        for (name, value) in metadata {
            // Metadata entries that don't form valid header values
            // (e.g. non-ASCII filenames) are skipped, not fatal.
            let Ok(name) = HeaderName::try_from(format!("x-amz-meta-{name}")) else {
                continue;
            };
            let Ok(value) = HeaderValue::from_str(value) else {
                continue;
            };
            headers.insert(name, value);
        }

        let bucket = (*self.bucket)
            .clone()
            .with_extra_headers(headers)
            .map_err(classify)?;
        bucket
            .put_object_with_content_type(key, bytes, content_type)
            .await
            .map_err(classify)?;

        Ok(())
    }

    async fn get(&self, key: &str) -> Result<StoredObject, StorageError> {
        let response = self.bucket.get_object(key).await.map_err(classify)?;
        let content_type = response.headers().get("content-type").cloned();

        Ok(StoredObject {
            bytes: response.bytes().to_vec(),
            content_type,
        })
    }

    async fn presigned_url(&self, key: &str, ttl_secs: u32) -> Result<String, StorageError> {
        self.bucket
            .presign_get(key, ttl_secs, None)
            .await
            .map_err(classify)
    }
}

/// Map a rust-s3 error onto the storage failure taxonomy.
fn classify(err: S3Error) -> StorageError {
    match err {
        S3Error::Credentials(e) => StorageError::CredentialsMissing(e.to_string()),
        S3Error::HttpFailWithBody(403, body) => StorageError::AccessDenied(body),
        S3Error::HttpFailWithBody(404, body) => {
            if body.contains("NoSuchBucket") {
                StorageError::BucketMissing(body)
            } else {
                StorageError::NotFound(body)
            }
        }
        other => StorageError::Backend(other.to_string()),
    }
}
