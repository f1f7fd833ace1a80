use async_trait::async_trait;

use super::error::StorageError;

/// A stored object's content plus the content type recorded at write time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

/// Key-addressed object storage with time-limited signed read URLs.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store bytes under `key` with a content type and descriptive metadata.
    ///
    /// Keys are never reused; callers derive a fresh unique key per object.
    async fn put(
        &self,
        key: &str,
        bytes: &[u8],
        content_type: &str,
        metadata: &[(String, String)],
    ) -> Result<(), StorageError>;

    /// Retrieve an object by key.
    async fn get(&self, key: &str) -> Result<StoredObject, StorageError>;

    /// Mint a time-limited read URL for `key`.
    async fn presigned_url(&self, key: &str, ttl_secs: u32) -> Result<String, StorageError>;
}
