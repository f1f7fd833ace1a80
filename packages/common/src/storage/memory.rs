use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use super::error::StorageError;
use super::traits::{ObjectStore, StoredObject};

struct Entry {
    object: StoredObject,
    metadata: Vec<(String, String)>,
}

/// In-memory object store for tests and local development.
///
/// Presigned URLs are synthetic (`memory://{key}?ttl={secs}`). Construct
/// with [`MemoryObjectStore::without_presigning`] to make URL minting fail
/// and exercise caller fallback paths.
pub struct MemoryObjectStore {
    objects: RwLock<HashMap<String, Entry>>,
    presigning: bool,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
            presigning: true,
        }
    }

    pub fn without_presigning() -> Self {
        Self {
            presigning: false,
            ..Self::new()
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.read().contains_key(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    /// Metadata recorded for `key` at put time, if the key exists.
    pub fn metadata(&self, key: &str) -> Option<Vec<(String, String)>> {
        self.read().get(key).map(|entry| entry.metadata.clone())
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, Entry>> {
        self.objects.read().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for MemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(
        &self,
        key: &str,
        bytes: &[u8],
        content_type: &str,
        metadata: &[(String, String)],
    ) -> Result<(), StorageError> {
        let entry = Entry {
            object: StoredObject {
                bytes: bytes.to_vec(),
                content_type: Some(content_type.to_string()),
            },
            metadata: metadata.to_vec(),
        };
        self.objects
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), entry);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<StoredObject, StorageError> {
        self.read()
            .get(key)
            .map(|entry| entry.object.clone())
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    async fn presigned_url(&self, key: &str, ttl_secs: u32) -> Result<String, StorageError> {
        if !self.presigning {
            return Err(StorageError::Backend(
                "presigned URLs are disabled for this store".to_string(),
            ));
        }
        if !self.contains(key) {
            return Err(StorageError::NotFound(key.to_string()));
        }
        Ok(format!("memory://{key}?ttl={ttl_secs}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_get_round_trip() {
        let store = MemoryObjectStore::new();
        store
            .put("boat-images/a.jpg", b"jpeg bytes", "image/jpeg", &[])
            .await
            .unwrap();

        let object = store.get("boat-images/a.jpg").await.unwrap();
        assert_eq!(object.bytes, b"jpeg bytes");
        assert_eq!(object.content_type.as_deref(), Some("image/jpeg"));
    }

    #[tokio::test]
    async fn get_missing_key_is_not_found() {
        let store = MemoryObjectStore::new();
        let result = store.get("missing").await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn metadata_is_recorded() {
        let store = MemoryObjectStore::new();
        let metadata = vec![("original-filename".to_string(), "boat.png".to_string())];
        store
            .put("key.png", b"png", "image/png", &metadata)
            .await
            .unwrap();

        assert_eq!(store.metadata("key.png"), Some(metadata));
    }

    #[tokio::test]
    async fn presigned_url_embeds_key_and_ttl() {
        let store = MemoryObjectStore::new();
        store.put("key.png", b"png", "image/png", &[]).await.unwrap();

        let url = store.presigned_url("key.png", 3600).await.unwrap();
        assert!(url.contains("key.png"));
        assert!(url.contains("3600"));
    }

    #[tokio::test]
    async fn presigned_url_for_missing_key_is_not_found() {
        let store = MemoryObjectStore::new();
        let result = store.presigned_url("missing", 60).await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn presigning_can_be_disabled() {
        let store = MemoryObjectStore::without_presigning();
        store.put("key.png", b"png", "image/png", &[]).await.unwrap();

        let result = store.presigned_url("key.png", 60).await;
        assert!(matches!(result, Err(StorageError::Backend(_))));
    }
}
