use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::storage::memory::MemoryObjectStore;
use common::storage::{ObjectStore, StorageError, StoredObject};
use sea_orm::{DatabaseConnection, DbBackend, MockDatabase, MockExecResult};

use server::classifier::Identification;
use server::entity::boat_identification;
use server::error::AppError;
use server::store::{ImageRef, ResultStore};

fn boat_outcome() -> Identification {
    Identification {
        is_boat: true,
        confidence: Some("medium".to_string()),
        make: Some("Sea Ray".to_string()),
        model: Some("Sundancer 320".to_string()),
        description: Some("White express cruiser".to_string()),
        year: Some("2015".to_string()),
        length: None,
        boat_type: Some("motorboat".to_string()),
        hull_material: None,
        features: vec![],
    }
}

fn not_a_boat_outcome() -> Identification {
    Identification {
        is_boat: false,
        confidence: Some("high".to_string()),
        make: None,
        model: None,
        description: Some("a parked truck".to_string()),
        year: None,
        length: None,
        boat_type: None,
        hull_material: None,
        features: vec![],
    }
}

fn record_from(outcome: &Identification, id: i32, blob_key: &str) -> boat_identification::Model {
    boat_identification::Model {
        id,
        image_filename: "boat.jpg".into(),
        blob_key: blob_key.into(),
        is_boat: outcome.is_boat,
        confidence: outcome.confidence.clone(),
        identification_data: serde_json::to_value(outcome).unwrap(),
        make: outcome.make.clone(),
        model: outcome.model.clone(),
        boat_type: outcome.boat_type.clone(),
        year_estimate: outcome.year.clone(),
        created_at: Utc::now(),
    }
}

/// Mock connection that will satisfy one successful insert returning `record`.
fn db_for_insert(record: boat_identification::Model) -> DatabaseConnection {
    let id = record.id;
    MockDatabase::new(DbBackend::Postgres)
        .append_exec_results([MockExecResult {
            last_insert_id: id as u64,
            rows_affected: 1,
        }])
        .append_query_results([[record]])
        .into_connection()
}

fn db_returning(records: Vec<boat_identification::Model>) -> DatabaseConnection {
    MockDatabase::new(DbBackend::Postgres)
        .append_query_results([records])
        .into_connection()
}

struct FailingStore;

#[async_trait]
impl ObjectStore for FailingStore {
    async fn put(
        &self,
        _key: &str,
        _bytes: &[u8],
        _content_type: &str,
        _metadata: &[(String, String)],
    ) -> Result<(), StorageError> {
        Err(StorageError::AccessDenied("bucket policy".into()))
    }

    async fn get(&self, key: &str) -> Result<StoredObject, StorageError> {
        Err(StorageError::NotFound(key.to_string()))
    }

    async fn presigned_url(&self, key: &str, _ttl_secs: u32) -> Result<String, StorageError> {
        Err(StorageError::NotFound(key.to_string()))
    }
}

#[tokio::test]
async fn store_writes_the_blob_and_returns_the_assigned_id() {
    let outcome = boat_outcome();
    let memory = Arc::new(MemoryObjectStore::new());
    let objects: Arc<dyn ObjectStore> = memory.clone();
    let store = ResultStore::new(
        db_for_insert(record_from(&outcome, 7, "boat-images/2026/08/06/key.jpg")),
        objects,
    );

    let id = store.store("boat.jpg", b"jpeg bytes", &outcome).await.unwrap();

    assert_eq!(id, 7);
    let keys = memory.keys();
    assert_eq!(keys.len(), 1);
    assert!(keys[0].starts_with("boat-images/"));
    assert!(keys[0].ends_with(".jpg"));
}

#[tokio::test]
async fn blob_metadata_describes_the_upload() {
    let outcome = boat_outcome();
    let memory = Arc::new(MemoryObjectStore::new());
    let objects: Arc<dyn ObjectStore> = memory.clone();
    let store = ResultStore::new(
        db_for_insert(record_from(&outcome, 1, "boat-images/2026/08/06/key.jpg")),
        objects,
    );

    store.store("boat.jpg", b"jpeg bytes", &outcome).await.unwrap();

    let key = memory.keys().remove(0);
    let metadata = memory.metadata(&key).unwrap();
    assert!(metadata.contains(&("original-filename".to_string(), "boat.jpg".to_string())));
    assert!(metadata.contains(&("is-boat".to_string(), "true".to_string())));
    assert!(metadata.contains(&("confidence".to_string(), "medium".to_string())));
}

#[tokio::test]
async fn storing_two_results_with_the_same_filename_uses_distinct_keys() {
    let outcome = boat_outcome();
    let memory = Arc::new(MemoryObjectStore::new());
    let objects: Arc<dyn ObjectStore> = memory.clone();

    let db = MockDatabase::new(DbBackend::Postgres)
        .append_exec_results([
            MockExecResult {
                last_insert_id: 1,
                rows_affected: 1,
            },
            MockExecResult {
                last_insert_id: 2,
                rows_affected: 1,
            },
        ])
        .append_query_results([[record_from(&outcome, 1, "k1.jpg")]])
        .append_query_results([[record_from(&outcome, 2, "k2.jpg")]])
        .into_connection();
    let store = ResultStore::new(db, objects);

    let first = store.store("boat.jpg", b"one", &outcome).await.unwrap();
    let second = store.store("boat.jpg", b"two", &outcome).await.unwrap();

    assert_ne!(first, second);
    let keys = memory.keys();
    assert_eq!(keys.len(), 2);
    assert_ne!(keys[0], keys[1]);
}

#[tokio::test]
async fn a_negative_determination_is_stored_not_rejected() {
    let outcome = not_a_boat_outcome();
    let memory = Arc::new(MemoryObjectStore::new());
    let objects: Arc<dyn ObjectStore> = memory.clone();
    let store = ResultStore::new(
        db_for_insert(record_from(&outcome, 3, "boat-images/2026/08/06/key.png")),
        objects,
    );

    let id = store.store("truck.png", b"png bytes", &outcome).await.unwrap();

    assert_eq!(id, 3);
    let key = memory.keys().remove(0);
    let metadata = memory.metadata(&key).unwrap();
    assert!(metadata.contains(&("is-boat".to_string(), "false".to_string())));
}

#[tokio::test]
async fn a_failed_blob_write_surfaces_its_kind_and_creates_no_record() {
    let outcome = boat_outcome();
    // No results appended: any insert attempt would also fail loudly.
    let db = MockDatabase::new(DbBackend::Postgres).into_connection();
    let store = ResultStore::new(db, Arc::new(FailingStore));

    let err = store
        .store("boat.jpg", b"jpeg bytes", &outcome)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::StorageAccessDenied(_)));
}

#[tokio::test]
async fn get_of_a_missing_id_is_none_not_an_error() {
    let store = ResultStore::new(db_returning(vec![]), Arc::new(MemoryObjectStore::new()));

    let result = store.get(42).await.unwrap();

    assert!(result.is_none());
}

#[tokio::test]
async fn get_resolves_a_presigned_image_url() {
    let outcome = boat_outcome();
    let blob_key = "boat-images/2026/08/06/key.jpg";
    let memory = Arc::new(MemoryObjectStore::new());
    memory
        .put(blob_key, b"jpeg bytes", "image/jpeg", &[])
        .await
        .unwrap();
    let objects: Arc<dyn ObjectStore> = memory;
    let store = ResultStore::new(db_returning(vec![record_from(&outcome, 7, blob_key)]), objects);

    let view = store.get(7).await.unwrap().unwrap();

    assert_eq!(view.id, 7);
    assert_eq!(view.identification_data["make"], "Sea Ray");
    match view.image {
        ImageRef::Presigned(url) => assert!(url.contains(blob_key)),
        other => panic!("expected a presigned URL, got {other:?}"),
    }
}

#[tokio::test]
async fn presign_failure_degrades_to_the_internal_path_silently() {
    let outcome = boat_outcome();
    let blob_key = "boat-images/2026/08/06/key.jpg";
    let memory = Arc::new(MemoryObjectStore::without_presigning());
    memory
        .put(blob_key, b"jpeg bytes", "image/jpeg", &[])
        .await
        .unwrap();
    let objects: Arc<dyn ObjectStore> = memory;
    let store = ResultStore::new(db_returning(vec![record_from(&outcome, 9, blob_key)]), objects);

    let view = store.get(9).await.unwrap().unwrap();

    assert_eq!(
        view.image,
        ImageRef::FallbackPath("/api/v1/identifications/9/image".to_string())
    );
}

#[tokio::test]
async fn image_streams_the_stored_bytes() {
    let outcome = boat_outcome();
    let blob_key = "boat-images/2026/08/06/key.jpg";
    let memory = Arc::new(MemoryObjectStore::new());
    memory
        .put(blob_key, b"jpeg bytes", "image/jpeg", &[])
        .await
        .unwrap();
    let objects: Arc<dyn ObjectStore> = memory;
    let store = ResultStore::new(db_returning(vec![record_from(&outcome, 5, blob_key)]), objects);

    let object = store.image(5).await.unwrap().unwrap();

    assert_eq!(object.bytes, b"jpeg bytes");
    assert_eq!(object.content_type.as_deref(), Some("image/jpeg"));
}

#[tokio::test]
async fn image_with_a_missing_blob_is_none() {
    let outcome = boat_outcome();
    let store = ResultStore::new(
        db_returning(vec![record_from(&outcome, 5, "gone.jpg")]),
        Arc::new(MemoryObjectStore::new()),
    );

    let result = store.image(5).await.unwrap();

    assert!(result.is_none());
}
