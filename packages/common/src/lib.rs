pub mod storage;

pub use storage::{ObjectStore, StorageError, StoredObject};
