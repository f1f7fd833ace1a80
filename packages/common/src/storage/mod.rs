mod error;
mod traits;

pub mod memory;
pub mod s3;

pub use error::StorageError;
pub use s3::{S3Config, S3ObjectStore};
pub use traits::{ObjectStore, StoredObject};
