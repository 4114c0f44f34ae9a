//! Storage abstraction trait

use async_trait::async_trait;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Blob not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Result of a successful upload.
#[derive(Debug, Clone)]
pub struct SavedBlob {
    /// Generated storage name, unique per tender.
    pub stored_name: String,
    /// Path relative to the storage root.
    pub path: String,
    pub size: i64,
}

/// Blob store keyed by `(tender_id, stored_name)`.
///
/// Writes and deletes here are not transactional with the metadata rows; the
/// repositories delete the row first and callers log blob failures as
/// orphans instead of rolling back.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Store a blob under a freshly generated name derived from `file_name`.
    async fn put(&self, tender_id: i64, file_name: &str, data: Vec<u8>) -> StorageResult<SavedBlob>;

    /// Read a blob back by its stored name.
    async fn get(&self, tender_id: i64, stored_name: &str) -> StorageResult<Vec<u8>>;

    /// Delete a single blob. Missing blobs are an error so callers can log
    /// the mismatch with the metadata store.
    async fn delete(&self, tender_id: i64, stored_name: &str) -> StorageResult<()>;

    /// Delete every blob belonging to a tender. Absence is not an error.
    async fn delete_all(&self, tender_id: i64) -> StorageResult<()>;
}
