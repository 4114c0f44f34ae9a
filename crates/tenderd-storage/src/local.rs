use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use uuid::Uuid;

use crate::traits::{SavedBlob, Storage, StorageError, StorageResult};

/// Local filesystem storage. Blobs live under `{base}/{tender_id}/{stored_name}`.
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub async fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path).await?;
        Ok(LocalStorage { base_path })
    }

    /// Reject names that could escape the tender directory.
    fn validate_name(name: &str) -> StorageResult<()> {
        if name.is_empty()
            || name.contains("..")
            || name.contains('/')
            || name.contains('\\')
            || Path::new(name).is_absolute()
        {
            return Err(StorageError::InvalidKey(name.to_string()));
        }
        Ok(())
    }

    fn tender_dir(&self, tender_id: i64) -> PathBuf {
        self.base_path.join(tender_id.to_string())
    }

    fn blob_path(&self, tender_id: i64, stored_name: &str) -> StorageResult<PathBuf> {
        Self::validate_name(stored_name)?;
        Ok(self.tender_dir(tender_id).join(stored_name))
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn put(&self, tender_id: i64, file_name: &str, data: Vec<u8>) -> StorageResult<SavedBlob> {
        Self::validate_name(file_name)?;

        let dir = self.tender_dir(tender_id);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| StorageError::UploadFailed(e.to_string()))?;

        let stored_name = format!("{}_{}", Uuid::new_v4(), file_name);
        let size = data.len() as i64;
        fs::write(dir.join(&stored_name), data)
            .await
            .map_err(|e| StorageError::UploadFailed(e.to_string()))?;

        Ok(SavedBlob {
            path: format!("{}/{}", tender_id, stored_name),
            stored_name,
            size,
        })
    }

    async fn get(&self, tender_id: i64, stored_name: &str) -> StorageResult<Vec<u8>> {
        let path = self.blob_path(tender_id, stored_name)?;
        match fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(format!("{}/{}", tender_id, stored_name)))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, tender_id: i64, stored_name: &str) -> StorageResult<()> {
        let path = self.blob_path(tender_id, stored_name)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(format!("{}/{}", tender_id, stored_name)))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_all(&self, tender_id: i64) -> StorageResult<()> {
        let dir = self.tender_dir(tender_id);
        match fs::remove_dir_all(&dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn storage() -> (tempfile::TempDir, LocalStorage) {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();
        (dir, storage)
    }

    #[tokio::test]
    async fn put_then_get_roundtrips() {
        let (_dir, storage) = storage().await;

        let saved = storage.put(42, "offer.pdf", b"content".to_vec()).await.unwrap();
        assert!(saved.stored_name.ends_with("_offer.pdf"));
        assert_eq!(saved.size, 7);

        let data = storage.get(42, &saved.stored_name).await.unwrap();
        assert_eq!(data, b"content");
    }

    #[tokio::test]
    async fn rejects_path_traversal_names() {
        let (_dir, storage) = storage().await;

        for name in ["../escape", "a/b.txt", "..", ""] {
            assert!(matches!(
                storage.get(1, name).await,
                Err(StorageError::InvalidKey(_))
            ));
        }
        assert!(matches!(
            storage.put(1, "../up.txt", Vec::new()).await,
            Err(StorageError::InvalidKey(_))
        ));
    }

    #[tokio::test]
    async fn missing_blob_is_not_found() {
        let (_dir, storage) = storage().await;
        assert!(matches!(
            storage.get(7, "nope.bin").await,
            Err(StorageError::NotFound(_))
        ));
        assert!(matches!(
            storage.delete(7, "nope.bin").await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn delete_all_removes_the_tender_directory() {
        let (_dir, storage) = storage().await;
        let saved = storage.put(9, "a.txt", b"x".to_vec()).await.unwrap();

        storage.delete_all(9).await.unwrap();
        assert!(matches!(
            storage.get(9, &saved.stored_name).await,
            Err(StorageError::NotFound(_))
        ));

        // second pass is a no-op
        storage.delete_all(9).await.unwrap();
    }
}
