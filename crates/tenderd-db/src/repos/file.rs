use sqlx::{PgPool, Postgres};

use tenderd_core::models::StoredFile;
use tenderd_core::AppError;

/// Repository for attachment metadata rows. The physical blobs live in the
/// storage backend; on deletion the row always goes first so a crash can
/// leave an orphan blob but never a dangling reference.
#[derive(Clone)]
pub struct FileRepository {
    pool: PgPool,
}

impl FileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self), fields(db.table = "files", db.operation = "insert", tender_id = tender_id))]
    pub async fn insert(
        &self,
        tender_id: i64,
        file_name: &str,
        stored_name: &str,
        path: &str,
        size: i64,
    ) -> Result<StoredFile, AppError> {
        let file = sqlx::query_as::<Postgres, StoredFile>(
            "INSERT INTO files (tender_id, file_name, stored_name, path, size)
             VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(tender_id)
        .bind(file_name)
        .bind(stored_name)
        .bind(path)
        .bind(size)
        .fetch_one(&self.pool)
        .await?;
        Ok(file)
    }

    #[tracing::instrument(skip(self), fields(db.table = "files", db.operation = "select", tender_id = tender_id))]
    pub async fn find(
        &self,
        tender_id: i64,
        stored_name: &str,
    ) -> Result<Option<StoredFile>, AppError> {
        let file = sqlx::query_as::<Postgres, StoredFile>(
            "SELECT * FROM files WHERE tender_id = $1 AND stored_name = $2",
        )
        .bind(tender_id)
        .bind(stored_name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(file)
    }

    /// Delete one metadata row; returns false when no row matched.
    #[tracing::instrument(skip(self), fields(db.table = "files", db.operation = "delete", tender_id = tender_id))]
    pub async fn delete(&self, tender_id: i64, stored_name: &str) -> Result<bool, AppError> {
        let deleted = sqlx::query("DELETE FROM files WHERE tender_id = $1 AND stored_name = $2")
            .bind(tender_id)
            .bind(stored_name)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(deleted > 0)
    }
}
