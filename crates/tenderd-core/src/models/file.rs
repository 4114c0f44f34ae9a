use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

/// Metadata for an uploaded attachment. The physical blob lives in the storage
/// backend keyed by `(tender_id, stored_name)`.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StoredFile {
    #[serde(skip_serializing)]
    pub id: i64,
    #[serde(skip_serializing)]
    pub tender_id: i64,
    /// Original file name as uploaded by the client.
    pub file_name: String,
    /// Generated storage name, unique per tender.
    pub stored_name: String,
    /// Path relative to the upload root.
    #[serde(skip_serializing)]
    pub path: String,
    pub size: i64,
}
