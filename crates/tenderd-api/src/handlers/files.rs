//! Attachment upload, download, and deletion.
//!
//! User endpoints require the caller to own the tender; admin variants only
//! require the tender to exist. Deletion removes the metadata row first, then
//! the blob, and logs a mismatch instead of failing the request.

use std::sync::Arc;

use axum::extract::{Multipart, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use tenderd_core::models::StoredFile;
use tenderd_core::AppError;
use tenderd_storage::StorageError;

use crate::auth::{require_admin, CurrentUser};
use crate::error::{ErrorResponse, HttpError};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadQuery {
    pub tender_id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileQuery {
    pub tender_id: i64,
    pub stored_name: String,
}

async fn ensure_owned(state: &AppState, user_id: i64, tender_id: i64) -> Result<(), HttpError> {
    if state.tenders.exists_owned(tender_id, user_id).await? {
        Ok(())
    } else {
        Err(HttpError(AppError::AccessDenied(
            "Access denied to tender".to_string(),
        )))
    }
}

async fn ensure_exists(state: &AppState, tender_id: i64) -> Result<(), HttpError> {
    if state.tenders.exists(tender_id).await? {
        Ok(())
    } else {
        Err(HttpError(AppError::NotFound("Tender not found".to_string())))
    }
}

/// Write the blob, then the metadata row.
async fn store_upload(
    state: &AppState,
    tender_id: i64,
    mut multipart: Multipart,
) -> Result<StoredFile, HttpError> {
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        HttpError(AppError::InvalidArgument(format!("Broken multipart body: {e}")))
    })? {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| HttpError(AppError::InvalidArgument("Missing file name".to_string())))?;
        let data = field.bytes().await.map_err(|e| {
            HttpError(AppError::InvalidArgument(format!("Broken multipart body: {e}")))
        })?;

        let saved = state.storage.put(tender_id, &file_name, data.to_vec()).await?;
        let stored = state
            .files
            .insert(
                tender_id,
                &file_name,
                &saved.stored_name,
                &saved.path,
                saved.size,
            )
            .await?;
        return Ok(stored);
    }

    Err(HttpError(AppError::InvalidArgument(
        "Missing 'file' field in multipart body".to_string(),
    )))
}

async fn load_download(
    state: &AppState,
    tender_id: i64,
    stored_name: &str,
) -> Result<impl IntoResponse, HttpError> {
    let meta = state
        .files
        .find(tender_id, stored_name)
        .await?
        .ok_or_else(|| HttpError(AppError::NotFound("File not found".to_string())))?;

    let data = state.storage.get(tender_id, stored_name).await?;

    Ok((
        [
            (
                header::CONTENT_TYPE,
                "application/octet-stream".to_string(),
            ),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", meta.file_name),
            ),
        ],
        data,
    ))
}

/// Row first, then blob. A missing blob is logged as a storage mismatch, the
/// request still succeeds once the row is gone.
async fn remove_file(
    state: &AppState,
    tender_id: i64,
    stored_name: &str,
) -> Result<StatusCode, HttpError> {
    if !state.files.delete(tender_id, stored_name).await? {
        return Err(HttpError(AppError::NotFound("File not found".to_string())));
    }

    match state.storage.delete(tender_id, stored_name).await {
        Ok(()) => {}
        Err(StorageError::NotFound(key)) => {
            tracing::error!(%key, "File row existed but its blob was already gone");
        }
        Err(e) => {
            tracing::error!(tender_id, stored_name, error = %e, "Orphaned blob left behind after file deletion");
        }
    }
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/file",
    tag = "files",
    responses(
        (status = 200, description = "Stored file metadata", body = StoredFile),
        (status = 403, description = "Caller does not own the tender", body = ErrorResponse)
    )
)]
pub async fn upload(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<UploadQuery>,
    multipart: Multipart,
) -> Result<Json<StoredFile>, HttpError> {
    ensure_owned(&state, user.id, query.tender_id).await?;
    Ok(Json(store_upload(&state, query.tender_id, multipart).await?))
}

#[utoipa::path(
    get,
    path = "/file",
    tag = "files",
    responses(
        (status = 200, description = "File content"),
        (status = 404, description = "File not found", body = ErrorResponse)
    )
)]
pub async fn download(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<FileQuery>,
) -> Result<impl IntoResponse, HttpError> {
    ensure_owned(&state, user.id, query.tender_id).await?;
    load_download(&state, query.tender_id, &query.stored_name).await
}

#[utoipa::path(
    delete,
    path = "/file",
    tag = "files",
    responses(
        (status = 204, description = "File deleted"),
        (status = 404, description = "File not found", body = ErrorResponse)
    )
)]
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<FileQuery>,
) -> Result<StatusCode, HttpError> {
    ensure_owned(&state, user.id, query.tender_id).await?;
    remove_file(&state, query.tender_id, &query.stored_name).await
}

#[utoipa::path(
    post,
    path = "/file/admin",
    tag = "files",
    responses(
        (status = 200, description = "Stored file metadata", body = StoredFile),
        (status = 404, description = "Tender not found", body = ErrorResponse)
    )
)]
pub async fn admin_upload(
    State(state): State<Arc<AppState>>,
    CurrentUser(admin): CurrentUser,
    Query(query): Query<UploadQuery>,
    multipart: Multipart,
) -> Result<Json<StoredFile>, HttpError> {
    require_admin(&admin)?;
    ensure_exists(&state, query.tender_id).await?;
    Ok(Json(store_upload(&state, query.tender_id, multipart).await?))
}

#[utoipa::path(
    get,
    path = "/file/admin",
    tag = "files",
    responses(
        (status = 200, description = "File content"),
        (status = 404, description = "File or tender not found", body = ErrorResponse)
    )
)]
pub async fn admin_download(
    State(state): State<Arc<AppState>>,
    CurrentUser(admin): CurrentUser,
    Query(query): Query<FileQuery>,
) -> Result<impl IntoResponse, HttpError> {
    require_admin(&admin)?;
    ensure_exists(&state, query.tender_id).await?;
    load_download(&state, query.tender_id, &query.stored_name).await
}

#[utoipa::path(
    delete,
    path = "/file/admin",
    tag = "files",
    responses(
        (status = 204, description = "File deleted"),
        (status = 404, description = "File or tender not found", body = ErrorResponse)
    )
)]
pub async fn admin_delete(
    State(state): State<Arc<AppState>>,
    CurrentUser(admin): CurrentUser,
    Query(query): Query<FileQuery>,
) -> Result<StatusCode, HttpError> {
    require_admin(&admin)?;
    ensure_exists(&state, query.tender_id).await?;
    remove_file(&state, query.tender_id, &query.stored_name).await
}
