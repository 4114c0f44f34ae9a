//! HTTP error response conversion
//!
//! Handlers return `Result<impl IntoResponse, HttpError>`; every domain error
//! converts into `HttpError` and renders as a consistent JSON body. Client
//! errors keep their message, server-side failures are reported generically
//! so internal detail never leaks past the log.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use tenderd_core::AppError;
use tenderd_source::SourceError;
use tenderd_storage::StorageError;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    /// Machine-readable error code for programmatic handling
    pub code: String,
}

/// Wrapper type for AppError to implement IntoResponse. Necessary because of
/// Rust's orphan rules: IntoResponse is external, AppError lives in
/// tenderd-core.
#[derive(Debug)]
pub struct HttpError(pub AppError);

impl From<AppError> for HttpError {
    fn from(err: AppError) -> Self {
        HttpError(err)
    }
}

impl From<sqlx::Error> for HttpError {
    fn from(err: sqlx::Error) -> Self {
        HttpError(AppError::Database(err))
    }
}

impl From<StorageError> for HttpError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(key) => HttpError(AppError::NotFound(format!(
                "File not found: {key}"
            ))),
            other => HttpError(AppError::Storage(other.to_string())),
        }
    }
}

impl From<SourceError> for HttpError {
    fn from(err: SourceError) -> Self {
        HttpError(AppError::Upstream(err.to_string()))
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let err = self.0;
        let status = match &err {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::AccessDenied(_) => StatusCode::FORBIDDEN,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::Database(_) | AppError::Storage(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        if err.is_client_error() {
            tracing::debug!(error = %err, code = err.code(), "Request failed");
        } else {
            tracing::error!(error = %err, code = err.code(), "Request failed");
        }

        let message = if status.is_server_error() {
            "Internal server error".to_string()
        } else {
            err.to_string()
        };

        (
            status,
            Json(ErrorResponse {
                error: message,
                code: err.code().to_string(),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_keep_their_message() {
        let response =
            HttpError(AppError::NotFound("Tender not found".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn server_errors_render_as_500_family() {
        let response =
            HttpError(AppError::Storage("disk on fire".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = HttpError(AppError::Upstream("timeout".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn missing_blob_maps_to_not_found() {
        let err: HttpError = StorageError::NotFound("7/a.txt".to_string()).into();
        assert!(matches!(err.0, AppError::NotFound(_)));
    }
}
