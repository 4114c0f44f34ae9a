//! Login and token rotation.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use utoipa::ToSchema;

use tenderd_core::AppError;

use crate::auth::TokenPair;
use crate::error::{ErrorResponse, HttpError};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub access_token: String,
    pub refresh_token: String,
}

#[utoipa::path(
    get,
    path = "/auth",
    tag = "auth",
    responses(
        (status = 200, description = "Token pair issued", body = TokenPair),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LoginQuery>,
) -> Result<Json<TokenPair>, HttpError> {
    let email = query.email.as_deref().unwrap_or_default();
    let username = query.username.as_deref().unwrap_or_default();
    if email.is_empty() && username.is_empty() {
        return Err(HttpError(AppError::InvalidArgument(
            "Email or username must be provided".to_string(),
        )));
    }

    let user = if !email.is_empty() {
        state.users.find_by_email(email).await?
    } else {
        state.users.find_by_username(username).await?
    };
    let user = user.ok_or_else(|| HttpError(AppError::NotFound("User not found".to_string())))?;

    let matches = bcrypt::verify(&query.password, &user.password_hash)
        .map_err(|e| HttpError(AppError::Internal(format!("Password check failed: {e}"))))?;
    if !matches {
        return Err(HttpError(AppError::Unauthorized(
            "Invalid credentials".to_string(),
        )));
    }

    Ok(Json(state.auth.issue_pair(&user)?))
}

#[utoipa::path(
    post,
    path = "/auth/refresh",
    tag = "auth",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Rotated token pair", body = TokenPair),
        (status = 401, description = "Invalid token pair", body = ErrorResponse)
    )
)]
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<TokenPair>, HttpError> {
    let refresh_claims = state.auth.verify_refresh(&request.refresh_token)?;
    let access_claims = state.auth.verify_expired_access(&request.access_token)?;

    if refresh_claims.sub != access_claims.sub {
        return Err(HttpError(AppError::Unauthorized(
            "Refresh and access tokens don't match".to_string(),
        )));
    }

    let user = state
        .users
        .find_by_email(&refresh_claims.sub)
        .await?
        .ok_or_else(|| HttpError(AppError::NotFound("User not found".to_string())))?;

    Ok(Json(state.auth.issue_pair(&user)?))
}
