//! User self-service and the admin user surface.
//!
//! Registration and admin patching both guard the ADMIN tag: it can never be
//! granted through a payload, and an admin record can only be modified by
//! that admin themselves.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use tenderd_core::models::{Role, User, UserPatch, UserStatus};
use tenderd_core::AppError;

use crate::auth::{require_admin, CurrentUser, TokenPair};
use crate::error::{ErrorResponse, HttpError};
use crate::handlers::split_page_params;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(length(min = 1))]
    pub surname: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 3))]
    pub username: String,
    #[validate(length(min = 6))]
    pub password: String,
    pub status: Option<UserStatus>,
    pub roles: Option<Vec<Role>>,
}

#[derive(Debug, Deserialize)]
pub struct UserIdQuery {
    pub id: i64,
}

fn hash_password(password: &str) -> Result<String, HttpError> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST)
        .map_err(|e| HttpError(AppError::Internal(format!("Password hashing failed: {e}"))))
}

fn dedup_roles(requested: &[Role]) -> Vec<Role> {
    let mut roles = Vec::new();
    for role in requested {
        if !roles.contains(role) {
            roles.push(*role);
        }
    }
    roles
}

#[utoipa::path(
    post,
    path = "/user",
    tag = "users",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created"),
        (status = 409, description = "Email or username already in use", body = ErrorResponse)
    )
)]
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, &'static str), HttpError> {
    request
        .validate()
        .map_err(|e| HttpError(AppError::InvalidArgument(e.to_string())))?;

    if state.users.exists_by_email(&request.email).await? {
        return Err(HttpError(AppError::Conflict(
            "Email already in use".to_string(),
        )));
    }
    if state.users.exists_by_username(&request.username).await? {
        return Err(HttpError(AppError::Conflict(
            "Username already in use".to_string(),
        )));
    }

    // ADMIN can never be self-assigned at registration.
    let mut roles = dedup_roles(request.roles.as_deref().unwrap_or_default());
    roles.retain(|r| *r != Role::Admin);

    let password_hash = hash_password(&request.password)?;
    state
        .users
        .insert(
            &request.name,
            &request.surname,
            &request.email,
            &request.username,
            &password_hash,
            request.status,
            &roles,
        )
        .await?;

    Ok((StatusCode::CREATED, "User created"))
}

#[utoipa::path(
    get,
    path = "/user",
    tag = "users",
    responses((status = 200, description = "Caller's own record", body = User))
)]
pub async fn me(CurrentUser(user): CurrentUser) -> Json<User> {
    Json(user)
}

#[utoipa::path(
    patch,
    path = "/user",
    tag = "users",
    request_body = UserPatch,
    responses(
        (status = 200, description = "Fresh token pair for the updated identity", body = TokenPair)
    )
)]
pub async fn update_self(
    State(state): State<Arc<AppState>>,
    CurrentUser(mut user): CurrentUser,
    Json(patch): Json<UserPatch>,
) -> Result<Json<TokenPair>, HttpError> {
    patch.apply_to(&mut user);
    if let Some(password) = &patch.password {
        user.password_hash = hash_password(password)?;
    }

    // Self-service never touches roles; the admin endpoint owns those.
    let stored = state.users.update(&user, None).await?;

    // Email, username, or roles in the claims may have changed.
    Ok(Json(state.auth.issue_pair(&stored)?))
}

#[utoipa::path(
    get,
    path = "/user/admin",
    tag = "users",
    responses(
        (status = 200, description = "Filtered page of users", body = [User]),
        (status = 403, description = "Admin role required", body = ErrorResponse)
    )
)]
pub async fn admin_list(
    State(state): State<Arc<AppState>>,
    CurrentUser(admin): CurrentUser,
    Query(mut params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<User>>, HttpError> {
    require_admin(&admin)?;
    let page = split_page_params(&mut params);
    Ok(Json(state.users.list(&params, None, &page).await?))
}

#[utoipa::path(
    get,
    path = "/user/admin/{role}",
    tag = "users",
    params(("role" = String, Path, description = "Role tag to restrict to")),
    responses(
        (status = 200, description = "Filtered page of users holding the role", body = [User]),
        (status = 400, description = "Unknown role", body = ErrorResponse)
    )
)]
pub async fn admin_list_by_role(
    State(state): State<Arc<AppState>>,
    CurrentUser(admin): CurrentUser,
    Path(role): Path<String>,
    Query(mut params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<User>>, HttpError> {
    require_admin(&admin)?;
    let role = Role::parse(&role)
        .ok_or_else(|| HttpError(AppError::InvalidArgument(format!("Unknown role: {role}"))))?;
    let page = split_page_params(&mut params);
    Ok(Json(state.users.list(&params, Some(role), &page).await?))
}

#[utoipa::path(
    patch,
    path = "/user/admin",
    tag = "users",
    request_body = UserPatch,
    responses(
        (status = 200, description = "Updated user", body = User),
        (status = 403, description = "Admins cannot modify other admins", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
pub async fn admin_update(
    State(state): State<Arc<AppState>>,
    CurrentUser(admin): CurrentUser,
    Query(query): Query<UserIdQuery>,
    Json(patch): Json<UserPatch>,
) -> Result<Json<User>, HttpError> {
    require_admin(&admin)?;

    // id 0 addresses the calling admin's own record.
    let mut target = if query.id == 0 {
        admin.clone()
    } else {
        state.users.find_by_id(query.id).await?.ok_or_else(|| {
            HttpError(AppError::NotFound(format!(
                "User not found with id: {}",
                query.id
            )))
        })?
    };

    if target.is_admin() && admin.id != target.id {
        return Err(HttpError(AppError::AccessDenied(
            "Cannot access".to_string(),
        )));
    }

    // ADMIN is sticky on the target's own record and never grantable here.
    let roles_update = patch.roles.as_deref().map(|requested| {
        let mut roles = dedup_roles(requested);
        if target.is_admin() {
            if !roles.contains(&Role::Admin) {
                roles.push(Role::Admin);
            }
        } else {
            roles.retain(|r| *r != Role::Admin);
        }
        roles
    });

    patch.apply_to(&mut target);
    if let Some(password) = &patch.password {
        target.password_hash = hash_password(password)?;
    }

    let stored = state
        .users
        .update(&target, roles_update.as_deref())
        .await?;
    Ok(Json(stored))
}

#[utoipa::path(
    delete,
    path = "/user/admin",
    tag = "users",
    responses(
        (status = 200, description = "User deleted"),
        (status = 403, description = "Admins cannot be deleted", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
pub async fn admin_delete(
    State(state): State<Arc<AppState>>,
    CurrentUser(admin): CurrentUser,
    Query(query): Query<UserIdQuery>,
) -> Result<&'static str, HttpError> {
    require_admin(&admin)?;

    let target = state.users.find_by_id(query.id).await?.ok_or_else(|| {
        HttpError(AppError::NotFound(format!(
            "User not found with id: {}",
            query.id
        )))
    })?;
    if target.is_admin() {
        return Err(HttpError(AppError::AccessDenied(
            "Cannot access".to_string(),
        )));
    }

    state.users.delete(target.id).await?;
    Ok("Successfully deleted")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_roles_preserves_first_occurrence() {
        let roles = dedup_roles(&[Role::User, Role::Supplier, Role::User, Role::Admin]);
        assert_eq!(roles, vec![Role::User, Role::Supplier, Role::Admin]);
    }
}
