//! Tender operations: visible-to-slot reads, role-scoped listings, patching,
//! deletion with blob cleanup, and the admin surface.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use tenderd_core::models::{Participant, Role, Tender, TenderPatch, User};
use tenderd_core::AppError;
use tenderd_sync::map_new_tender;

use crate::auth::{require_admin, CurrentUser};
use crate::error::{ErrorResponse, HttpError};
use crate::handlers::split_page_params;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TenderIdQuery {
    pub id: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateTenderRequest {
    pub id: i64,
    #[serde(flatten)]
    pub patch: TenderPatch,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminAssignQuery {
    pub tenderer_id: Option<i64>,
    pub supplier_id: Option<i64>,
    pub participant_id: Option<i64>,
    pub user_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddTenderQuery {
    /// Owner user id the tender is registered for.
    pub id: i64,
    pub tender_id: i64,
}

/// Admin listing entry: the tender together with its owner.
#[derive(Debug, Serialize, ToSchema)]
pub struct TenderWithOwner {
    pub tender: Tender,
    pub user: Option<User>,
}

/// Relationship slot backing a role selector in the listing path.
fn slot_for_role(role: Role) -> Option<(&'static str, &'static str)> {
    match role {
        Role::User => Some(("user_id", "userId")),
        Role::Supplier => Some(("supplier_id", "supplierId")),
        Role::Tenderer => Some(("tenderer_id", "tendererId")),
        Role::Admin => None,
    }
}

#[utoipa::path(
    get,
    path = "/tender",
    tag = "tenders",
    responses(
        (status = 200, description = "Tender visible to the caller", body = Tender),
        (status = 403, description = "No slot on this tender", body = ErrorResponse),
        (status = 404, description = "Unknown to both store and portal", body = ErrorResponse)
    )
)]
pub async fn get_tender(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<TenderIdQuery>,
) -> Result<Json<Tender>, HttpError> {
    if state.tenders.exists(query.id).await? {
        let tender = state
            .tenders
            .get_for_user_any_slot(query.id, user.id)
            .await?
            .ok_or_else(|| HttpError(AppError::AccessDenied("Access denied".to_string())))?;
        return Ok(Json(tender));
    }

    // First access registers the tender for the caller, USER role only.
    if !user.has_role(Role::User) {
        return Err(HttpError(AppError::NotFound("Not found".to_string())));
    }

    let parsed = state
        .source
        .fetch_tender(query.id)
        .await?
        .ok_or_else(|| {
            HttpError(AppError::NotFound(format!(
                "Not found tender by id: {}",
                query.id
            )))
        })?;

    let tender = map_new_tender(Some(user.id), query.id, &parsed);
    let stored = state.tenders.insert_aggregate(&tender).await?;
    Ok(Json(stored))
}

#[utoipa::path(
    get,
    path = "/tender/{role}",
    tag = "tenders",
    params(("role" = String, Path, description = "Role selector: USER, SUPPLIER or TENDERER")),
    responses(
        (status = 200, description = "Tenders where the caller holds the selected slot", body = [Tender]),
        (status = 400, description = "Unknown role selector", body = ErrorResponse)
    )
)]
pub async fn list_my(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(role): Path<String>,
    Query(mut params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<Tender>>, HttpError> {
    let role = Role::parse(&role)
        .ok_or_else(|| HttpError(AppError::InvalidArgument("Not found role".to_string())))?;
    let (slot_column, bound_param) = slot_for_role(role)
        .ok_or_else(|| HttpError(AppError::InvalidArgument("Not found role".to_string())))?;

    // The slot already pins this id; drop the parameter so it cannot
    // double-filter against someone else's id.
    params.remove(bound_param);
    let page = split_page_params(&mut params);

    let tenders = state
        .tenders
        .list_for_slot(slot_column, user.id, &params, &page)
        .await?;
    Ok(Json(tenders))
}

#[utoipa::path(
    get,
    path = "/tender/admin",
    tag = "tenders",
    responses(
        (status = 200, description = "All tenders with their owners", body = [TenderWithOwner]),
        (status = 403, description = "Admin role required", body = ErrorResponse)
    )
)]
pub async fn admin_list(
    State(state): State<Arc<AppState>>,
    CurrentUser(admin): CurrentUser,
    Query(mut params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<TenderWithOwner>>, HttpError> {
    require_admin(&admin)?;

    let page = split_page_params(&mut params);
    let tenders = state.tenders.list_all(&params, &page).await?;

    let owner_ids: Vec<i64> = tenders.iter().filter_map(|t| t.user_id).collect();
    let owners = state.users.find_by_ids(&owner_ids).await?;

    let entries = tenders
        .into_iter()
        .map(|tender| {
            let user = tender.user_id.and_then(|id| owners.get(&id).cloned());
            TenderWithOwner { tender, user }
        })
        .collect();
    Ok(Json(entries))
}

#[utoipa::path(
    patch,
    path = "/tender",
    tag = "tenders",
    request_body = UpdateTenderRequest,
    responses(
        (status = 200, description = "Updated tender", body = Tender),
        (status = 403, description = "No slot on this tender", body = ErrorResponse)
    )
)]
pub async fn update_tender(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<UpdateTenderRequest>,
) -> Result<Json<Tender>, HttpError> {
    let mut tender = state
        .tenders
        .get_for_user_any_slot(request.id, user.id)
        .await?
        .ok_or_else(|| HttpError(AppError::AccessDenied("Access denied".to_string())))?;

    let mut patch = request.patch;
    let progress = patch.take_progress();
    patch.apply_to(&mut tender);

    let stored = state.tenders.update_aggregate(&tender, progress).await?;
    Ok(Json(stored))
}

#[utoipa::path(
    patch,
    path = "/tender/admin",
    tag = "tenders",
    request_body = UpdateTenderRequest,
    responses(
        (status = 200, description = "Updated tender", body = Tender),
        (status = 400, description = "Assigned user lacks the required role", body = ErrorResponse),
        (status = 404, description = "Tender or referenced entity missing", body = ErrorResponse)
    )
)]
pub async fn admin_update(
    State(state): State<Arc<AppState>>,
    CurrentUser(admin): CurrentUser,
    Query(assign): Query<AdminAssignQuery>,
    Json(request): Json<UpdateTenderRequest>,
) -> Result<Json<Tender>, HttpError> {
    require_admin(&admin)?;

    let mut tender = state
        .tenders
        .get(request.id)
        .await?
        .ok_or_else(|| HttpError(AppError::NotFound("Not found".to_string())))?;

    if let Some(tenderer_id) = assign.tenderer_id {
        let user = state.users.find_by_id(tenderer_id).await?.ok_or_else(|| {
            HttpError(AppError::NotFound(format!(
                "User not found with id: {tenderer_id}"
            )))
        })?;
        if !user.has_role(Role::Tenderer) {
            return Err(HttpError(AppError::InvalidArgument(
                "User isn't tenderer".to_string(),
            )));
        }
        tender.tenderer_id = Some(user.id);
    }

    if let Some(supplier_id) = assign.supplier_id {
        let user = state.users.find_by_id(supplier_id).await?.ok_or_else(|| {
            HttpError(AppError::NotFound(format!(
                "User not found with id: {supplier_id}"
            )))
        })?;
        if !user.has_role(Role::Supplier) {
            return Err(HttpError(AppError::InvalidArgument(
                "User isn't supplier".to_string(),
            )));
        }
        tender.supplier_id = Some(user.id);
    }

    if let Some(user_id) = assign.user_id {
        let user = state.users.find_by_id(user_id).await?.ok_or_else(|| {
            HttpError(AppError::NotFound(format!(
                "User not found with id: {user_id}"
            )))
        })?;
        tender.user_id = Some(user.id);
    }

    if let Some(participant_id) = assign.participant_id {
        let participant = state
            .participants
            .get(participant_id)
            .await?
            .ok_or_else(|| {
                HttpError(AppError::NotFound(format!(
                    "Participant not found with id: {participant_id}"
                )))
            })?;
        tender.participant_id = Some(participant.id);
    }

    let mut patch = request.patch;
    let progress = patch.take_progress();
    patch.apply_to(&mut tender);

    let stored = state.tenders.update_aggregate(&tender, progress).await?;
    Ok(Json(stored))
}

#[utoipa::path(
    delete,
    path = "/tender",
    tag = "tenders",
    responses(
        (status = 204, description = "Tender and children deleted"),
        (status = 403, description = "Caller does not own this tender", body = ErrorResponse)
    )
)]
pub async fn delete_tender(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<TenderIdQuery>,
) -> Result<StatusCode, HttpError> {
    if !state.tenders.exists_owned(query.id, user.id).await? {
        return Err(HttpError(AppError::AccessDenied("Access denied".to_string())));
    }

    state.tenders.delete_cascade(query.id).await?;
    cleanup_blobs(&state, query.id).await;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/tender/admin",
    tag = "tenders",
    responses(
        (status = 204, description = "Tender and children deleted"),
        (status = 404, description = "Tender not found", body = ErrorResponse)
    )
)]
pub async fn admin_delete(
    State(state): State<Arc<AppState>>,
    CurrentUser(admin): CurrentUser,
    Query(query): Query<TenderIdQuery>,
) -> Result<StatusCode, HttpError> {
    require_admin(&admin)?;

    if !state.tenders.delete_cascade(query.id).await? {
        return Err(HttpError(AppError::NotFound("Not found".to_string())));
    }
    cleanup_blobs(&state, query.id).await;
    Ok(StatusCode::NO_CONTENT)
}

/// Rows are gone by the time this runs; a blob failure leaves orphans for a
/// later sweep and must be loud in the log.
async fn cleanup_blobs(state: &AppState, tender_id: i64) {
    if let Err(e) = state.storage.delete_all(tender_id).await {
        tracing::error!(tender_id, error = %e, "Orphaned blobs left behind after tender deletion");
    }
}

#[utoipa::path(
    post,
    path = "/tender/admin",
    tag = "tenders",
    responses(
        (status = 201, description = "Tender registered for the user"),
        (status = 404, description = "User or portal tender missing", body = ErrorResponse),
        (status = 409, description = "Tender already exists", body = ErrorResponse)
    )
)]
pub async fn admin_add(
    State(state): State<Arc<AppState>>,
    CurrentUser(admin): CurrentUser,
    Query(query): Query<AddTenderQuery>,
) -> Result<StatusCode, HttpError> {
    require_admin(&admin)?;

    let user = state.users.find_by_id(query.id).await?.ok_or_else(|| {
        HttpError(AppError::NotFound(format!(
            "User not found with id: {}",
            query.id
        )))
    })?;

    if state.tenders.exists(query.tender_id).await? {
        return Err(HttpError(AppError::Conflict(
            "Tender already exists".to_string(),
        )));
    }

    let parsed = state
        .source
        .fetch_tender(query.tender_id)
        .await?
        .ok_or_else(|| {
            HttpError(AppError::NotFound(format!(
                "Not found tender by id: {}",
                query.tender_id
            )))
        })?;

    let tender = map_new_tender(Some(user.id), query.tender_id, &parsed);
    state.tenders.insert_aggregate(&tender).await?;
    Ok(StatusCode::CREATED)
}

#[utoipa::path(
    get,
    path = "/tender/units",
    tag = "tenders",
    responses((status = 200, description = "Distinct units across all tenders", body = [String]))
)]
pub async fn units(
    State(state): State<Arc<AppState>>,
    CurrentUser(_user): CurrentUser,
) -> Result<Json<Vec<String>>, HttpError> {
    Ok(Json(state.tenders.distinct_units().await?))
}

#[utoipa::path(
    get,
    path = "/tender/participants",
    tag = "tenders",
    responses((status = 200, description = "Reference companies", body = [Participant]))
)]
pub async fn participants(
    State(state): State<Arc<AppState>>,
    CurrentUser(_user): CurrentUser,
) -> Result<Json<Vec<Participant>>, HttpError> {
    Ok(Json(state.participants.list_all().await?))
}
