//! OpenAPI document assembly.

use axum::Json;
use utoipa::OpenApi;

use crate::auth::TokenPair;
use crate::error::ErrorResponse;
use crate::handlers;
use crate::handlers::auth::RefreshRequest;
use crate::handlers::tenders::{TenderWithOwner, UpdateTenderRequest};
use crate::handlers::users::RegisterRequest;

use tenderd_core::models::{
    CompanyType, Item, Participant, ProgressEntry, ProgressEntryInput, ProgressStatus, Role,
    StoredFile, Tender, TenderPatch, TenderStage, User, UserPatch, UserStatus,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "tenderd",
        description = "Procurement tender mirror and management service"
    ),
    paths(
        handlers::auth::login,
        handlers::auth::refresh,
        handlers::users::register,
        handlers::users::me,
        handlers::users::update_self,
        handlers::users::admin_list,
        handlers::users::admin_list_by_role,
        handlers::users::admin_update,
        handlers::users::admin_delete,
        handlers::tenders::get_tender,
        handlers::tenders::list_my,
        handlers::tenders::admin_list,
        handlers::tenders::update_tender,
        handlers::tenders::admin_update,
        handlers::tenders::delete_tender,
        handlers::tenders::admin_delete,
        handlers::tenders::admin_add,
        handlers::tenders::units,
        handlers::tenders::participants,
        handlers::files::upload,
        handlers::files::download,
        handlers::files::delete_file,
        handlers::files::admin_upload,
        handlers::files::admin_download,
        handlers::files::admin_delete,
    ),
    components(schemas(
        Tender,
        TenderStage,
        TenderPatch,
        TenderWithOwner,
        UpdateTenderRequest,
        Item,
        ProgressEntry,
        ProgressEntryInput,
        ProgressStatus,
        StoredFile,
        User,
        UserPatch,
        UserStatus,
        Role,
        Participant,
        CompanyType,
        RegisterRequest,
        RefreshRequest,
        TokenPair,
        ErrorResponse,
    )),
    tags(
        (name = "auth", description = "Login and token rotation"),
        (name = "users", description = "Self-service and admin user management"),
        (name = "tenders", description = "Tender browsing, patching, ingestion"),
        (name = "files", description = "Tender attachments"),
    )
)]
pub struct ApiDoc;

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
