//! Router assembly and middleware layering.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use http::HeaderValue;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api_doc;
use crate::handlers::{auth, files, tenders, users};
use crate::state::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = if state.config.cors_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    Router::new()
        .route("/auth", get(auth::login))
        .route("/auth/refresh", post(auth::refresh))
        .route(
            "/user",
            post(users::register)
                .get(users::me)
                .patch(users::update_self),
        )
        .route(
            "/user/admin",
            get(users::admin_list)
                .patch(users::admin_update)
                .delete(users::admin_delete),
        )
        .route("/user/admin/{role}", get(users::admin_list_by_role))
        .route(
            "/tender",
            get(tenders::get_tender)
                .patch(tenders::update_tender)
                .delete(tenders::delete_tender),
        )
        .route(
            "/tender/admin",
            get(tenders::admin_list)
                .post(tenders::admin_add)
                .patch(tenders::admin_update)
                .delete(tenders::admin_delete),
        )
        .route("/tender/units", get(tenders::units))
        .route("/tender/participants", get(tenders::participants))
        .route("/tender/{role}", get(tenders::list_my))
        .route(
            "/file",
            post(files::upload)
                .get(files::download)
                .delete(files::delete_file),
        )
        .route(
            "/file/admin",
            post(files::admin_upload)
                .get(files::admin_download)
                .delete(files::admin_delete),
        )
        .route("/api-docs/openapi.json", get(api_doc::openapi_json))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes))
        .with_state(state)
}
