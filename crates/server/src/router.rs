//! HTTP router construction.
//!
//! Assembles all Axum routes, middleware, and OpenAPI docs into a single
//! `Router`.

use std::sync::Arc;

use axum::routing::{get, patch};
use axum::Router;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::api;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::health::health,
        api::trays::list_trays,
        api::trays::list_active_trays,
        api::trays::get_tray,
        api::trays::create_tray,
        api::trays::remove_tray,
        api::trays::update_tray,
        api::trays::delete_tray,
        api::trays::clear_history,
    ),
    components(schemas(
        api::health::HealthResponse,
        api::trays::TrayResponse,
        api::trays::TrayStatusBlock,
        api::trays::CreateTrayRequest,
        api::trays::UpdateTrayRequest,
        api::trays::MessageResponse,
        api::ErrorResponse,
    )),
    tags(
        (name = "Trays", description = "Tray lifecycle: create, remove, update, prune"),
        (name = "Health", description = "Server readiness")
    )
)]
struct ApiDoc;

/// Build the complete application router with all routes and middleware.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(api::health::health))
        .route(
            "/api/trays",
            get(api::trays::list_trays)
                .post(api::trays::create_tray)
                .delete(api::trays::clear_history),
        )
        .route("/api/trays/active", get(api::trays::list_active_trays))
        .route(
            "/api/trays/{id}",
            get(api::trays::get_tray)
                .patch(api::trays::update_tray)
                .delete(api::trays::delete_tray),
        )
        .route("/api/trays/{id}/remove", patch(api::trays::remove_tray))
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
