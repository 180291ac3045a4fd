//! REST handlers.
//!
//! Error bodies follow the `{"message": "..."}` shape on every endpoint.

pub mod health;
pub mod trays;

use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::service::ServiceError;

/// Error body shared by all endpoints.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub message: String,
}

/// Map a service error onto its HTTP representation.
pub fn error_response(e: ServiceError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match &e {
        ServiceError::Validation(_) | ServiceError::SlotConflict => StatusCode::BAD_REQUEST,
        ServiceError::NotFound => StatusCode::NOT_FOUND,
        ServiceError::DeleteRestricted(_) => StatusCode::FORBIDDEN,
        ServiceError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!(error = %e, "Request failed on store error");
    }
    (
        status,
        Json(ErrorResponse {
            message: e.to_string(),
        }),
    )
}
