//! Tray CRUD endpoints.
//!
//! Responses embed a computed status block so clients never redo the date
//! math. Wire field names are camelCase throughout.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use couvoir_core::error::ValidationError;
use couvoir_core::status::{
    completion_date, days_in_incubator, days_remaining, status, TrayStatus,
};
use couvoir_core::tray::{Door, EggType, Position, Tray, TrayInput, TrayPatch};

use crate::service::ServiceError;
use crate::state::AppState;

use super::{error_response, ErrorResponse};

type ApiError = (StatusCode, Json<ErrorResponse>);

// ── Wire types ────────────────────────────────────────────────────

/// Computed status block attached to every tray response.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrayStatusBlock {
    /// One of: incubating, ready_to_remove, overdue, removed.
    pub state: &'static str,
    pub days_in_incubator: i64,
    /// Days until the completion date; absent once it has passed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_remaining: Option<i64>,
    /// Days past the incubation period; present only when overdue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_overdue: Option<i64>,
    pub completion_date: DateTime<Utc>,
}

/// A tray record as returned by the API.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrayResponse {
    pub id: Uuid,
    pub door: &'static str,
    pub row: u8,
    pub position: &'static str,
    pub egg_type: &'static str,
    pub added_date: DateTime<Utc>,
    pub removed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub removed_date: Option<DateTime<Utc>>,
    pub notification_sent: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub status: TrayStatusBlock,
}

impl TrayResponse {
    pub fn from_tray(tray: &Tray, now: DateTime<Utc>) -> Self {
        let st = status(tray, now);
        let days_overdue = match st {
            TrayStatus::Overdue { days_overdue } => Some(days_overdue),
            _ => None,
        };
        Self {
            id: tray.id,
            door: tray.door.as_str(),
            row: tray.row,
            position: tray.position.as_str(),
            egg_type: tray.egg_type.as_str(),
            added_date: tray.added_date,
            removed: tray.removed,
            removed_date: tray.removed_date,
            notification_sent: tray.notification_sent,
            notes: tray.notes.clone(),
            created_at: tray.created_at,
            updated_at: tray.updated_at,
            status: TrayStatusBlock {
                state: st.as_str(),
                days_in_incubator: days_in_incubator(tray.added_date, now),
                days_remaining: days_remaining(tray.added_date, tray.egg_type, now),
                days_overdue,
                completion_date: completion_date(tray.added_date, tray.egg_type),
            },
        }
    }
}

fn to_responses(trays: &[Tray]) -> Vec<TrayResponse> {
    let now = Utc::now();
    trays.iter().map(|t| TrayResponse::from_tray(t, now)).collect()
}

/// Body for `POST /api/trays`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTrayRequest {
    /// "left" or "right".
    pub door: String,
    /// Row within the door, 1..=3.
    pub row: u8,
    /// "left" or "right".
    pub position: String,
    /// "chicken" (default) or "duck".
    #[serde(default)]
    pub egg_type: Option<String>,
    /// Defaults to now; must not be in the future.
    #[serde(default)]
    pub added_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl CreateTrayRequest {
    fn into_input(self) -> Result<TrayInput, ValidationError> {
        Ok(TrayInput {
            door: Door::parse(&self.door)?,
            row: self.row,
            position: Position::parse(&self.position)?,
            egg_type: self.egg_type.as_deref().map(EggType::parse),
            added_date: self.added_date,
            notes: self.notes,
        })
    }
}

/// Body for `PATCH /api/trays/{id}` — the mutable field whitelist.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTrayRequest {
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub notification_sent: Option<bool>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

// ── Handlers ──────────────────────────────────────────────────────

/// List every tray, most-recently-added first.
#[utoipa::path(
    get,
    path = "/api/trays",
    tag = "Trays",
    responses(
        (status = 200, description = "All tray records", body = Vec<TrayResponse>),
        (status = 500, description = "Store failure", body = ErrorResponse)
    )
)]
pub async fn list_trays(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<TrayResponse>>, ApiError> {
    let trays = state.service.list_all().await.map_err(error_response)?;
    Ok(Json(to_responses(&trays)))
}

/// List active (not removed) trays, oldest-added first.
#[utoipa::path(
    get,
    path = "/api/trays/active",
    tag = "Trays",
    responses(
        (status = 200, description = "Active tray records", body = Vec<TrayResponse>),
        (status = 500, description = "Store failure", body = ErrorResponse)
    )
)]
pub async fn list_active_trays(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<TrayResponse>>, ApiError> {
    let trays = state.service.list_active().await.map_err(error_response)?;
    Ok(Json(to_responses(&trays)))
}

/// Fetch a single tray.
#[utoipa::path(
    get,
    path = "/api/trays/{id}",
    tag = "Trays",
    params(("id" = Uuid, Path, description = "Tray ID")),
    responses(
        (status = 200, description = "Tray record", body = TrayResponse),
        (status = 404, description = "Unknown tray", body = ErrorResponse)
    )
)]
pub async fn get_tray(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<TrayResponse>, ApiError> {
    let tray = state.service.get(id).await.map_err(error_response)?;
    Ok(Json(TrayResponse::from_tray(&tray, Utc::now())))
}

/// Place a new tray in a free slot.
#[utoipa::path(
    post,
    path = "/api/trays",
    tag = "Trays",
    request_body = CreateTrayRequest,
    responses(
        (status = 201, description = "Tray created", body = TrayResponse),
        (status = 400, description = "Invalid input or slot already occupied", body = ErrorResponse)
    )
)]
pub async fn create_tray(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateTrayRequest>,
) -> Result<(StatusCode, Json<TrayResponse>), ApiError> {
    let input = body
        .into_input()
        .map_err(|e| error_response(ServiceError::Validation(e)))?;
    let tray = state.service.create(input).await.map_err(error_response)?;
    Ok((
        StatusCode::CREATED,
        Json(TrayResponse::from_tray(&tray, Utc::now())),
    ))
}

/// Mark a tray as removed (idempotent).
#[utoipa::path(
    patch,
    path = "/api/trays/{id}/remove",
    tag = "Trays",
    params(("id" = Uuid, Path, description = "Tray ID")),
    responses(
        (status = 200, description = "Tray removed (or already removed)", body = TrayResponse),
        (status = 404, description = "Unknown tray", body = ErrorResponse)
    )
)]
pub async fn remove_tray(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<TrayResponse>, ApiError> {
    let tray = state.service.mark_removed(id).await.map_err(error_response)?;
    Ok(Json(TrayResponse::from_tray(&tray, Utc::now())))
}

/// Partially update a tray (notes, notification flag).
#[utoipa::path(
    patch,
    path = "/api/trays/{id}",
    tag = "Trays",
    params(("id" = Uuid, Path, description = "Tray ID")),
    request_body = UpdateTrayRequest,
    responses(
        (status = 200, description = "Tray updated", body = TrayResponse),
        (status = 404, description = "Unknown tray", body = ErrorResponse)
    )
)]
pub async fn update_tray(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateTrayRequest>,
) -> Result<Json<TrayResponse>, ApiError> {
    let patch = TrayPatch {
        notes: body.notes,
        notification_sent: body.notification_sent,
    };
    let tray = state.service.update(id, patch).await.map_err(error_response)?;
    Ok(Json(TrayResponse::from_tray(&tray, Utc::now())))
}

/// Delete a tray from history, subject to the delete policy.
#[utoipa::path(
    delete,
    path = "/api/trays/{id}",
    tag = "Trays",
    params(("id" = Uuid, Path, description = "Tray ID")),
    responses(
        (status = 200, description = "Tray deleted", body = MessageResponse),
        (status = 403, description = "Refused by delete policy", body = ErrorResponse),
        (status = 404, description = "Unknown tray", body = ErrorResponse)
    )
)]
pub async fn delete_tray(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.service.delete(id).await.map_err(error_response)?;
    Ok(Json(MessageResponse {
        message: "Tray deleted successfully".to_string(),
    }))
}

/// Delete every tray the policy allows; returns the surviving records.
#[utoipa::path(
    delete,
    path = "/api/trays",
    tag = "Trays",
    responses(
        (status = 200, description = "Surviving tray records", body = Vec<TrayResponse>),
        (status = 500, description = "Store failure", body = ErrorResponse)
    )
)]
pub async fn clear_history(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<TrayResponse>>, ApiError> {
    let survivors = state.service.clear_history().await.map_err(error_response)?;
    Ok(Json(to_responses(&survivors)))
}
