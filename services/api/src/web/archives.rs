//! services/api/src/web/archives.rs
//!
//! Axum handlers for child-archive management. Every operation is scoped
//! to the authenticated user; someone else's archive reads as 404.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;
use uuid::Uuid;

use healing_companion_core::domain::ChildArchive;

use crate::web::port_error_response;
use crate::web::state::AppState;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct ArchivePayload {
    pub child_name: String,
    #[serde(default)]
    pub gender: String,
    pub birth_date: NaiveDate,
    #[serde(default)]
    pub condition: String,
    #[serde(default)]
    pub diagnosis: String,
    #[serde(default)]
    pub treatment: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub treatment_start_date: Option<NaiveDate>,
}

#[derive(Serialize, ToSchema)]
pub struct ArchiveResponse {
    pub id: Uuid,
    pub child_name: String,
    pub gender: String,
    pub birth_date: NaiveDate,
    pub condition: String,
    pub diagnosis: String,
    pub treatment: String,
    pub notes: String,
    pub treatment_start_date: Option<NaiveDate>,
    /// Whole days since treatment started, derived at read time.
    pub healed_days: i64,
    pub created_at: chrono::DateTime<Utc>,
    pub updated_at: chrono::DateTime<Utc>,
}

impl ArchiveResponse {
    fn from_domain(archive: ChildArchive) -> Self {
        let healed_days = archive.healed_days(Utc::now().date_naive());
        Self {
            id: archive.id,
            child_name: archive.child_name,
            gender: archive.gender,
            birth_date: archive.birth_date,
            condition: archive.condition,
            diagnosis: archive.diagnosis,
            treatment: archive.treatment,
            notes: archive.notes,
            treatment_start_date: archive.treatment_start_date,
            healed_days,
            created_at: archive.created_at,
            updated_at: archive.updated_at,
        }
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// Create a child archive for the authenticated user.
#[utoipa::path(
    post,
    path = "/child-archives",
    request_body = ArchivePayload,
    responses(
        (status = 201, description = "Archive created", body = ArchiveResponse),
        (status = 400, description = "Invalid request"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn create_archive_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(payload): Json<ArchivePayload>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if payload.child_name.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "child_name is required".to_string(),
        ));
    }

    let now = Utc::now();
    let archive = ChildArchive {
        id: Uuid::new_v4(),
        user_id,
        child_name: payload.child_name,
        gender: payload.gender,
        birth_date: payload.birth_date,
        condition: payload.condition,
        diagnosis: payload.diagnosis,
        treatment: payload.treatment,
        notes: payload.notes,
        treatment_start_date: payload.treatment_start_date,
        created_at: now,
        updated_at: now,
    };

    let created = state.archives.create_archive(archive).await.map_err(|e| {
        error!("Failed to create child archive: {:?}", e);
        port_error_response(e)
    })?;
    Ok((
        StatusCode::CREATED,
        Json(ArchiveResponse::from_domain(created)),
    ))
}

/// List the authenticated user's child archives.
#[utoipa::path(
    get,
    path = "/child-archives",
    responses(
        (status = 200, description = "Archive list", body = [ArchiveResponse]),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn list_archives_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let archives = state.archives.list_archives(user_id).await.map_err(|e| {
        error!("Failed to list child archives: {:?}", e);
        port_error_response(e)
    })?;
    let body: Vec<ArchiveResponse> = archives
        .into_iter()
        .map(ArchiveResponse::from_domain)
        .collect();
    Ok(Json(body))
}

/// Fetch one child archive.
#[utoipa::path(
    get,
    path = "/child-archives/{id}",
    params(("id" = Uuid, Path, description = "Archive id")),
    responses(
        (status = 200, description = "The archive", body = ArchiveResponse),
        (status = 404, description = "Archive not found")
    )
)]
pub async fn get_archive_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(archive_id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let archive = state
        .archives
        .get_archive(user_id, archive_id)
        .await
        .map_err(port_error_response)?;
    Ok(Json(ArchiveResponse::from_domain(archive)))
}

/// Update a child archive.
#[utoipa::path(
    put,
    path = "/child-archives/{id}",
    params(("id" = Uuid, Path, description = "Archive id")),
    request_body = ArchivePayload,
    responses(
        (status = 200, description = "Updated archive", body = ArchiveResponse),
        (status = 404, description = "Archive not found")
    )
)]
pub async fn update_archive_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(archive_id): Path<Uuid>,
    Json(payload): Json<ArchivePayload>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let existing = state
        .archives
        .get_archive(user_id, archive_id)
        .await
        .map_err(port_error_response)?;

    let updated = state
        .archives
        .update_archive(ChildArchive {
            child_name: payload.child_name,
            gender: payload.gender,
            birth_date: payload.birth_date,
            condition: payload.condition,
            diagnosis: payload.diagnosis,
            treatment: payload.treatment,
            notes: payload.notes,
            treatment_start_date: payload.treatment_start_date,
            ..existing
        })
        .await
        .map_err(|e| {
            error!("Failed to update child archive: {:?}", e);
            port_error_response(e)
        })?;
    Ok(Json(ArchiveResponse::from_domain(updated)))
}

/// Delete a child archive.
#[utoipa::path(
    delete,
    path = "/child-archives/{id}",
    params(("id" = Uuid, Path, description = "Archive id")),
    responses(
        (status = 204, description = "Archive deleted"),
        (status = 404, description = "Archive not found")
    )
)]
pub async fn delete_archive_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(archive_id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    state
        .archives
        .delete_archive(user_id, archive_id)
        .await
        .map_err(port_error_response)?;
    Ok(StatusCode::NO_CONTENT)
}
