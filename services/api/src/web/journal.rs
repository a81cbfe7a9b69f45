//! services/api/src/web/journal.rs
//!
//! Axum handlers for the healing-log journal: create, list (with optional
//! date filters), fetch, and the transactional cascade delete.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;
use uuid::Uuid;

use healing_companion_core::domain::{JournalEntry, MediaKind, NewJournalEntry, NewMedia};

use crate::web::port_error_response;
use crate::web::state::AppState;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct CreateEntryRequest {
    pub child_archive_id: Uuid,
    pub content: String,
    #[serde(default)]
    pub media: Vec<MediaPayload>,
}

#[derive(Deserialize, ToSchema)]
pub struct MediaPayload {
    /// "image" or "video".
    pub kind: String,
    pub url: String,
}

#[derive(Deserialize, ToSchema)]
pub struct ListEntriesQuery {
    /// Inclusive lower bound, YYYY-MM-DD.
    pub start_date: Option<String>,
    /// Inclusive upper bound, YYYY-MM-DD.
    pub end_date: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct MediaResponse {
    pub id: i64,
    pub kind: &'static str,
    pub url: String,
}

#[derive(Serialize, ToSchema)]
pub struct EntryResponse {
    pub id: i64,
    pub child_archive_id: Uuid,
    pub content: String,
    pub media: Vec<MediaResponse>,
    pub created_at: DateTime<Utc>,
}

impl EntryResponse {
    fn from_domain(entry: JournalEntry) -> Self {
        Self {
            id: entry.id,
            child_archive_id: entry.child_archive_id,
            content: entry.content,
            media: entry
                .media
                .into_iter()
                .map(|m| MediaResponse {
                    id: m.id,
                    kind: m.kind.as_str(),
                    url: m.url,
                })
                .collect(),
            created_at: entry.created_at,
        }
    }
}

//=========================================================================================
// Date Parsing
//=========================================================================================

pub(crate) fn parse_date(
    raw: &Option<String>,
    name: &str,
) -> Result<Option<NaiveDate>, (StatusCode, String)> {
    match raw.as_deref() {
        None | Some("") => Ok(None),
        Some(value) => value
            .parse::<NaiveDate>()
            .map(Some)
            .map_err(|_| {
                (
                    StatusCode::BAD_REQUEST,
                    format!("{} must be formatted as YYYY-MM-DD", name),
                )
            }),
    }
}

fn day_start(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

fn day_after(date: NaiveDate) -> DateTime<Utc> {
    date.succ_opt().unwrap_or(date).and_time(NaiveTime::MIN).and_utc()
}

//=========================================================================================
// Handlers
//=========================================================================================

/// Create a healing-log entry with optional media attachments.
#[utoipa::path(
    post,
    path = "/healing-logs",
    request_body = CreateEntryRequest,
    responses(
        (status = 201, description = "Entry created", body = EntryResponse),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "Child archive not found")
    )
)]
pub async fn create_entry_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<CreateEntryRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if req.content.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "content is required".to_string()));
    }

    let mut media = Vec::with_capacity(req.media.len());
    for item in &req.media {
        let kind = MediaKind::parse(&item.kind).ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                format!("unknown media kind '{}'", item.kind),
            )
        })?;
        media.push(NewMedia {
            kind,
            url: item.url.clone(),
        });
    }

    // The archive lookup doubles as the ownership check.
    state
        .archives
        .get_archive(user_id, req.child_archive_id)
        .await
        .map_err(port_error_response)?;

    let entry = state
        .journal
        .create_entry(NewJournalEntry {
            child_archive_id: req.child_archive_id,
            content: req.content,
            media,
        })
        .await
        .map_err(|e| {
            error!("Failed to create healing log: {:?}", e);
            port_error_response(e)
        })?;
    Ok((StatusCode::CREATED, Json(EntryResponse::from_domain(entry))))
}

/// List a child's healing-log entries, newest first.
#[utoipa::path(
    get,
    path = "/healing-logs/child/{child_id}",
    params(
        ("child_id" = Uuid, Path, description = "Child archive id"),
        ("start_date" = Option<String>, Query, description = "Inclusive lower bound, YYYY-MM-DD"),
        ("end_date" = Option<String>, Query, description = "Inclusive upper bound, YYYY-MM-DD")
    ),
    responses(
        (status = 200, description = "Entry list", body = [EntryResponse]),
        (status = 400, description = "Invalid date filter"),
        (status = 404, description = "Child archive not found")
    )
)]
pub async fn list_entries_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(child_id): Path<Uuid>,
    Query(query): Query<ListEntriesQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let from = parse_date(&query.start_date, "start_date")?.map(day_start);
    let until = parse_date(&query.end_date, "end_date")?.map(day_after);

    state
        .archives
        .get_archive(user_id, child_id)
        .await
        .map_err(port_error_response)?;

    let entries = state
        .journal
        .list_by_child(child_id, from, until)
        .await
        .map_err(|e| {
            error!("Failed to list healing logs: {:?}", e);
            port_error_response(e)
        })?;

    // The store yields oldest first; the API presents newest first.
    let body: Vec<EntryResponse> = entries
        .into_iter()
        .rev()
        .map(EntryResponse::from_domain)
        .collect();
    Ok(Json(body))
}

/// Fetch a single healing-log entry.
#[utoipa::path(
    get,
    path = "/healing-logs/{id}",
    params(("id" = i64, Path, description = "Entry id")),
    responses(
        (status = 200, description = "The entry", body = EntryResponse),
        (status = 404, description = "Entry not found")
    )
)]
pub async fn get_entry_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(entry_id): Path<i64>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let entry = state
        .journal
        .get_entry(entry_id)
        .await
        .map_err(port_error_response)?;

    state
        .archives
        .get_archive(user_id, entry.child_archive_id)
        .await
        .map_err(port_error_response)?;

    Ok(Json(EntryResponse::from_domain(entry)))
}

/// Delete a healing-log entry together with its media.
#[utoipa::path(
    delete,
    path = "/healing-logs/{id}",
    params(("id" = i64, Path, description = "Entry id")),
    responses(
        (status = 204, description = "Entry and media deleted"),
        (status = 404, description = "Entry not found")
    )
)]
pub async fn delete_entry_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(entry_id): Path<i64>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let entry = state
        .journal
        .get_entry(entry_id)
        .await
        .map_err(port_error_response)?;

    state
        .archives
        .get_archive(user_id, entry.child_archive_id)
        .await
        .map_err(port_error_response)?;

    state
        .journal
        .delete_entry(entry_id)
        .await
        .map_err(|e| {
            error!("Failed to delete healing log: {:?}", e);
            port_error_response(e)
        })?;
    Ok(StatusCode::NO_CONTENT)
}
