//! services/api/src/web/reports.rs
//!
//! Axum handlers for the AI-report operations: generate, fetch-latest,
//! and content edit.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;
use uuid::Uuid;

use healing_companion_core::domain::{GeneratedReport, ReportCategory};
use healing_companion_core::report::ReportError;

use crate::web::journal::parse_date;
use crate::web::port_error_response;
use crate::web::state::AppState;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct GenerateReportRequest {
    pub child_archive_id: Uuid,
    pub report_type: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateReportRequest {
    pub content: String,
}

#[derive(Deserialize, ToSchema)]
pub struct GetReportQuery {
    pub child_archive_id: Uuid,
    pub report_type: String,
}

#[derive(Serialize, ToSchema)]
pub struct ReportResponse {
    pub id: i64,
    pub child_archive_id: Uuid,
    pub report_type: &'static str,
    pub content: String,
    pub is_edited: bool,
    pub generated_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ReportResponse {
    fn from_domain(report: GeneratedReport) -> Self {
        Self {
            id: report.id,
            child_archive_id: report.child_archive_id,
            report_type: report.category.as_str(),
            content: report.content,
            is_edited: report.is_edited,
            generated_at: report.generated_at,
            updated_at: report.updated_at,
        }
    }
}

//=========================================================================================
// Error Mapping
//=========================================================================================

fn report_error_response(e: ReportError) -> (StatusCode, String) {
    let status = match &e {
        ReportError::Validation(_) => StatusCode::BAD_REQUEST,
        ReportError::NotFound(_) => StatusCode::NOT_FOUND,
        ReportError::Upstream { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        ReportError::Generation(_) => StatusCode::BAD_GATEWAY,
    };
    if status.is_server_error() {
        error!("Report operation failed: {:?}", e);
    }
    (status, e.to_string())
}

fn parse_category(tag: &str) -> Result<ReportCategory, (StatusCode, String)> {
    ReportCategory::parse(tag).ok_or((
        StatusCode::BAD_REQUEST,
        "report_type is required".to_string(),
    ))
}

//=========================================================================================
// Handlers
//=========================================================================================

/// Generate a new report from a child's healing logs.
#[utoipa::path(
    post,
    path = "/ai-reports/generate",
    request_body = GenerateReportRequest,
    responses(
        (status = 200, description = "Report generated", body = ReportResponse),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "Child archive not found"),
        (status = 502, description = "Generation backend failure")
    )
)]
pub async fn generate_report_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<GenerateReportRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let category = parse_category(&req.report_type)?;
    let start = parse_date(&req.start_date, "start_date")?;
    let end = parse_date(&req.end_date, "end_date")?;

    state
        .archives
        .get_archive(user_id, req.child_archive_id)
        .await
        .map_err(port_error_response)?;

    let report = state
        .reports
        .generate(req.child_archive_id, category, start, end)
        .await
        .map_err(report_error_response)?;
    Ok(Json(ReportResponse::from_domain(report)))
}

/// Fetch the latest report of a type for a child.
#[utoipa::path(
    get,
    path = "/ai-reports",
    params(
        ("child_archive_id" = Uuid, Query, description = "Child archive id"),
        ("report_type" = String, Query, description = "Report category tag")
    ),
    responses(
        (status = 200, description = "The latest report", body = ReportResponse),
        (status = 404, description = "No report of this type exists")
    )
)]
pub async fn get_report_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Query(query): Query<GetReportQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let category = parse_category(&query.report_type)?;

    state
        .archives
        .get_archive(user_id, query.child_archive_id)
        .await
        .map_err(port_error_response)?;

    let report = state
        .reports
        .get_latest(query.child_archive_id, category)
        .await
        .map_err(report_error_response)?;
    Ok(Json(ReportResponse::from_domain(report)))
}

/// Replace a report's content, marking it edited.
#[utoipa::path(
    put,
    path = "/ai-reports/{id}",
    params(("id" = i64, Path, description = "Report id")),
    request_body = UpdateReportRequest,
    responses(
        (status = 200, description = "Updated report", body = ReportResponse),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "Report not found")
    )
)]
pub async fn update_report_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(report_id): Path<i64>,
    Json(req): Json<UpdateReportRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let existing = state
        .reports
        .get(report_id)
        .await
        .map_err(report_error_response)?;

    // A report belonging to someone else's child reads as 404, the same
    // as the archive itself would.
    state
        .archives
        .get_archive(user_id, existing.child_archive_id)
        .await
        .map_err(port_error_response)?;

    let report = state
        .reports
        .update_content(report_id, &req.content)
        .await
        .map_err(report_error_response)?;
    Ok(Json(ReportResponse::from_domain(report)))
}
