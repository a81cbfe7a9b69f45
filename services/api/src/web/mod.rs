//! services/api/src/web/mod.rs
//!
//! HTTP surface of the API: handler modules, shared state, auth
//! middleware, and the master OpenAPI definition.

use axum::http::StatusCode;
use utoipa::OpenApi;

use healing_companion_core::ports::PortError;

pub mod archives;
pub mod auth;
pub mod catalog;
pub mod journal;
pub mod middleware;
pub mod reports;
pub mod state;

pub use middleware::require_auth;
pub use state::AppState;

/// Maps a store-port failure to an HTTP response tuple.
pub(crate) fn port_error_response(e: PortError) -> (StatusCode, String) {
    match e {
        PortError::NotFound(what) => (StatusCode::NOT_FOUND, what),
        PortError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
        PortError::Unexpected(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error".to_string(),
        ),
    }
}

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::signup_handler,
        auth::login_handler,
        auth::logout_handler,
        archives::create_archive_handler,
        archives::list_archives_handler,
        archives::get_archive_handler,
        archives::update_archive_handler,
        archives::delete_archive_handler,
        journal::create_entry_handler,
        journal::list_entries_handler,
        journal::get_entry_handler,
        journal::delete_entry_handler,
        reports::generate_report_handler,
        reports::get_report_handler,
        reports::update_report_handler,
        catalog::list_courses_handler,
        catalog::get_course_handler,
        catalog::list_games_handler,
        catalog::get_game_handler,
    ),
    components(
        schemas(
            auth::SignupRequest,
            auth::LoginRequest,
            auth::AuthResponse,
            archives::ArchivePayload,
            archives::ArchiveResponse,
            journal::CreateEntryRequest,
            journal::MediaPayload,
            journal::ListEntriesQuery,
            journal::MediaResponse,
            journal::EntryResponse,
            reports::GenerateReportRequest,
            reports::UpdateReportRequest,
            reports::ReportResponse,
            catalog::CourseResponse,
            catalog::GameResponse,
        )
    ),
    tags(
        (name = "Healing Companion API", description = "API endpoints for the child healing companion backend.")
    )
)]
pub struct ApiDoc;
