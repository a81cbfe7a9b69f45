//! services/api/src/web/catalog.rs
//!
//! Read-only catalog endpoints for healing courses and games.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;
use uuid::Uuid;

use healing_companion_core::domain::{Course, Game};

use crate::web::port_error_response;
use crate::web::state::AppState;

#[derive(Serialize, ToSchema)]
pub struct CourseResponse {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub level: String,
    pub duration_minutes: i32,
    pub cover_image: String,
    pub video_url: String,
    pub is_free: bool,
    pub created_at: DateTime<Utc>,
}

impl CourseResponse {
    fn from_domain(course: Course) -> Self {
        Self {
            id: course.id,
            title: course.title,
            description: course.description,
            category: course.category,
            level: course.level,
            duration_minutes: course.duration_minutes,
            cover_image: course.cover_image,
            video_url: course.video_url,
            is_free: course.is_free,
            created_at: course.created_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct GameResponse {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub min_age: i32,
    pub max_age: i32,
    pub cover_image: String,
    pub play_url: String,
    pub created_at: DateTime<Utc>,
}

impl GameResponse {
    fn from_domain(game: Game) -> Self {
        Self {
            id: game.id,
            title: game.title,
            description: game.description,
            category: game.category,
            min_age: game.min_age,
            max_age: game.max_age,
            cover_image: game.cover_image,
            play_url: game.play_url,
            created_at: game.created_at,
        }
    }
}

/// List all healing courses.
#[utoipa::path(
    get,
    path = "/courses",
    responses(
        (status = 200, description = "Course list", body = [CourseResponse]),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn list_courses_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let courses = state.catalog.list_courses().await.map_err(|e| {
        error!("Failed to list courses: {:?}", e);
        port_error_response(e)
    })?;
    let body: Vec<CourseResponse> = courses.into_iter().map(CourseResponse::from_domain).collect();
    Ok(Json(body))
}

/// Fetch one healing course.
#[utoipa::path(
    get,
    path = "/courses/{id}",
    params(("id" = Uuid, Path, description = "Course id")),
    responses(
        (status = 200, description = "The course", body = CourseResponse),
        (status = 404, description = "Course not found")
    )
)]
pub async fn get_course_handler(
    State(state): State<Arc<AppState>>,
    Path(course_id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let course = state
        .catalog
        .get_course(course_id)
        .await
        .map_err(port_error_response)?;
    Ok(Json(CourseResponse::from_domain(course)))
}

/// List all healing games.
#[utoipa::path(
    get,
    path = "/games",
    responses(
        (status = 200, description = "Game list", body = [GameResponse]),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn list_games_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let games = state.catalog.list_games().await.map_err(|e| {
        error!("Failed to list games: {:?}", e);
        port_error_response(e)
    })?;
    let body: Vec<GameResponse> = games.into_iter().map(GameResponse::from_domain).collect();
    Ok(Json(body))
}

/// Fetch one healing game.
#[utoipa::path(
    get,
    path = "/games/{id}",
    params(("id" = Uuid, Path, description = "Game id")),
    responses(
        (status = 200, description = "The game", body = GameResponse),
        (status = 404, description = "Game not found")
    )
)]
pub async fn get_game_handler(
    State(state): State<Arc<AppState>>,
    Path(game_id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let game = state
        .catalog
        .get_game(game_id)
        .await
        .map_err(port_error_response)?;
    Ok(Json(GameResponse::from_domain(game)))
}
