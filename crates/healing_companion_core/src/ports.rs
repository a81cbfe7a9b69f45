//! crates/healing_companion_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the
//! core to be independent of specific external implementations like databases
//! or text-generation providers.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    ChildArchive, Course, Game, GeneratedReport, JournalEntry, NewJournalEntry, NewReport,
    ReportCategory, User, UserCredentials,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all store port operations.
/// This abstracts away the specific errors from external services (e.g.
/// database drivers).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

/// Errors produced by a generation backend. Every failure mode of the
/// remote call is distinguishable; the mock path never produces one.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("the generated content was empty")]
    EmptyContent,
    #[error("the provider returned no completions")]
    EmptyResponse,
    #[error("provider error: {message} ({kind})")]
    Provider { message: String, kind: String },
    #[error("transport failure: {0}")]
    Transport(String),
}

//=========================================================================================
// Store Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create_user(
        &self,
        email: &str,
        display_name: &str,
        password_hash: &str,
    ) -> PortResult<User>;

    async fn get_credentials_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    /// Resolves a session id to its user, rejecting expired sessions.
    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;
}

/// Child-archive persistence. Every operation is scoped to the owning
/// user; an archive belonging to someone else reads as not found.
#[async_trait]
pub trait ArchiveStore: Send + Sync {
    async fn create_archive(&self, archive: ChildArchive) -> PortResult<ChildArchive>;

    async fn get_archive(&self, user_id: Uuid, archive_id: Uuid) -> PortResult<ChildArchive>;

    async fn list_archives(&self, user_id: Uuid) -> PortResult<Vec<ChildArchive>>;

    async fn update_archive(&self, archive: ChildArchive) -> PortResult<ChildArchive>;

    async fn delete_archive(&self, user_id: Uuid, archive_id: Uuid) -> PortResult<()>;
}

/// Healing-log journal persistence.
#[async_trait]
pub trait JournalStore: Send + Sync {
    async fn create_entry(&self, new: NewJournalEntry) -> PortResult<JournalEntry>;

    async fn get_entry(&self, entry_id: i64) -> PortResult<JournalEntry>;

    /// Lists a child's entries oldest-first, optionally bounded by
    /// `from` (inclusive) and `until` (exclusive) creation timestamps.
    async fn list_by_child(
        &self,
        child_archive_id: Uuid,
        from: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> PortResult<Vec<JournalEntry>>;

    /// Deletes an entry together with its media rows as one atomic unit.
    /// A failure in either step leaves both entry and media untouched.
    async fn delete_entry(&self, entry_id: i64) -> PortResult<()>;
}

/// Generated-report persistence. The store does not enforce uniqueness per
/// (child, category); callers resolve "the" report by newest generation
/// timestamp.
#[async_trait]
pub trait ReportStore: Send + Sync {
    async fn create_report(&self, new: NewReport) -> PortResult<GeneratedReport>;

    async fn get_report(&self, report_id: i64) -> PortResult<GeneratedReport>;

    async fn save_report(&self, report: &GeneratedReport) -> PortResult<GeneratedReport>;

    async fn find_latest(
        &self,
        child_archive_id: Uuid,
        category: ReportCategory,
    ) -> PortResult<GeneratedReport>;
}

/// Read-only course/game catalog.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn list_courses(&self) -> PortResult<Vec<Course>>;
    async fn get_course(&self, course_id: Uuid) -> PortResult<Course>;
    async fn list_games(&self) -> PortResult<Vec<Game>>;
    async fn get_game(&self, game_id: Uuid) -> PortResult<Game>;
}

//=========================================================================================
// Generation Backend Port
//=========================================================================================

/// Turns a built prompt into report text. Implemented by the local
/// deterministic generator and by the remote chat-completions adapter; the
/// orchestrator never knows which one it holds.
#[async_trait]
pub trait ReportGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}
