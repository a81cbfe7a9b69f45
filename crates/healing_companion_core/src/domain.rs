//! crates/healing_companion_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

/// Represents a parent/guardian account.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
}

// Only used internally for login/signup - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub password_hash: String,
}

/// A child's profile, owned by a user account. Journal entries and
/// generated reports hang off this.
#[derive(Debug, Clone)]
pub struct ChildArchive {
    pub id: Uuid,
    pub user_id: Uuid,
    pub child_name: String,
    pub gender: String,
    pub birth_date: NaiveDate,
    pub condition: String,
    pub diagnosis: String,
    pub treatment: String,
    pub notes: String,
    pub treatment_start_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChildArchive {
    /// Whole days elapsed since the treatment started, as of `today`.
    /// Zero when no start date is set or the start date lies in the future.
    pub fn healed_days(&self, today: NaiveDate) -> i64 {
        match self.treatment_start_date {
            Some(start) => (today - start).num_days().max(0),
            None => 0,
        }
    }
}

/// The kind of a media attachment on a journal entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "image" => Some(MediaKind::Image),
            "video" => Some(MediaKind::Video),
            _ => None,
        }
    }
}

/// A media attachment owned by exactly one journal entry. Deleted together
/// with its entry in a single transaction.
#[derive(Debug, Clone)]
pub struct Media {
    pub id: i64,
    pub journal_entry_id: i64,
    pub kind: MediaKind,
    pub url: String,
}

/// A single dated healing-log note about a child's observed behaviour,
/// with optional media attachments. Immutable once created except for
/// deletion.
#[derive(Debug, Clone)]
pub struct JournalEntry {
    pub id: i64,
    pub child_archive_id: Uuid,
    pub content: String,
    pub media: Vec<Media>,
    pub created_at: DateTime<Utc>,
}

/// Payload for creating a new journal entry; the store assigns the id and
/// timestamps.
#[derive(Debug, Clone)]
pub struct NewJournalEntry {
    pub child_archive_id: Uuid,
    pub content: String,
    pub media: Vec<NewMedia>,
}

#[derive(Debug, Clone)]
pub struct NewMedia {
    pub kind: MediaKind,
    pub url: String,
}

/// The closed set of report categories. Each variant selects its own
/// prompt template triple; unrecognized tags collapse to `Generic` at the
/// boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportCategory {
    DailySummary,
    Suggestions,
    Progress,
    Generic,
}

impl ReportCategory {
    /// Parses an incoming category tag. Returns `None` only for a blank
    /// tag; any non-blank unrecognized value maps to `Generic`.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag.trim() {
            "" => None,
            "daily_summary" => Some(ReportCategory::DailySummary),
            "suggestion" | "suggestions" => Some(ReportCategory::Suggestions),
            "progress" => Some(ReportCategory::Progress),
            _ => Some(ReportCategory::Generic),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportCategory::DailySummary => "daily_summary",
            ReportCategory::Suggestions => "suggestions",
            ReportCategory::Progress => "progress",
            ReportCategory::Generic => "generic",
        }
    }
}

impl std::fmt::Display for ReportCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An AI-generated progress report. Created by the report service;
/// mutated only through an explicit content edit, which flips `is_edited`
/// permanently.
#[derive(Debug, Clone)]
pub struct GeneratedReport {
    pub id: i64,
    pub child_archive_id: Uuid,
    pub category: ReportCategory,
    pub content: String,
    pub is_edited: bool,
    pub generated_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for persisting a freshly generated report.
#[derive(Debug, Clone)]
pub struct NewReport {
    pub child_archive_id: Uuid,
    pub category: ReportCategory,
    pub content: String,
    pub generated_at: DateTime<Utc>,
}

/// A catalog course entry (read-only content).
#[derive(Debug, Clone)]
pub struct Course {
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

/// A catalog game entry (read-only content).
#[derive(Debug, Clone)]
pub struct Game {
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
