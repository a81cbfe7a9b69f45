//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete
//! implementation of the store ports from the core crate. It handles all
//! interactions with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use healing_companion_core::domain::{
    ChildArchive, Course, Game, GeneratedReport, JournalEntry, Media, MediaKind, NewJournalEntry,
    NewReport, ReportCategory, User, UserCredentials,
};
use healing_companion_core::ports::{
    ArchiveStore, CatalogStore, JournalStore, PortError, PortResult, ReportStore, UserStore,
};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements all store ports against Postgres.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Attaches media rows to their parent entries, preserving entry order.
    async fn load_media(&self, entry_ids: &[i64]) -> PortResult<Vec<MediaRecord>> {
        sqlx::query_as::<_, MediaRecord>(
            "SELECT id, journal_entry_id, kind, url FROM log_media \
             WHERE journal_entry_id = ANY($1) ORDER BY id ASC",
        )
        .bind(entry_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

fn not_found_or(e: sqlx::Error, what: String) -> PortError {
    match e {
        sqlx::Error::RowNotFound => PortError::NotFound(what),
        _ => PortError::Unexpected(e.to_string()),
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    id: Uuid,
    email: String,
    display_name: String,
    created_at: DateTime<Utc>,
}

impl UserRecord {
    fn to_domain(self) -> User {
        User {
            id: self.id,
            email: self.email,
            display_name: self.display_name,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct CredentialsRecord {
    id: Uuid,
    email: String,
    display_name: String,
    password_hash: String,
}

impl CredentialsRecord {
    fn to_domain(self) -> UserCredentials {
        UserCredentials {
            id: self.id,
            email: self.email,
            display_name: self.display_name,
            password_hash: self.password_hash,
        }
    }
}

#[derive(FromRow)]
struct ArchiveRecord {
    id: Uuid,
    user_id: Uuid,
    child_name: String,
    gender: String,
    birth_date: NaiveDate,
    condition: String,
    diagnosis: String,
    treatment: String,
    notes: String,
    treatment_start_date: Option<NaiveDate>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ArchiveRecord {
    fn to_domain(self) -> ChildArchive {
        ChildArchive {
            id: self.id,
            user_id: self.user_id,
            child_name: self.child_name,
            gender: self.gender,
            birth_date: self.birth_date,
            condition: self.condition,
            diagnosis: self.diagnosis,
            treatment: self.treatment,
            notes: self.notes,
            treatment_start_date: self.treatment_start_date,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

const ARCHIVE_COLUMNS: &str = "id, user_id, child_name, gender, birth_date, condition, \
     diagnosis, treatment, notes, treatment_start_date, created_at, updated_at";

#[derive(FromRow)]
struct EntryRecord {
    id: i64,
    child_archive_id: Uuid,
    content: String,
    created_at: DateTime<Utc>,
}

impl EntryRecord {
    fn to_domain(self, media: Vec<Media>) -> JournalEntry {
        JournalEntry {
            id: self.id,
            child_archive_id: self.child_archive_id,
            content: self.content,
            media,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct MediaRecord {
    id: i64,
    journal_entry_id: i64,
    kind: String,
    url: String,
}

impl MediaRecord {
    fn to_domain(self) -> Media {
        Media {
            id: self.id,
            journal_entry_id: self.journal_entry_id,
            // Rows are written through MediaKind; an unknown tag can only
            // come from manual edits and degrades to image.
            kind: MediaKind::parse(&self.kind).unwrap_or(MediaKind::Image),
            url: self.url,
        }
    }
}

#[derive(FromRow)]
struct ReportRecord {
    id: i64,
    child_archive_id: Uuid,
    category: String,
    content: String,
    is_edited: bool,
    generated_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ReportRecord {
    fn to_domain(self) -> GeneratedReport {
        GeneratedReport {
            id: self.id,
            child_archive_id: self.child_archive_id,
            category: ReportCategory::parse(&self.category).unwrap_or(ReportCategory::Generic),
            content: self.content,
            is_edited: self.is_edited,
            generated_at: self.generated_at,
            updated_at: self.updated_at,
        }
    }
}

const REPORT_COLUMNS: &str =
    "id, child_archive_id, category, content, is_edited, generated_at, updated_at";

#[derive(FromRow)]
struct CourseRecord {
    id: Uuid,
    title: String,
    description: String,
    category: String,
    level: String,
    duration_minutes: i32,
    cover_image: String,
    video_url: String,
    is_free: bool,
    created_at: DateTime<Utc>,
}

impl CourseRecord {
    fn to_domain(self) -> Course {
        Course {
            id: self.id,
            title: self.title,
            description: self.description,
            category: self.category,
            level: self.level,
            duration_minutes: self.duration_minutes,
            cover_image: self.cover_image,
            video_url: self.video_url,
            is_free: self.is_free,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct GameRecord {
    id: Uuid,
    title: String,
    description: String,
    category: String,
    min_age: i32,
    max_age: i32,
    cover_image: String,
    play_url: String,
    created_at: DateTime<Utc>,
}

impl GameRecord {
    fn to_domain(self) -> Game {
        Game {
            id: self.id,
            title: self.title,
            description: self.description,
            category: self.category,
            min_age: self.min_age,
            max_age: self.max_age,
            cover_image: self.cover_image,
            play_url: self.play_url,
            created_at: self.created_at,
        }
    }
}

//=========================================================================================
// `UserStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl UserStore for DbAdapter {
    async fn create_user(
        &self,
        email: &str,
        display_name: &str,
        password_hash: &str,
    ) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "INSERT INTO users (id, email, display_name, password_hash) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, email, display_name, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(display_name)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn get_credentials_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, CredentialsRecord>(
            "SELECT id, email, display_name, password_hash FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or(e, format!("User {} not found", email)))?;
        Ok(record.to_domain())
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query("INSERT INTO auth_sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(session_id)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        let row: Option<(Uuid,)> = sqlx::query_as(
            "SELECT user_id FROM auth_sessions WHERE id = $1 AND expires_at > NOW()",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        match row {
            Some((user_id,)) => Ok(user_id),
            None => Err(PortError::Unauthorized),
        }
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }
}

//=========================================================================================
// `ArchiveStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl ArchiveStore for DbAdapter {
    async fn create_archive(&self, archive: ChildArchive) -> PortResult<ChildArchive> {
        let record = sqlx::query_as::<_, ArchiveRecord>(&format!(
            "INSERT INTO child_archives \
             (id, user_id, child_name, gender, birth_date, condition, diagnosis, \
              treatment, notes, treatment_start_date) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {ARCHIVE_COLUMNS}"
        ))
        .bind(archive.id)
        .bind(archive.user_id)
        .bind(&archive.child_name)
        .bind(&archive.gender)
        .bind(archive.birth_date)
        .bind(&archive.condition)
        .bind(&archive.diagnosis)
        .bind(&archive.treatment)
        .bind(&archive.notes)
        .bind(archive.treatment_start_date)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn get_archive(&self, user_id: Uuid, archive_id: Uuid) -> PortResult<ChildArchive> {
        let record = sqlx::query_as::<_, ArchiveRecord>(&format!(
            "SELECT {ARCHIVE_COLUMNS} FROM child_archives WHERE id = $1 AND user_id = $2"
        ))
        .bind(archive_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or(e, format!("Child archive {} not found", archive_id)))?;
        Ok(record.to_domain())
    }

    async fn list_archives(&self, user_id: Uuid) -> PortResult<Vec<ChildArchive>> {
        let records = sqlx::query_as::<_, ArchiveRecord>(&format!(
            "SELECT {ARCHIVE_COLUMNS} FROM child_archives \
             WHERE user_id = $1 ORDER BY created_at ASC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(ArchiveRecord::to_domain).collect())
    }

    async fn update_archive(&self, archive: ChildArchive) -> PortResult<ChildArchive> {
        let record = sqlx::query_as::<_, ArchiveRecord>(&format!(
            "UPDATE child_archives SET child_name = $3, gender = $4, birth_date = $5, \
             condition = $6, diagnosis = $7, treatment = $8, notes = $9, \
             treatment_start_date = $10, updated_at = NOW() \
             WHERE id = $1 AND user_id = $2 \
             RETURNING {ARCHIVE_COLUMNS}"
        ))
        .bind(archive.id)
        .bind(archive.user_id)
        .bind(&archive.child_name)
        .bind(&archive.gender)
        .bind(archive.birth_date)
        .bind(&archive.condition)
        .bind(&archive.diagnosis)
        .bind(&archive.treatment)
        .bind(&archive.notes)
        .bind(archive.treatment_start_date)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or(e, format!("Child archive {} not found", archive.id)))?;
        Ok(record.to_domain())
    }

    async fn delete_archive(&self, user_id: Uuid, archive_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM child_archives WHERE id = $1 AND user_id = $2")
            .bind(archive_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!(
                "Child archive {} not found",
                archive_id
            )));
        }
        Ok(())
    }
}

//=========================================================================================
// `JournalStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl JournalStore for DbAdapter {
    async fn create_entry(&self, new: NewJournalEntry) -> PortResult<JournalEntry> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        let record = sqlx::query_as::<_, EntryRecord>(
            "INSERT INTO healing_logs (child_archive_id, content) VALUES ($1, $2) \
             RETURNING id, child_archive_id, content, created_at",
        )
        .bind(new.child_archive_id)
        .bind(&new.content)
        .fetch_one(&mut *tx)
        .await
        .map_err(unexpected)?;

        let mut media = Vec::with_capacity(new.media.len());
        for item in &new.media {
            let row = sqlx::query_as::<_, MediaRecord>(
                "INSERT INTO log_media (journal_entry_id, kind, url) VALUES ($1, $2, $3) \
                 RETURNING id, journal_entry_id, kind, url",
            )
            .bind(record.id)
            .bind(item.kind.as_str())
            .bind(&item.url)
            .fetch_one(&mut *tx)
            .await
            .map_err(unexpected)?;
            media.push(row.to_domain());
        }

        tx.commit().await.map_err(unexpected)?;
        Ok(record.to_domain(media))
    }

    async fn get_entry(&self, entry_id: i64) -> PortResult<JournalEntry> {
        let record = sqlx::query_as::<_, EntryRecord>(
            "SELECT id, child_archive_id, content, created_at FROM healing_logs WHERE id = $1",
        )
        .bind(entry_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or(e, format!("Healing log {} not found", entry_id)))?;

        let media = self
            .load_media(&[record.id])
            .await?
            .into_iter()
            .map(MediaRecord::to_domain)
            .collect();
        Ok(record.to_domain(media))
    }

    async fn list_by_child(
        &self,
        child_archive_id: Uuid,
        from: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> PortResult<Vec<JournalEntry>> {
        let records = sqlx::query_as::<_, EntryRecord>(
            "SELECT id, child_archive_id, content, created_at FROM healing_logs \
             WHERE child_archive_id = $1 \
               AND ($2::timestamptz IS NULL OR created_at >= $2) \
               AND ($3::timestamptz IS NULL OR created_at < $3) \
             ORDER BY created_at ASC",
        )
        .bind(child_archive_id)
        .bind(from)
        .bind(until)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        if records.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = records.iter().map(|r| r.id).collect();
        let mut media_by_entry = std::collections::HashMap::<i64, Vec<Media>>::new();
        for row in self.load_media(&ids).await? {
            media_by_entry
                .entry(row.journal_entry_id)
                .or_default()
                .push(row.to_domain());
        }

        Ok(records
            .into_iter()
            .map(|r| {
                let media = media_by_entry.remove(&r.id).unwrap_or_default();
                r.to_domain(media)
            })
            .collect())
    }

    async fn delete_entry(&self, entry_id: i64) -> PortResult<()> {
        // Media rows and the entry row go in one transaction; a failure in
        // either statement rolls the whole delete back.
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        sqlx::query("DELETE FROM log_media WHERE journal_entry_id = $1")
            .bind(entry_id)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;

        let result = sqlx::query("DELETE FROM healing_logs WHERE id = $1")
            .bind(entry_id)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;

        if result.rows_affected() == 0 {
            tx.rollback().await.map_err(unexpected)?;
            return Err(PortError::NotFound(format!(
                "Healing log {} not found",
                entry_id
            )));
        }

        tx.commit().await.map_err(unexpected)?;
        Ok(())
    }
}

//=========================================================================================
// `ReportStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl ReportStore for DbAdapter {
    async fn create_report(&self, new: NewReport) -> PortResult<GeneratedReport> {
        let record = sqlx::query_as::<_, ReportRecord>(&format!(
            "INSERT INTO generated_reports \
             (child_archive_id, category, content, is_edited, generated_at) \
             VALUES ($1, $2, $3, FALSE, $4) \
             RETURNING {REPORT_COLUMNS}"
        ))
        .bind(new.child_archive_id)
        .bind(new.category.as_str())
        .bind(&new.content)
        .bind(new.generated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn get_report(&self, report_id: i64) -> PortResult<GeneratedReport> {
        let record = sqlx::query_as::<_, ReportRecord>(&format!(
            "SELECT {REPORT_COLUMNS} FROM generated_reports WHERE id = $1"
        ))
        .bind(report_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or(e, format!("Report {} not found", report_id)))?;
        Ok(record.to_domain())
    }

    async fn save_report(&self, report: &GeneratedReport) -> PortResult<GeneratedReport> {
        let record = sqlx::query_as::<_, ReportRecord>(&format!(
            "UPDATE generated_reports SET content = $2, is_edited = $3, updated_at = NOW() \
             WHERE id = $1 RETURNING {REPORT_COLUMNS}"
        ))
        .bind(report.id)
        .bind(&report.content)
        .bind(report.is_edited)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or(e, format!("Report {} not found", report.id)))?;
        Ok(record.to_domain())
    }

    async fn find_latest(
        &self,
        child_archive_id: Uuid,
        category: ReportCategory,
    ) -> PortResult<GeneratedReport> {
        let record = sqlx::query_as::<_, ReportRecord>(&format!(
            "SELECT {REPORT_COLUMNS} FROM generated_reports \
             WHERE child_archive_id = $1 AND category = $2 \
             ORDER BY generated_at DESC LIMIT 1"
        ))
        .bind(child_archive_id)
        .bind(category.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            not_found_or(
                e,
                format!("No {} report for child {}", category, child_archive_id),
            )
        })?;
        Ok(record.to_domain())
    }
}

//=========================================================================================
// `CatalogStore` Trait Implementation
//=========================================================================================

const COURSE_COLUMNS: &str = "id, title, description, category, level, duration_minutes, \
     cover_image, video_url, is_free, created_at";

const GAME_COLUMNS: &str =
    "id, title, description, category, min_age, max_age, cover_image, play_url, created_at";

#[async_trait]
impl CatalogStore for DbAdapter {
    async fn list_courses(&self) -> PortResult<Vec<Course>> {
        let records = sqlx::query_as::<_, CourseRecord>(&format!(
            "SELECT {COURSE_COLUMNS} FROM courses ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(CourseRecord::to_domain).collect())
    }

    async fn get_course(&self, course_id: Uuid) -> PortResult<Course> {
        let record = sqlx::query_as::<_, CourseRecord>(&format!(
            "SELECT {COURSE_COLUMNS} FROM courses WHERE id = $1"
        ))
        .bind(course_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or(e, format!("Course {} not found", course_id)))?;
        Ok(record.to_domain())
    }

    async fn list_games(&self) -> PortResult<Vec<Game>> {
        let records = sqlx::query_as::<_, GameRecord>(&format!(
            "SELECT {GAME_COLUMNS} FROM games ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(GameRecord::to_domain).collect())
    }

    async fn get_game(&self, game_id: Uuid) -> PortResult<Game> {
        let record = sqlx::query_as::<_, GameRecord>(&format!(
            "SELECT {GAME_COLUMNS} FROM games WHERE id = $1"
        ))
        .bind(game_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or(e, format!("Game {} not found", game_id)))?;
        Ok(record.to_domain())
    }
}
