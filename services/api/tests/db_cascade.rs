//! services/api/tests/db_cascade.rs
//!
//! Adapter-level coverage for the journal delete transaction: an entry and
//! its media rows leave together, and a missed entry row leaves both
//! untouched. Runs against the database in `DATABASE_URL` and is skipped
//! when none is configured.

use chrono::{NaiveDate, Utc};
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use api_lib::adapters::db::DbAdapter;
use healing_companion_core::domain::{ChildArchive, MediaKind, NewJournalEntry, NewMedia};
use healing_companion_core::ports::{ArchiveStore, JournalStore, PortError, UserStore};

#[tokio::test]
async fn entry_delete_is_atomic_with_its_media_rows() {
    let url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("DATABASE_URL is not set; skipping the database cascade test");
            return;
        }
    };

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&url)
        .await
        .expect("failed to connect to the test database");
    let db = DbAdapter::new(pool.clone());
    db.run_migrations().await.expect("migrations failed");

    // Unique owner per run so reruns against a shared database don't collide.
    let user = db
        .create_user(
            &format!("cascade-{}@example.com", Uuid::new_v4()),
            "tester",
            "not-a-real-hash",
        )
        .await
        .unwrap();
    let now = Utc::now();
    let archive = db
        .create_archive(ChildArchive {
            id: Uuid::new_v4(),
            user_id: user.id,
            child_name: "小明".to_string(),
            gender: String::new(),
            birth_date: NaiveDate::from_ymd_opt(2018, 6, 1).unwrap(),
            condition: String::new(),
            diagnosis: String::new(),
            treatment: String::new(),
            notes: String::new(),
            treatment_start_date: None,
            created_at: now,
            updated_at: now,
        })
        .await
        .unwrap();

    let entry = db
        .create_entry(NewJournalEntry {
            child_archive_id: archive.id,
            content: "今天完成了情绪卡片练习".to_string(),
            media: vec![
                NewMedia {
                    kind: MediaKind::Image,
                    url: "https://cdn.example.com/a.jpg".to_string(),
                },
                NewMedia {
                    kind: MediaKind::Video,
                    url: "https://cdn.example.com/b.mp4".to_string(),
                },
            ],
        })
        .await
        .unwrap();
    assert_eq!(entry.media.len(), 2);

    // Deleting an id that doesn't exist fails with NotFound and rolls the
    // transaction back, leaving the entry and its media rows intact.
    let err = db.delete_entry(i64::MAX).await.unwrap_err();
    assert!(matches!(err, PortError::NotFound(_)));
    let survived = db.get_entry(entry.id).await.unwrap();
    assert_eq!(survived.media.len(), 2);

    // A real delete removes the media rows in the same transaction.
    db.delete_entry(entry.id).await.unwrap();
    let err = db.get_entry(entry.id).await.unwrap_err();
    assert!(matches!(err, PortError::NotFound(_)));

    let orphaned: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM log_media WHERE journal_entry_id = $1")
            .bind(entry.id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(orphaned, 0);

    // Cleanup so reruns stay tidy; archive delete cascades through the FKs.
    db.delete_archive(user.id, archive.id).await.unwrap();
}
