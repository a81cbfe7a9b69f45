//! crates/healing_companion_core/src/report.rs
//!
//! The report orchestrator: ties the journal store, the prompt builder and
//! a generation backend together behind the three public report
//! operations. All collaborators arrive through explicit constructor
//! injection; there is no ambient state.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use uuid::Uuid;

use crate::domain::{GeneratedReport, NewReport, ReportCategory};
use crate::ports::{GenerationError, JournalStore, PortError, ReportGenerator, ReportStore};
use crate::prompt::build_prompt;

//=========================================================================================
// Orchestrator Error Type
//=========================================================================================

/// Failures of the report operations. Every stage is distinguishable and
/// carries its own label; a generation failure is surfaced as-is and is
/// never masked by falling back to the deterministic generator.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("invalid request: {0}")]
    Validation(String),
    #[error("report not found: {0}")]
    NotFound(String),
    #[error("{stage} failed: {source}")]
    Upstream {
        stage: &'static str,
        source: PortError,
    },
    #[error("report generation failed: {0}")]
    Generation(#[from] GenerationError),
}

fn upstream(stage: &'static str) -> impl FnOnce(PortError) -> ReportError {
    move |source| ReportError::Upstream { stage, source }
}

//=========================================================================================
// Report Service
//=========================================================================================

/// The single entry point for generating, editing and fetching reports.
#[derive(Clone)]
pub struct ReportService {
    journal: Arc<dyn JournalStore>,
    reports: Arc<dyn ReportStore>,
    generator: Arc<dyn ReportGenerator>,
}

impl ReportService {
    pub fn new(
        journal: Arc<dyn JournalStore>,
        reports: Arc<dyn ReportStore>,
        generator: Arc<dyn ReportGenerator>,
    ) -> Self {
        Self {
            journal,
            reports,
            generator,
        }
    }

    /// Generates and persists a new report for a child.
    ///
    /// Fetches the child's journal entries (oldest first, optionally
    /// bounded by the inclusive date range), builds the prompt, invokes
    /// the generation backend and stores the result with
    /// `is_edited = false`. Nothing is persisted when any stage fails.
    pub async fn generate(
        &self,
        child_archive_id: Uuid,
        category: ReportCategory,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<GeneratedReport, ReportError> {
        let from = start_date.map(day_start);
        // Inclusive end-of-day, expressed as an exclusive next-midnight bound.
        let until = end_date.map(day_after);

        let entries = self
            .journal
            .list_by_child(child_archive_id, from, until)
            .await
            .map_err(upstream("fetching healing logs"))?;

        let prompt = build_prompt(&entries, category);
        let content = self.generator.generate(&prompt).await?;

        self.reports
            .create_report(NewReport {
                child_archive_id,
                category,
                content,
                generated_at: Utc::now(),
            })
            .await
            .map_err(upstream("saving report"))
    }

    /// Replaces a report's content and marks it edited.
    ///
    /// Fails with `NotFound` for an unknown id; an edit never materializes
    /// a new row. The edited flag is monotonic - once set it stays set.
    pub async fn update_content(
        &self,
        report_id: i64,
        content: &str,
    ) -> Result<GeneratedReport, ReportError> {
        if content.trim().is_empty() {
            return Err(ReportError::Validation(
                "report content must not be empty".to_string(),
            ));
        }

        let mut report = match self.reports.get_report(report_id).await {
            Ok(report) => report,
            Err(PortError::NotFound(msg)) => return Err(ReportError::NotFound(msg)),
            Err(e) => return Err(upstream("loading report")(e)),
        };

        report.content = content.to_string();
        report.is_edited = true;

        self.reports
            .save_report(&report)
            .await
            .map_err(upstream("saving report"))
    }

    /// Fetches a single report by id.
    pub async fn get(&self, report_id: i64) -> Result<GeneratedReport, ReportError> {
        match self.reports.get_report(report_id).await {
            Ok(report) => Ok(report),
            Err(PortError::NotFound(msg)) => Err(ReportError::NotFound(msg)),
            Err(e) => Err(upstream("loading report")(e)),
        }
    }

    /// Returns the most recently generated report of a category for a
    /// child. Duplicate category rows may coexist; the newest generation
    /// timestamp wins.
    pub async fn get_latest(
        &self,
        child_archive_id: Uuid,
        category: ReportCategory,
    ) -> Result<GeneratedReport, ReportError> {
        match self.reports.find_latest(child_archive_id, category).await {
            Ok(report) => Ok(report),
            Err(PortError::NotFound(msg)) => Err(ReportError::NotFound(msg)),
            Err(e) => Err(upstream("fetching report")(e)),
        }
    }
}

fn day_start(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

fn day_after(date: NaiveDate) -> DateTime<Utc> {
    date.succ_opt().unwrap_or(date).and_time(NaiveTime::MIN).and_utc()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{JournalEntry, NewJournalEntry};
    use crate::ports::PortResult;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::sync::Mutex;

    //-------------------------------------------------------------------------------------
    // In-memory fakes
    //-------------------------------------------------------------------------------------

    #[derive(Default)]
    struct FakeJournal {
        entries: Vec<JournalEntry>,
        requested_bounds: Mutex<Option<(Option<DateTime<Utc>>, Option<DateTime<Utc>>)>>,
    }

    #[async_trait]
    impl JournalStore for FakeJournal {
        async fn create_entry(&self, _new: NewJournalEntry) -> PortResult<JournalEntry> {
            unimplemented!("not used by the orchestrator")
        }

        async fn get_entry(&self, _entry_id: i64) -> PortResult<JournalEntry> {
            unimplemented!("not used by the orchestrator")
        }

        async fn list_by_child(
            &self,
            child_archive_id: Uuid,
            from: Option<DateTime<Utc>>,
            until: Option<DateTime<Utc>>,
        ) -> PortResult<Vec<JournalEntry>> {
            *self.requested_bounds.lock().unwrap() = Some((from, until));
            Ok(self
                .entries
                .iter()
                .filter(|e| e.child_archive_id == child_archive_id)
                .filter(|e| from.map_or(true, |b| e.created_at >= b))
                .filter(|e| until.map_or(true, |b| e.created_at < b))
                .cloned()
                .collect())
        }

        async fn delete_entry(&self, _entry_id: i64) -> PortResult<()> {
            unimplemented!("not used by the orchestrator")
        }
    }

    #[derive(Default)]
    struct FakeReports {
        rows: Mutex<Vec<GeneratedReport>>,
        next_id: Mutex<i64>,
    }

    impl FakeReports {
        fn row_count(&self) -> usize {
            self.rows.lock().unwrap().len()
        }

        fn insert(&self, report: GeneratedReport) {
            self.rows.lock().unwrap().push(report);
        }
    }

    #[async_trait]
    impl ReportStore for FakeReports {
        async fn create_report(&self, new: NewReport) -> PortResult<GeneratedReport> {
            let mut next = self.next_id.lock().unwrap();
            *next += 1;
            let report = GeneratedReport {
                id: *next,
                child_archive_id: new.child_archive_id,
                category: new.category,
                content: new.content,
                is_edited: false,
                generated_at: new.generated_at,
                updated_at: new.generated_at,
            };
            self.rows.lock().unwrap().push(report.clone());
            Ok(report)
        }

        async fn get_report(&self, report_id: i64) -> PortResult<GeneratedReport> {
            self.rows
                .lock()
                .unwrap()
                .iter()
                .find(|r| r.id == report_id)
                .cloned()
                .ok_or_else(|| PortError::NotFound(format!("report {} not found", report_id)))
        }

        async fn save_report(&self, report: &GeneratedReport) -> PortResult<GeneratedReport> {
            let mut rows = self.rows.lock().unwrap();
            let slot = rows
                .iter_mut()
                .find(|r| r.id == report.id)
                .ok_or_else(|| PortError::NotFound(format!("report {} not found", report.id)))?;
            let mut updated = report.clone();
            updated.updated_at = Utc::now();
            *slot = updated.clone();
            Ok(updated)
        }

        async fn find_latest(
            &self,
            child_archive_id: Uuid,
            category: ReportCategory,
        ) -> PortResult<GeneratedReport> {
            self.rows
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r.child_archive_id == child_archive_id && r.category == category)
                .max_by_key(|r| r.generated_at)
                .cloned()
                .ok_or_else(|| {
                    PortError::NotFound(format!(
                        "no {} report for child {}",
                        category, child_archive_id
                    ))
                })
        }
    }

    struct FixedGenerator(&'static str);

    #[async_trait]
    impl ReportGenerator for FixedGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
            Ok(self.0.to_string())
        }
    }

    struct FailingGenerator;

    #[async_trait]
    impl ReportGenerator for FailingGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
            Err(GenerationError::Provider {
                message: "rate limited".to_string(),
                kind: "rate_limit".to_string(),
            })
        }
    }

    fn entry(child: Uuid, y: i32, m: u32, d: u32, content: &str) -> JournalEntry {
        JournalEntry {
            id: 0,
            child_archive_id: child,
            content: content.to_string(),
            media: Vec::new(),
            created_at: Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap(),
        }
    }

    fn service(
        journal: Arc<FakeJournal>,
        reports: Arc<FakeReports>,
        generator: Arc<dyn ReportGenerator>,
    ) -> ReportService {
        ReportService::new(journal, reports, generator)
    }

    //-------------------------------------------------------------------------------------
    // Tests
    //-------------------------------------------------------------------------------------

    #[tokio::test]
    async fn generate_persists_a_fresh_unedited_report() {
        let child = Uuid::new_v4();
        let journal = Arc::new(FakeJournal {
            entries: vec![entry(child, 2024, 1, 5, "进步明显")],
            ..Default::default()
        });
        let reports = Arc::new(FakeReports::default());
        let svc = service(
            journal,
            reports.clone(),
            Arc::new(FixedGenerator("生成的报告内容")),
        );

        let report = svc
            .generate(child, ReportCategory::DailySummary, None, None)
            .await
            .unwrap();

        assert_eq!(report.child_archive_id, child);
        assert_eq!(report.category, ReportCategory::DailySummary);
        assert_eq!(report.content, "生成的报告内容");
        assert!(!report.is_edited);
        assert_eq!(reports.row_count(), 1);
    }

    #[tokio::test]
    async fn generate_converts_dates_to_inclusive_day_bounds() {
        let child = Uuid::new_v4();
        let journal = Arc::new(FakeJournal {
            entries: vec![
                entry(child, 2024, 1, 4, "范围之前"),
                entry(child, 2024, 1, 10, "范围之内"),
                entry(child, 2024, 1, 15, "最后一天"),
                entry(child, 2024, 1, 16, "范围之后"),
            ],
            ..Default::default()
        });
        let reports = Arc::new(FakeReports::default());
        let svc = service(journal.clone(), reports, Arc::new(FixedGenerator("ok")));

        svc.generate(
            child,
            ReportCategory::Progress,
            Some(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()),
            Some(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()),
        )
        .await
        .unwrap();

        let (from, until) = journal.requested_bounds.lock().unwrap().unwrap();
        assert_eq!(from.unwrap(), Utc.with_ymd_and_hms(2024, 1, 5, 0, 0, 0).unwrap());
        // An entry written any time on the end date is still in range.
        assert_eq!(
            until.unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 16, 0, 0, 0).unwrap()
        );
    }

    #[tokio::test]
    async fn generation_failure_persists_nothing() {
        let child = Uuid::new_v4();
        let journal = Arc::new(FakeJournal::default());
        let reports = Arc::new(FakeReports::default());
        let svc = service(journal, reports.clone(), Arc::new(FailingGenerator));

        let err = svc
            .generate(child, ReportCategory::Suggestions, None, None)
            .await
            .unwrap_err();

        match err {
            ReportError::Generation(GenerationError::Provider { message, kind }) => {
                assert_eq!(message, "rate limited");
                assert_eq!(kind, "rate_limit");
            }
            other => panic!("expected provider error, got {:?}", other),
        }
        assert_eq!(reports.row_count(), 0);
    }

    #[tokio::test]
    async fn update_content_marks_the_report_edited() {
        let child = Uuid::new_v4();
        let reports = Arc::new(FakeReports::default());
        let svc = service(
            Arc::new(FakeJournal::default()),
            reports.clone(),
            Arc::new(FixedGenerator("原始内容")),
        );
        let report = svc
            .generate(child, ReportCategory::DailySummary, None, None)
            .await
            .unwrap();

        let updated = svc.update_content(report.id, "修订内容").await.unwrap();
        assert_eq!(updated.content, "修订内容");
        assert!(updated.is_edited);

        // A second edit keeps the flag set.
        let again = svc.update_content(report.id, "再次修订").await.unwrap();
        assert!(again.is_edited);
        assert_eq!(again.content, "再次修订");
    }

    #[tokio::test]
    async fn get_resolves_a_report_by_id() {
        let child = Uuid::new_v4();
        let reports = Arc::new(FakeReports::default());
        let svc = service(
            Arc::new(FakeJournal::default()),
            reports,
            Arc::new(FixedGenerator("内容")),
        );
        let created = svc
            .generate(child, ReportCategory::Generic, None, None)
            .await
            .unwrap();

        let fetched = svc.get(created.id).await.unwrap();
        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.child_archive_id, child);

        let err = svc.get(created.id + 1).await.unwrap_err();
        assert!(matches!(err, ReportError::NotFound(_)));
    }

    #[tokio::test]
    async fn update_content_of_unknown_id_fails_with_not_found() {
        let svc = service(
            Arc::new(FakeJournal::default()),
            Arc::new(FakeReports::default()),
            Arc::new(FixedGenerator("ok")),
        );
        let err = svc.update_content(7, "修订内容").await.unwrap_err();
        assert!(matches!(err, ReportError::NotFound(_)));
    }

    #[tokio::test]
    async fn update_content_rejects_blank_content() {
        let svc = service(
            Arc::new(FakeJournal::default()),
            Arc::new(FakeReports::default()),
            Arc::new(FixedGenerator("ok")),
        );
        let err = svc.update_content(1, "   ").await.unwrap_err();
        assert!(matches!(err, ReportError::Validation(_)));
    }

    #[tokio::test]
    async fn get_latest_returns_the_newest_of_duplicate_rows() {
        let child = Uuid::new_v4();
        let reports = Arc::new(FakeReports::default());
        let older = GeneratedReport {
            id: 1,
            child_archive_id: child,
            category: ReportCategory::Progress,
            content: "旧报告".to_string(),
            is_edited: false,
            generated_at: Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap(),
        };
        let newer = GeneratedReport {
            id: 2,
            generated_at: Utc.with_ymd_and_hms(2024, 2, 1, 8, 0, 0).unwrap(),
            content: "新报告".to_string(),
            ..older.clone()
        };
        reports.insert(older);
        reports.insert(newer);

        let svc = service(
            Arc::new(FakeJournal::default()),
            reports,
            Arc::new(FixedGenerator("ok")),
        );
        let report = svc
            .get_latest(child, ReportCategory::Progress)
            .await
            .unwrap();
        assert_eq!(report.id, 2);
        assert_eq!(report.content, "新报告");
    }

    #[tokio::test]
    async fn get_latest_without_rows_fails_with_not_found() {
        let svc = service(
            Arc::new(FakeJournal::default()),
            Arc::new(FakeReports::default()),
            Arc::new(FixedGenerator("ok")),
        );
        let err = svc
            .get_latest(Uuid::new_v4(), ReportCategory::DailySummary)
            .await
            .unwrap_err();
        assert!(matches!(err, ReportError::NotFound(_)));
    }
}
