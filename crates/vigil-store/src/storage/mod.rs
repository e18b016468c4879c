//! Storage abstraction for content items and reports

use vigil_common::{ContentId, ContentItem, Report, ReportId, Result, Visibility};

/// Async moderation storage trait
///
/// Implementations might use:
/// - In-memory maps ([`MemoryStore`])
/// - A JSON snapshot file ([`FileStore`])
/// - Postgres/SQLite (user-provided)
///
/// Clone is required so the engine components can share one store.
///
/// # Atomicity
///
/// Every write the pipeline performs after admission goes through [`apply`],
/// which must be all-or-nothing: either the item, its new reports and its
/// updated reports are all written, or none are. The commit carries the item
/// version the caller read; a store must reject the commit with a
/// `ConcurrencyConflict` error if the stored version has moved on.
///
/// [`apply`]: ModerationStore::apply
#[trait_variant::make(Send)]
pub trait ModerationStore: Clone {
    /// Get a content item by id
    ///
    /// Returns `None` if the item does not exist.
    async fn content(&self, id: &ContentId) -> Result<Option<ContentItem>>;

    /// Persist a newly admitted content item
    ///
    /// Fails with `InvalidState` if an item with the same id already exists.
    async fn insert_content(&self, item: ContentItem) -> Result<()>;

    /// All content items currently in one of `states`
    async fn content_in(&self, states: &[Visibility]) -> Result<Vec<ContentItem>>;

    /// Get a report by id
    async fn report(&self, id: &ReportId) -> Result<Option<Report>>;

    /// All reports filed against a content item, oldest first
    async fn reports_for(&self, content: &ContentId) -> Result<Vec<Report>>;

    /// Apply a commit (atomic compare-version + write)
    ///
    /// Returns the stored item with its bumped version.
    async fn apply(&self, commit: ItemCommit) -> Result<ContentItem>;
}

/// One atomic write against a single content item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemCommit {
    /// New state of the item
    pub item: ContentItem,
    /// Version the writer read before computing `item`
    pub expected_version: u64,
    /// Reports to insert
    pub new_reports: Vec<Report>,
    /// Existing reports to overwrite (status changes)
    pub updated_reports: Vec<Report>,
}

impl ItemCommit {
    /// Start a commit for an item read at its current version
    pub fn new(item: ContentItem) -> Self {
        let expected_version = item.version;
        Self {
            item,
            expected_version,
            new_reports: Vec::new(),
            updated_reports: Vec::new(),
        }
    }

    /// Add a report to insert
    pub fn with_new_report(mut self, report: Report) -> Self {
        self.new_reports.push(report);
        self
    }

    /// Add reports to overwrite
    pub fn with_updated_reports(mut self, reports: impl IntoIterator<Item = Report>) -> Self {
        self.updated_reports.extend(reports);
        self
    }
}

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::Utc;
    use vigil_common::{
        ContentId, ContentItem, Report, ReportId, ReportReason, ReportStatus, UserId, Visibility,
    };

    pub fn item() -> ContentItem {
        ContentItem {
            id: ContentId::generate(),
            author: UserId::new("author").unwrap(),
            text: "a post".into(),
            attachment_count: 0,
            created_at: Utc::now(),
            visibility: Visibility::Visible,
            risk_score: 0,
            author_trust: 0,
            flagged_at: None,
            reviewed_at: None,
            reviewed_by: None,
            notes: Vec::new(),
            version: 0,
        }
    }

    pub fn report(item: &ContentItem, reporter: &str) -> Report {
        Report {
            id: ReportId::generate(),
            reporter: UserId::new(reporter).unwrap(),
            content: item.id.clone(),
            reported_user: item.author.clone(),
            reason: ReportReason::Spam,
            details: None,
            status: ReportStatus::Pending,
            created_at: Utc::now(),
            resolved_at: None,
            resolver: None,
        }
    }
}
