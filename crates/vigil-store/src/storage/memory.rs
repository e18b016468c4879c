//! In-memory moderation storage implementation

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use vigil_common::{
    ContentId, ContentItem, ModerationError, Report, ReportId, Result, Visibility,
};

use crate::storage::{ItemCommit, ModerationStore};

/// Tables shared by the memory and file stores
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct Tables {
    content: BTreeMap<ContentId, ContentItem>,
    reports: BTreeMap<ReportId, Report>,
    #[serde(skip)]
    by_content: HashMap<ContentId, Vec<ReportId>>,
}

impl Tables {
    /// Rebuild the per-item report index after deserializing
    pub(crate) fn reindex(&mut self) {
        self.by_content.clear();
        for report in self.reports.values() {
            self.by_content
                .entry(report.content.clone())
                .or_default()
                .push(report.id.clone());
        }
    }

    pub(crate) fn content(&self, id: &ContentId) -> Option<ContentItem> {
        self.content.get(id).cloned()
    }

    pub(crate) fn insert_content(&mut self, item: ContentItem) -> Result<()> {
        if self.content.contains_key(&item.id) {
            return Err(ModerationError::invalid_state(format!(
                "content {} already exists",
                item.id
            )));
        }
        self.content.insert(item.id.clone(), item);
        Ok(())
    }

    pub(crate) fn content_in(&self, states: &[Visibility]) -> Vec<ContentItem> {
        self.content
            .values()
            .filter(|item| states.contains(&item.visibility))
            .cloned()
            .collect()
    }

    pub(crate) fn report(&self, id: &ReportId) -> Option<Report> {
        self.reports.get(id).cloned()
    }

    pub(crate) fn reports_for(&self, content: &ContentId) -> Vec<Report> {
        // report ids are time-ordered, so index order is filing order
        self.by_content
            .get(content)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| self.reports.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Validate the whole commit before touching any table
    pub(crate) fn apply(&mut self, commit: ItemCommit) -> Result<ContentItem> {
        let ItemCommit {
            mut item,
            expected_version,
            new_reports,
            updated_reports,
        } = commit;

        let stored = self
            .content
            .get(&item.id)
            .ok_or_else(|| ModerationError::not_found("content", &item.id))?;
        if stored.version != expected_version {
            return Err(ModerationError::conflict("content", &item.id));
        }

        for report in &new_reports {
            if report.content != item.id {
                return Err(ModerationError::validation(
                    "report",
                    format!("report {} targets a different item", report.id),
                ));
            }
            if self.reports.contains_key(&report.id) {
                return Err(ModerationError::invalid_state(format!(
                    "report {} already exists",
                    report.id
                )));
            }
        }
        for report in &updated_reports {
            match self.reports.get(&report.id) {
                Some(existing) if existing.content == item.id => {}
                Some(_) => {
                    return Err(ModerationError::validation(
                        "report",
                        format!("report {} targets a different item", report.id),
                    ));
                }
                None => return Err(ModerationError::not_found("report", &report.id)),
            }
        }

        item.version = expected_version + 1;
        for report in new_reports {
            self.by_content
                .entry(report.content.clone())
                .or_default()
                .push(report.id.clone());
            self.reports.insert(report.id.clone(), report);
        }
        for report in updated_reports {
            self.reports.insert(report.id.clone(), report);
        }
        self.content.insert(item.id.clone(), item.clone());
        Ok(item)
    }

    pub(crate) fn len(&self) -> (usize, usize) {
        (self.content.len(), self.reports.len())
    }
}

/// In-memory moderation storage
///
/// Useful for:
/// - Testing
/// - Embedding the pipeline in a single process
///
/// Clones share the same underlying tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    /// Create new empty memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored content items and reports
    pub async fn len(&self) -> (usize, usize) {
        self.tables.read().await.len()
    }
}

impl ModerationStore for MemoryStore {
    async fn content(&self, id: &ContentId) -> Result<Option<ContentItem>> {
        Ok(self.tables.read().await.content(id))
    }

    async fn insert_content(&self, item: ContentItem) -> Result<()> {
        self.tables.write().await.insert_content(item)
    }

    async fn content_in(&self, states: &[Visibility]) -> Result<Vec<ContentItem>> {
        Ok(self.tables.read().await.content_in(states))
    }

    async fn report(&self, id: &ReportId) -> Result<Option<Report>> {
        Ok(self.tables.read().await.report(id))
    }

    async fn reports_for(&self, content: &ContentId) -> Result<Vec<Report>> {
        Ok(self.tables.read().await.reports_for(content))
    }

    async fn apply(&self, commit: ItemCommit) -> Result<ContentItem> {
        self.tables.write().await.apply(commit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::fixtures;
    use vigil_common::{ErrorKind, ReportStatus, UserId};

    #[tokio::test]
    async fn test_insert_and_get() {
        let store = MemoryStore::new();
        let item = fixtures::item();

        store.insert_content(item.clone()).await.unwrap();
        let fetched = store.content(&item.id).await.unwrap();

        assert_eq!(fetched, Some(item));
    }

    #[tokio::test]
    async fn test_duplicate_insert_is_invalid_state() {
        let store = MemoryStore::new();
        let item = fixtures::item();

        store.insert_content(item.clone()).await.unwrap();
        let err = store.insert_content(item).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }

    #[tokio::test]
    async fn test_apply_bumps_version_and_indexes_reports() {
        let store = MemoryStore::new();
        let item = fixtures::item();
        store.insert_content(item.clone()).await.unwrap();

        let first = fixtures::report(&item, "r1");
        let second = fixtures::report(&item, "r2");
        let stored = store
            .apply(ItemCommit::new(item.clone()).with_new_report(first.clone()))
            .await
            .unwrap();
        assert_eq!(stored.version, 1);

        store
            .apply(ItemCommit::new(stored).with_new_report(second.clone()))
            .await
            .unwrap();

        let reports = store.reports_for(&item.id).await.unwrap();
        assert_eq!(reports, vec![first, second]);
        assert_eq!(store.len().await, (1, 2));
    }

    #[tokio::test]
    async fn test_stale_version_is_rejected_without_writes() {
        let store = MemoryStore::new();
        let item = fixtures::item();
        store.insert_content(item.clone()).await.unwrap();

        store
            .apply(ItemCommit::new(item.clone()).with_new_report(fixtures::report(&item, "r1")))
            .await
            .unwrap();

        // second writer still holds version 0
        let mut stale = item.clone();
        stale.visibility = Visibility::Hidden;
        let err = store
            .apply(ItemCommit::new(stale).with_new_report(fixtures::report(&item, "r2")))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ConcurrencyConflict);
        assert_eq!(store.len().await, (1, 1));
        let current = store.content(&item.id).await.unwrap().unwrap();
        assert_eq!(current.visibility, Visibility::Visible);
    }

    #[tokio::test]
    async fn test_unknown_updated_report_rolls_back_everything() {
        let store = MemoryStore::new();
        let item = fixtures::item();
        store.insert_content(item.clone()).await.unwrap();

        let mut ghost = fixtures::report(&item, "ghost");
        ghost.resolve(ReportStatus::Approved, UserId::new("admin").unwrap(), chrono::Utc::now());
        let mut hidden = item.clone();
        hidden.visibility = Visibility::Hidden;

        let err = store
            .apply(
                ItemCommit::new(hidden)
                    .with_new_report(fixtures::report(&item, "r1"))
                    .with_updated_reports([ghost]),
            )
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(store.len().await, (1, 0));
        assert_eq!(
            store.content(&item.id).await.unwrap().unwrap().version,
            0
        );
    }

    #[tokio::test]
    async fn test_content_in_filters_by_state() {
        let store = MemoryStore::new();
        let visible = fixtures::item();
        let mut flagged = fixtures::item();
        flagged.visibility = Visibility::Flagged;
        store.insert_content(visible).await.unwrap();
        store.insert_content(flagged.clone()).await.unwrap();

        let found = store
            .content_in(&[Visibility::Flagged, Visibility::Hidden])
            .await
            .unwrap();
        assert_eq!(found, vec![flagged]);
    }

    #[tokio::test]
    async fn test_clone_shares_storage() {
        let store1 = MemoryStore::new();
        let store2 = store1.clone();

        let item = fixtures::item();
        store1.insert_content(item.clone()).await.unwrap();
        assert!(store2.content(&item.id).await.unwrap().is_some());
    }
}
