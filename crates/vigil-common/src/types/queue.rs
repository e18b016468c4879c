use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ContentItem, Report};

/// Admin-facing view of an item awaiting review
///
/// Derived on read by joining a flagged or hidden [`ContentItem`] with its
/// pending reports; never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEntry {
    /// The item under review
    pub content: ContentItem,
    /// Reports still awaiting a decision, oldest first
    pub pending_reports: Vec<Report>,
}

impl QueueEntry {
    /// When the item most recently entered review
    pub fn flagged_at(&self) -> Option<DateTime<Utc>> {
        self.content.flagged_at
    }

    /// Risk score stamped at admission
    pub fn risk_score(&self) -> i64 {
        self.content.risk_score
    }

    /// Number of open reports
    pub fn report_count(&self) -> usize {
        self.pending_reports.len()
    }
}
