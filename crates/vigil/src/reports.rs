//! Community reports and automatic hiding

use chrono::Utc;
use serde::{Deserialize, Serialize};
use vigil_common::{
    ContentId, ContentItem, ModerationError, Report, ReportId, ReportReason, ReportStatus, Result,
    UserId, Visibility,
};
use vigil_store::{ItemCommit, ModerationStore};

use crate::locks::ItemLocks;

/// Longest accepted report explanation, in characters
pub const MAX_DETAILS_LENGTH: usize = 2000;

/// A report as filed by a community member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bon::Builder)]
#[builder(start_fn = new)]
pub struct ReportRequest {
    /// The reported post
    pub content: ContentId,
    /// Who is filing
    pub reporter: UserId,
    /// Category
    pub reason: ReportReason,
    /// Optional free-text explanation
    #[serde(default)]
    #[builder(into)]
    pub details: Option<String>,
}

/// Result of filing a report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FiledReport {
    /// The stored report
    pub report: Report,
    /// Whether this report pushed the item over the auto-hide threshold
    pub auto_hidden: bool,
    /// The item after the report was applied
    pub content: ContentItem,
}

/// Files reports and hides items that collect too many of them
#[derive(Debug, Clone)]
pub struct ReportAggregator<S> {
    store: S,
    locks: ItemLocks,
    auto_hide: usize,
}

impl<S: ModerationStore> ReportAggregator<S> {
    /// Create an aggregator; `locks` must be shared with anything else that
    /// writes the same items
    pub fn new(store: S, locks: ItemLocks, auto_hide: usize) -> Self {
        Self {
            store,
            locks,
            auto_hide,
        }
    }

    /// File a report against a content item
    ///
    /// Flags a visible item, and hides it once the number of pending reports
    /// reaches the auto-hide threshold. Hiding happens once per crossing: an
    /// item that is already hidden only accumulates the report.
    #[tracing::instrument(
        name = "file_report",
        level = "debug",
        skip_all,
        fields(content_id = %request.content)
    )]
    pub async fn file(&self, request: ReportRequest) -> Result<FiledReport> {
        let details = normalize_details(request.details)?;
        let _guard = self.locks.lock(&request.content).await;

        let mut item = self
            .store
            .content(&request.content)
            .await?
            .ok_or_else(|| ModerationError::not_found("content", &request.content))?;
        if item.visibility.is_terminal() {
            return Err(ModerationError::invalid_state(format!(
                "content {} has been deleted",
                item.id
            )));
        }

        let pending = self
            .store
            .reports_for(&item.id)
            .await?
            .iter()
            .filter(|r| r.is_pending())
            .count()
            + 1;

        let now = Utc::now();
        let report = Report {
            id: ReportId::generate(),
            reporter: request.reporter,
            content: item.id.clone(),
            reported_user: item.author.clone(),
            reason: request.reason,
            details,
            status: ReportStatus::Pending,
            created_at: now,
            resolved_at: None,
            resolver: None,
        };

        if item.flag(now) {
            tracing::debug!(content_id = %item.id, "flagged by report");
        }
        let auto_hidden = pending >= self.auto_hide && item.visibility != Visibility::Hidden;
        if auto_hidden {
            item.visibility = Visibility::Hidden;
            item.append_note(
                None,
                format!("Automatically hidden after {} open reports", pending),
                now,
            );
        }

        let content = self
            .store
            .apply(ItemCommit::new(item).with_new_report(report.clone()))
            .await?;
        if auto_hidden {
            tracing::info!(content_id = %content.id, pending, "content hidden automatically");
        }

        Ok(FiledReport {
            report,
            auto_hidden,
            content,
        })
    }
}

fn normalize_details(details: Option<String>) -> Result<Option<String>> {
    let Some(details) = details else {
        return Ok(None);
    };
    let details = details.trim();
    if details.is_empty() {
        return Ok(None);
    }
    let len = details.chars().count();
    if len > MAX_DETAILS_LENGTH {
        return Err(ModerationError::validation(
            "details",
            format!("details are {} characters, the limit is {}", len, MAX_DETAILS_LENGTH),
        ));
    }
    Ok(Some(details.to_string()))
}
