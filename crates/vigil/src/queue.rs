//! The reviewer queue and its resolution cascade

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use vigil_common::{
    ContentId, ContentItem, ModerationError, QueueEntry, Report, ReportStatus, Result, UserId,
    Visibility,
};
use vigil_store::{ItemCommit, ModerationStore};

use crate::locks::ItemLocks;

/// Reviewer decision on a queue entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolveAction {
    /// Restore the item; reports are denied
    Approve,
    /// Withdraw the item from view; reports are upheld
    Hide,
    /// Remove the item for good; reports are upheld
    Delete,
}

impl ResolveAction {
    /// Visibility the item ends up in
    pub fn target(&self) -> Visibility {
        match self {
            ResolveAction::Approve => Visibility::Visible,
            ResolveAction::Hide => Visibility::Hidden,
            ResolveAction::Delete => Visibility::Deleted,
        }
    }

    /// Status given to every pending report
    pub fn report_status(&self) -> ReportStatus {
        match self {
            ResolveAction::Approve => ReportStatus::Denied,
            ResolveAction::Hide | ResolveAction::Delete => ReportStatus::Approved,
        }
    }

    /// Lowercase name, as serialized
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolveAction::Approve => "approve",
            ResolveAction::Hide => "hide",
            ResolveAction::Delete => "delete",
        }
    }
}

impl fmt::Display for ResolveAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResolveAction {
    type Err = ModerationError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "approve" => Ok(ResolveAction::Approve),
            "hide" => Ok(ResolveAction::Hide),
            "delete" => Ok(ResolveAction::Delete),
            other => Err(ModerationError::validation(
                "action",
                format!("unknown action {:?}, expected approve, hide or delete", other),
            )),
        }
    }
}

/// A reviewer's resolution request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bon::Builder)]
#[builder(start_fn = new)]
pub struct ResolveRequest {
    /// Item being resolved
    pub content: ContentId,
    /// Decision
    pub action: ResolveAction,
    /// Reviewer taking the decision
    pub reviewer: UserId,
    /// Reviewer notes for the audit trail
    #[serde(default)]
    #[builder(into)]
    pub notes: Option<String>,
}

/// Result of a resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    /// The item after resolution
    pub content: ContentItem,
    /// Reports closed by this resolution
    pub resolved_reports: Vec<Report>,
}

/// Admin-facing queue of items awaiting review
#[derive(Debug, Clone)]
pub struct ModerationQueue<S> {
    store: S,
    locks: ItemLocks,
}

impl<S: ModerationStore> ModerationQueue<S> {
    /// Create a queue; `locks` must be shared with the report aggregator
    pub fn new(store: S, locks: ItemLocks) -> Self {
        Self { store, locks }
    }

    /// Items awaiting review, most recently flagged first
    ///
    /// An item is listed while it is flagged or hidden and either has an open
    /// report or was flagged after its last review.
    pub async fn list(&self) -> Result<Vec<QueueEntry>> {
        let candidates = self
            .store
            .content_in(&[Visibility::Flagged, Visibility::Hidden])
            .await?;

        let mut entries = Vec::new();
        for content in candidates {
            let pending_reports: Vec<Report> = self
                .store
                .reports_for(&content.id)
                .await?
                .into_iter()
                .filter(Report::is_pending)
                .collect();
            if !pending_reports.is_empty() || content.awaiting_review() {
                entries.push(QueueEntry {
                    content,
                    pending_reports,
                });
            }
        }
        entries.sort_by(|a, b| {
            b.flagged_at()
                .cmp(&a.flagged_at())
                .then_with(|| b.content.id.cmp(&a.content.id))
        });
        Ok(entries)
    }

    /// Apply a reviewer decision to an item and all of its pending reports
    ///
    /// Fails with `InvalidState` if there is nothing to resolve, which is also
    /// what the loser of a concurrent resolution observes.
    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(content_id = %request.content, action = %request.action)
    )]
    pub async fn resolve(&self, request: ResolveRequest) -> Result<Resolution> {
        let _guard = self.locks.lock(&request.content).await;

        let mut item = self
            .store
            .content(&request.content)
            .await?
            .ok_or_else(|| ModerationError::not_found("content", &request.content))?;
        if item.visibility.is_terminal() {
            return Err(ModerationError::invalid_state(format!(
                "content {} has already been deleted",
                item.id
            )));
        }

        let mut pending: Vec<Report> = self
            .store
            .reports_for(&item.id)
            .await?
            .into_iter()
            .filter(Report::is_pending)
            .collect();
        let under_review = item.visibility.is_under_review() && item.awaiting_review();
        if pending.is_empty() && !under_review {
            tracing::warn!(content_id = %item.id, visibility = %item.visibility, "nothing to resolve");
            return Err(ModerationError::invalid_state(format!(
                "content {} has no pending reports and is not awaiting review",
                item.id
            )));
        }

        let now = Utc::now();
        let status = request.action.report_status();
        for report in &mut pending {
            report.resolve(status, request.reviewer.clone(), now);
        }

        let previous = item.visibility;
        item.visibility = request.action.target();
        item.reviewed_at = Some(now);
        item.reviewed_by = Some(request.reviewer.clone());
        let mut note = format!(
            "Resolved: {} ({} report{} {})",
            request.action,
            pending.len(),
            if pending.len() == 1 { "" } else { "s" },
            match status {
                ReportStatus::Denied => "denied",
                _ => "upheld",
            }
        );
        if let Some(notes) = request.notes.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            note.push_str(": ");
            note.push_str(notes);
        }
        item.append_note(Some(request.reviewer), note, now);

        let content = self
            .store
            .apply(ItemCommit::new(item).with_updated_reports(pending.clone()))
            .await?;
        tracing::info!(
            content_id = %content.id,
            from = %previous,
            to = %content.visibility,
            reports = pending.len(),
            "content resolved"
        );

        Ok(Resolution {
            content,
            resolved_reports: pending,
        })
    }
}
