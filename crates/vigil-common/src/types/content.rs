use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ContentId, UserId};

/// Visibility state of a content item
///
/// `visible → flagged → hidden → deleted`, with `Approve` returning flagged or
/// hidden items to `visible`. `deleted` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Published normally
    Visible,
    /// Published, awaiting human review
    Flagged,
    /// Withdrawn from public view pending or after review
    Hidden,
    /// Removed by a reviewer
    Deleted,
}

impl Visibility {
    /// Whether an item in this state can be resolved from the queue
    pub fn is_under_review(&self) -> bool {
        matches!(self, Visibility::Flagged | Visibility::Hidden)
    }

    /// Whether no further transitions are possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, Visibility::Deleted)
    }

    /// Lowercase name, as serialized
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Visible => "visible",
            Visibility::Flagged => "flagged",
            Visibility::Hidden => "hidden",
            Visibility::Deleted => "deleted",
        }
    }
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a content item's audit trail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModerationNote {
    /// When the note was written
    pub at: DateTime<Utc>,
    /// Reviewer who wrote it; `None` for automatic actions
    pub author: Option<UserId>,
    /// Note body
    pub text: String,
}

/// A post under the pipeline's control
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    /// Identifier
    pub id: ContentId,
    /// Author of the post
    pub author: UserId,
    /// Raw submitted text
    pub text: String,
    /// Number of attachments (images, files) on the post
    pub attachment_count: u32,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Current visibility
    pub visibility: Visibility,
    /// Risk score stamped at admission
    pub risk_score: i64,
    /// Author trust adjustment computed at admission
    pub author_trust: i64,
    /// When the item last entered review (admission flag, or first report since the last resolution)
    pub flagged_at: Option<DateTime<Utc>>,
    /// Most recent reviewer resolution
    pub reviewed_at: Option<DateTime<Utc>>,
    /// Reviewer of the most recent resolution
    pub reviewed_by: Option<UserId>,
    /// Append-only audit trail
    pub notes: Vec<ModerationNote>,
    /// Optimistic concurrency version, bumped by every committed write
    pub version: u64,
}

impl ContentItem {
    /// Append an audit note
    pub fn append_note(
        &mut self,
        author: Option<UserId>,
        text: impl Into<String>,
        at: DateTime<Utc>,
    ) {
        self.notes.push(ModerationNote {
            at,
            author,
            text: text.into(),
        });
    }

    /// Put an item (back) into review
    ///
    /// Stamps `flagged_at` unless the item is already awaiting review, so an
    /// item that re-enters review after a resolution sorts by the new flag.
    /// Only visible items change visibility, to `flagged`; returns `true` if
    /// they did. Deleted items are left alone.
    pub fn flag(&mut self, at: DateTime<Utc>) -> bool {
        if self.visibility.is_terminal() {
            return false;
        }
        if !self.awaiting_review() {
            self.flagged_at = Some(at);
        }
        if self.visibility != Visibility::Visible {
            return false;
        }
        self.visibility = Visibility::Flagged;
        true
    }

    /// Whether the item was flagged after its most recent review
    pub fn awaiting_review(&self) -> bool {
        match (self.flagged_at, self.reviewed_at) {
            (Some(_), None) => true,
            (Some(flagged), Some(reviewed)) => flagged > reviewed,
            (None, _) => false,
        }
    }
}
