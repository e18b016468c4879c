use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{ContentId, ReportId, UserId};
use crate::error::ModerationError;

/// Why a community member reported a post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportReason {
    /// Unsolicited advertising or repetitive posting
    Spam,
    /// Threats, bullying or targeted abuse
    Harassment,
    /// Attacks on a protected group
    HateSpeech,
    /// Fraud, money requests, phishing
    Scam,
    /// Sexual or graphic content
    ExplicitContent,
    /// Content promoting or describing self-harm
    SelfHarm,
    /// Pretending to be someone else
    Impersonation,
    /// Anything else; details should explain
    Other,
}

impl ReportReason {
    /// Every reason, in display order
    pub const ALL: [ReportReason; 8] = [
        ReportReason::Spam,
        ReportReason::Harassment,
        ReportReason::HateSpeech,
        ReportReason::Scam,
        ReportReason::ExplicitContent,
        ReportReason::SelfHarm,
        ReportReason::Impersonation,
        ReportReason::Other,
    ];

    /// Kebab-case name, as serialized
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportReason::Spam => "spam",
            ReportReason::Harassment => "harassment",
            ReportReason::HateSpeech => "hate-speech",
            ReportReason::Scam => "scam",
            ReportReason::ExplicitContent => "explicit-content",
            ReportReason::SelfHarm => "self-harm",
            ReportReason::Impersonation => "impersonation",
            ReportReason::Other => "other",
        }
    }
}

impl fmt::Display for ReportReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportReason {
    type Err = ModerationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReportReason::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| {
                ModerationError::validation("reason", format!("unknown report reason: {}", s))
            })
    }
}

/// Lifecycle of a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    /// Awaiting a reviewer
    Pending,
    /// Substantiated: the item was hidden or deleted
    Approved,
    /// Not substantiated: the item was approved
    Denied,
}

/// One community member's complaint against one content item
///
/// Reports are permanent audit records; they change status but are never removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// Identifier
    pub id: ReportId,
    /// Who filed it
    pub reporter: UserId,
    /// The reported post
    pub content: ContentId,
    /// Author of the reported post
    pub reported_user: UserId,
    /// Category
    pub reason: ReportReason,
    /// Optional free-text explanation
    pub details: Option<String>,
    /// Current status
    pub status: ReportStatus,
    /// When it was filed
    pub created_at: DateTime<Utc>,
    /// When a reviewer closed it
    pub resolved_at: Option<DateTime<Utc>>,
    /// Reviewer who closed it
    pub resolver: Option<UserId>,
}

impl Report {
    /// Whether the report still awaits a reviewer
    pub fn is_pending(&self) -> bool {
        self.status == ReportStatus::Pending
    }

    /// Close the report with the given outcome
    pub fn resolve(&mut self, status: ReportStatus, resolver: UserId, at: DateTime<Utc>) {
        self.status = status;
        self.resolver = Some(resolver);
        self.resolved_at = Some(at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reasons_parse_from_their_names() {
        for reason in ReportReason::ALL {
            assert_eq!(reason.as_str().parse::<ReportReason>().unwrap(), reason);
            let json = serde_json::to_string(&reason).unwrap();
            assert_eq!(json, format!("\"{}\"", reason.as_str()));
        }
        assert!("rude".parse::<ReportReason>().is_err());
    }
}
