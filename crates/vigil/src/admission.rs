//! Two-phase content admission
//!
//! [`AdmissionGate::check`] scores a submission and, unless it is blocked,
//! hands back a [`PendingSubmission`] ticket. Nothing is persisted until the
//! ticket is passed to [`AdmissionGate::commit`], which re-runs the check and
//! creates the [`ContentItem`]. Items that need review must be committed with
//! explicit confirmation from the submitter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use vigil_common::{Account, ContentId, ContentItem, ModerationError, Result, Visibility};
use vigil_store::ModerationStore;

use crate::config::{Config, Thresholds};
use crate::scoring::{RiskAssessment, RiskScorer, TriggeredSignal, trust_adjustment};

/// Shown when a post is blocked but no signal gives a better explanation
const GENERIC_BLOCK_REASON: &str = "This post looks likely to break our content policy";

/// How the author's trust adjustment feeds into the admission decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrustPolicy {
    /// Text score alone gates admission; trust is recorded for reviewers
    #[default]
    Separate,
    /// Trust is added to any non-zero text score before thresholding
    Additive,
}

impl TrustPolicy {
    /// Parse the config spelling
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "separate" => Some(TrustPolicy::Separate),
            "additive" => Some(TrustPolicy::Additive),
            _ => None,
        }
    }

    /// Score the admission decision is taken on
    pub fn effective_score(&self, text_score: i64, trust: i64) -> i64 {
        match self {
            TrustPolicy::Separate => text_score,
            TrustPolicy::Additive if text_score > 0 => text_score + trust,
            TrustPolicy::Additive => 0,
        }
    }
}

/// Outcome of an admission check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Decision {
    /// Publish straight away
    Allow,
    /// Publish flagged for review, once the submitter confirms
    NeedsReview,
    /// Refuse; nothing is created
    Blocked,
}

impl Decision {
    /// Visibility a committed item starts in, if it may be created at all
    pub fn initial_visibility(&self) -> Option<Visibility> {
        match self {
            Decision::Allow => Some(Visibility::Visible),
            Decision::NeedsReview => Some(Visibility::Flagged),
            Decision::Blocked => None,
        }
    }
}

/// A post as submitted by its author
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bon::Builder)]
#[builder(start_fn = new)]
pub struct Submission {
    /// Author account
    pub author: Account,
    /// Post body
    #[builder(into)]
    pub text: String,
    /// Number of attachments
    #[serde(default)]
    #[builder(default)]
    pub attachment_count: u32,
}

/// Ticket for a submission that passed the check but is not yet persisted
///
/// Serializable so it can round-trip through a client between the two phases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingSubmission {
    /// Identifier the item will be created under
    pub content_id: ContentId,
    /// The submission being admitted
    #[serde(flatten)]
    pub submission: Submission,
    /// Decision at check time
    pub decision: Decision,
    /// Effective score at check time
    pub score: i64,
}

/// Result of [`AdmissionGate::check`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdmissionResult {
    /// The decision
    pub decision: Decision,
    /// Score the decision was taken on
    pub score: i64,
    /// Text-only score from the scorer
    pub text_score: i64,
    /// Author trust adjustment
    pub author_trust: i64,
    /// Explanation for the submitter
    pub reason: String,
    /// Every signal the scorer recorded
    pub signals: Vec<TriggeredSignal>,
    /// Ticket to commit; absent when blocked
    pub ticket: Option<PendingSubmission>,
}

/// Decides whether a submission is published, flagged or refused
#[derive(Debug, Clone)]
pub struct AdmissionGate<S> {
    scorer: RiskScorer,
    thresholds: Thresholds,
    policy: TrustPolicy,
    store: S,
}

impl<S: ModerationStore> AdmissionGate<S> {
    /// Create a gate over a scorer and a store
    pub fn new(scorer: RiskScorer, thresholds: Thresholds, policy: TrustPolicy, store: S) -> Self {
        Self {
            scorer,
            thresholds,
            policy,
            store,
        }
    }

    /// Create a gate from a loaded config
    pub fn from_config(config: &Config, store: S) -> Self {
        let scorer = RiskScorer::new(Arc::new(config.rules.clone()), config.thresholds.block);
        Self::new(scorer, config.thresholds, config.trust_policy, store)
    }

    /// The scorer in use
    pub fn scorer(&self) -> &RiskScorer {
        &self.scorer
    }

    /// Score a submission without persisting anything
    pub fn check(&self, submission: Submission) -> Result<AdmissionResult> {
        self.check_at(submission, Utc::now())
    }

    pub(crate) fn check_at(
        &self,
        submission: Submission,
        now: DateTime<Utc>,
    ) -> Result<AdmissionResult> {
        self.validate(&submission)?;

        let assessment = self.scorer.score(&submission.text);
        let author_trust = trust_adjustment(&submission.author, now);
        let score = self.policy.effective_score(assessment.score, author_trust);
        let decision = if score >= self.thresholds.block {
            Decision::Blocked
        } else if score > 0 && !assessment.signals.is_empty() {
            Decision::NeedsReview
        } else {
            Decision::Allow
        };
        let reason = reason_for(decision, &assessment);

        let ticket = (decision != Decision::Blocked).then(|| PendingSubmission {
            content_id: ContentId::generate(),
            submission,
            decision,
            score,
        });

        Ok(AdmissionResult {
            decision,
            score,
            text_score: assessment.score,
            author_trust,
            reason,
            signals: assessment.signals,
            ticket,
        })
    }

    /// Finalize a ticket, creating the content item
    ///
    /// The check is re-run; the commit fails if its outcome no longer matches
    /// the ticket. A `NeedsReview` ticket requires `confirmed`.
    #[tracing::instrument(
        name = "commit_submission",
        level = "debug",
        skip_all,
        fields(content_id = %ticket.content_id)
    )]
    pub async fn commit(&self, ticket: PendingSubmission, confirmed: bool) -> Result<ContentItem> {
        let now = Utc::now();
        let PendingSubmission {
            content_id,
            submission,
            decision,
            score,
        } = ticket;

        let recheck = self.check_at(submission.clone(), now)?;
        if recheck.decision != decision || recheck.score != score {
            tracing::warn!(
                %content_id,
                ticket_score = score,
                score = recheck.score,
                "admission outcome changed since check"
            );
            return Err(ModerationError::validation(
                "ticket",
                format!(
                    "admission outcome changed since check ({:?} at {} is now {:?} at {})",
                    decision, score, recheck.decision, recheck.score
                ),
            ));
        }
        let Some(visibility) = decision.initial_visibility() else {
            return Err(ModerationError::validation("ticket", recheck.reason));
        };
        if decision == Decision::NeedsReview && !confirmed {
            return Err(ModerationError::validation(
                "confirmed",
                "this post needs review and must be confirmed before it is published",
            )
            .with_help(recheck.reason));
        }

        let mut item = ContentItem {
            id: content_id,
            author: submission.author.id,
            text: submission.text,
            attachment_count: submission.attachment_count,
            created_at: now,
            visibility: Visibility::Visible,
            risk_score: score,
            author_trust: recheck.author_trust,
            flagged_at: None,
            reviewed_at: None,
            reviewed_by: None,
            notes: Vec::new(),
            version: 0,
        };
        if visibility == Visibility::Flagged {
            item.flag(now);
            item.append_note(
                None,
                format!("Flagged at admission (score {}): {}", score, recheck.reason),
                now,
            );
        }

        self.store.insert_content(item.clone()).await?;
        tracing::info!(content_id = %item.id, visibility = %item.visibility, score, "content admitted");
        Ok(item)
    }

    fn validate(&self, submission: &Submission) -> Result<()> {
        if submission.text.trim().is_empty() && submission.attachment_count == 0 {
            return Err(ModerationError::validation(
                "text",
                "a post needs text or at least one attachment",
            ));
        }
        let len = submission.text.chars().count();
        if len > self.thresholds.max_text_length {
            return Err(ModerationError::validation(
                "text",
                format!(
                    "post is {} characters, the limit is {}",
                    len, self.thresholds.max_text_length
                ),
            ));
        }
        Ok(())
    }
}

fn reason_for(decision: Decision, assessment: &RiskAssessment) -> String {
    match decision {
        Decision::Allow => "No risk signals found".to_string(),
        Decision::Blocked => assessment
            .first_flag()
            .or_else(|| assessment.signals.first())
            .map(|s| format!("This post was blocked: {}", s.description))
            .unwrap_or_else(|| GENERIC_BLOCK_REASON.to_string()),
        Decision::NeedsReview => match assessment.signals.first() {
            Some(s) => format!(
                "This post will be reviewed by a moderator before it is shown: {}",
                s.description
            ),
            None => "This post will be reviewed by a moderator before it is shown".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use vigil_common::{AccountType, ErrorKind, UserId};
    use vigil_store::MemoryStore;

    fn gate(policy: TrustPolicy) -> AdmissionGate<MemoryStore> {
        let mut config = Config::builtin().unwrap();
        config.trust_policy = policy;
        AdmissionGate::from_config(&config, MemoryStore::new())
    }

    fn member(age: Duration) -> Account {
        Account {
            id: UserId::new("member").unwrap(),
            created_at: Utc::now() - age,
            is_admin: false,
            account_type: AccountType::Individual,
        }
    }

    fn submit(text: &str) -> Submission {
        Submission::new().author(member(Duration::days(90))).text(text).build()
    }

    #[test]
    fn benign_text_is_allowed() {
        let result = gate(TrustPolicy::Separate).check(submit("See you at choir practice")).unwrap();
        assert_eq!(result.decision, Decision::Allow);
        assert_eq!(result.score, 0);
        assert!(result.ticket.is_some());
    }

    #[test]
    fn scam_is_blocked_without_ticket() {
        let result = gate(TrustPolicy::Separate)
            .check(submit("Send money to this bank account now, sort code 12-34-56"))
            .unwrap();
        assert_eq!(result.decision, Decision::Blocked);
        assert!(result.score >= 60);
        assert!(result.ticket.is_none());
        assert!(result.reason.contains("financial-scam"), "{}", result.reason);
    }

    #[test]
    fn distress_needs_review() {
        let result = gate(TrustPolicy::Separate)
            .check(submit("Feeling a bit lonely today, anyone fancy a chat?"))
            .unwrap();
        assert_eq!(result.decision, Decision::NeedsReview);
        assert_eq!(result.score, 15);
        assert!(result.reason.contains("lonely"));
    }

    #[test]
    fn empty_post_is_rejected_before_scoring() {
        let err = gate(TrustPolicy::Separate).check(submit("   ")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let photo_only = Submission::new()
            .author(member(Duration::days(90)))
            .text("")
            .attachment_count(2)
            .build();
        let result = gate(TrustPolicy::Separate).check(photo_only).unwrap();
        assert_eq!(result.decision, Decision::Allow);
    }

    #[test]
    fn overlong_post_is_rejected() {
        let text = "a".repeat(10_001);
        let err = gate(TrustPolicy::Separate).check(submit(&text)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn trust_policy_changes_the_decision() {
        let fresh = Submission::new()
            .author(member(Duration::hours(2)))
            .text("Feeling lonely and scared, nobody cares")
            .build();

        let separate = gate(TrustPolicy::Separate).check(fresh.clone()).unwrap();
        assert_eq!(separate.score, 45);
        assert_eq!(separate.author_trust, 20);
        assert_eq!(separate.decision, Decision::NeedsReview);

        let additive = gate(TrustPolicy::Additive).check(fresh).unwrap();
        assert_eq!(additive.text_score, 45);
        assert_eq!(additive.score, 65);
        assert_eq!(additive.decision, Decision::Blocked);
    }

    #[test]
    fn additive_policy_leaves_clean_text_alone() {
        let fresh = Submission::new()
            .author(member(Duration::hours(2)))
            .text("Hello everyone")
            .build();
        let result = gate(TrustPolicy::Additive).check(fresh).unwrap();
        assert_eq!(result.score, 0);
        assert_eq!(result.decision, Decision::Allow);
    }

    #[tokio::test]
    async fn allowed_commit_creates_visible_item() {
        let gate = gate(TrustPolicy::Separate);
        let ticket = gate.check(submit("Lovely weather")).unwrap().ticket.unwrap();
        let item = gate.commit(ticket.clone(), false).await.unwrap();
        assert_eq!(item.id, ticket.content_id);
        assert_eq!(item.visibility, Visibility::Visible);
        assert!(item.flagged_at.is_none());
        assert!(item.notes.is_empty());
    }

    #[tokio::test]
    async fn review_commit_requires_confirmation() {
        let gate = gate(TrustPolicy::Separate);
        let ticket = gate
            .check(submit("Feeling a bit lonely today, anyone fancy a chat?"))
            .unwrap()
            .ticket
            .unwrap();

        let err = gate.commit(ticket.clone(), false).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let item = gate.commit(ticket, true).await.unwrap();
        assert_eq!(item.visibility, Visibility::Flagged);
        assert_eq!(item.risk_score, 15);
        assert!(item.flagged_at.is_some());
        assert_eq!(item.notes.len(), 1);
        assert!(item.notes[0].text.starts_with("Flagged at admission (score 15)"));
    }

    #[tokio::test]
    async fn tampered_ticket_is_rejected() {
        let gate = gate(TrustPolicy::Separate);
        let mut ticket = gate.check(submit("Lovely weather")).unwrap().ticket.unwrap();
        ticket.submission.text = "Send money to my bank account".into();
        let err = gate.commit(ticket, true).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn double_commit_is_rejected() {
        let gate = gate(TrustPolicy::Separate);
        let ticket = gate.check(submit("Lovely weather")).unwrap().ticket.unwrap();
        gate.commit(ticket.clone(), false).await.unwrap();
        let err = gate.commit(ticket, false).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }

    #[test]
    fn tickets_round_trip_through_json() {
        let ticket = gate(TrustPolicy::Separate)
            .check(submit("Lovely weather"))
            .unwrap()
            .ticket
            .unwrap();
        let json = serde_json::to_value(&ticket).unwrap();
        assert_eq!(json["decision"], "allow");
        assert_eq!(json["text"], "Lovely weather");
        let back: PendingSubmission = serde_json::from_value(json).unwrap();
        assert_eq!(back, ticket);
    }
}
