//! Single entry point wiring the pipeline components to one store

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use vigil_common::{
    Account, ContentId, ContentItem, ModerationError, QueueEntry, Report, ReportId, Result,
};
use vigil_store::ModerationStore;

use crate::admission::{AdmissionGate, AdmissionResult, PendingSubmission, Submission};
use crate::config::Config;
use crate::locks::ItemLocks;
use crate::queue::{ModerationQueue, Resolution, ResolveRequest};
use crate::reports::{FiledReport, ReportAggregator, ReportRequest};
use crate::scoring::{RiskAssessment, trust_adjustment};

/// Attempts made at a write that keeps losing version races
pub const MAX_ATTEMPTS: usize = 3;

/// The moderation pipeline over one store
///
/// Cheap to clone; clones share the store and the per-item locks.
#[derive(Debug, Clone)]
pub struct Moderator<S> {
    config: Arc<Config>,
    store: S,
    gate: AdmissionGate<S>,
    reports: ReportAggregator<S>,
    queue: ModerationQueue<S>,
}

impl<S: ModerationStore> Moderator<S> {
    /// Build the pipeline from a loaded config
    pub fn new(config: Config, store: S) -> Self {
        let locks = ItemLocks::new();
        Self {
            gate: AdmissionGate::from_config(&config, store.clone()),
            reports: ReportAggregator::new(store.clone(), locks.clone(), config.thresholds.auto_hide),
            queue: ModerationQueue::new(store.clone(), locks),
            config: Arc::new(config),
            store,
        }
    }

    /// The loaded config
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Score text without any other effect
    pub fn score(&self, text: &str) -> RiskAssessment {
        self.gate.scorer().score(text)
    }

    /// Trust adjustment for an account as of now
    pub fn trust(&self, account: &Account) -> i64 {
        trust_adjustment(account, Utc::now())
    }

    /// First phase of admission
    pub fn check_admission(&self, submission: Submission) -> Result<AdmissionResult> {
        let _span = tracing::debug_span!("check_admission", author = %submission.author.id).entered();
        let result = self.gate.check(submission)?;
        tracing::debug!(decision = ?result.decision, score = result.score, "admission checked");
        Ok(result)
    }

    /// Second phase of admission
    pub async fn commit_submission(
        &self,
        ticket: PendingSubmission,
        confirmed: bool,
    ) -> Result<ContentItem> {
        self.gate.commit(ticket, confirmed).await
    }

    /// File a community report
    pub async fn file_report(&self, request: ReportRequest) -> Result<FiledReport> {
        retry("file_report", || self.reports.file(request.clone())).await
    }

    /// Items awaiting review, newest flagged first
    pub async fn queue(&self) -> Result<Vec<QueueEntry>> {
        self.queue.list().await
    }

    /// Resolve a queue entry
    pub async fn resolve(&self, request: ResolveRequest) -> Result<Resolution> {
        retry("resolve", || self.queue.resolve(request.clone())).await
    }

    /// Look up a content item
    pub async fn content(&self, id: &ContentId) -> Result<ContentItem> {
        self.store
            .content(id)
            .await?
            .ok_or_else(|| ModerationError::not_found("content", id))
    }

    /// All reports against a content item, oldest first
    pub async fn reports(&self, id: &ContentId) -> Result<Vec<Report>> {
        // distinguishes an unknown item from one nobody has reported
        self.content(id).await?;
        self.store.reports_for(id).await
    }

    /// Look up a report
    pub async fn report(&self, id: &ReportId) -> Result<Report> {
        self.store
            .report(id)
            .await?
            .ok_or_else(|| ModerationError::not_found("report", id))
    }
}

/// Re-run `op` while it fails with a retryable error, up to [`MAX_ATTEMPTS`] times
async fn retry<T, F, Fut>(operation: &'static str, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Err(e) if e.is_retryable() && attempt < MAX_ATTEMPTS => {
                tracing::warn!(operation, attempt, error = %e, "lost a write race, retrying");
                attempt += 1;
            }
            result => return result,
        }
    }
}
