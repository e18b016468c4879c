//! # Vigil
//!
//! Content-trust scoring and a human review queue for community platforms.
//!
//! A post passes through [`AdmissionGate`] before it exists: the
//! [`RiskScorer`] sums points from configurable rule tables, and the result
//! decides whether the post is published, published flagged for review (after
//! the author confirms), or refused outright. Once published, community
//! members file reports through [`ReportAggregator`], which flags the post and
//! hides it automatically when enough reports pile up. Reviewers work through
//! [`ModerationQueue`], where each resolution closes out every pending report
//! on the item in one atomic write.
//!
//! [`Moderator`] wires all of this to a single [`ModerationStore`] and is the
//! usual entry point.
//!
//! ```no_run
//! use vigil::{Config, Moderator, Submission};
//! use vigil_common::{Account, AccountType, UserId};
//! use vigil_store::MemoryStore;
//!
//! # async fn run() -> vigil_common::Result<()> {
//! let moderator = Moderator::new(Config::builtin()?, MemoryStore::new());
//!
//! let author = Account {
//!     id: UserId::new("alice")?,
//!     created_at: chrono::Utc::now() - chrono::Duration::days(30),
//!     is_admin: false,
//!     account_type: AccountType::Individual,
//! };
//! let check = moderator.check_admission(
//!     Submission::new().author(author).text("Anyone up for a walk on Sunday?").build(),
//! )?;
//! if let Some(ticket) = check.ticket {
//!     let item = moderator.commit_submission(ticket, true).await?;
//!     println!("published {} as {}", item.id, item.visibility);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! Rule tables and thresholds are KDL; see [`config`] and the built-in
//! `rules/default.kdl`.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod admission;
pub mod cli;
pub mod config;
pub mod locks;
pub mod moderator;
pub mod queue;
pub mod reports;
pub mod scoring;

pub use admission::{
    AdmissionGate, AdmissionResult, Decision, PendingSubmission, Submission, TrustPolicy,
};
pub use config::{Config, Thresholds};
pub use locks::ItemLocks;
pub use moderator::Moderator;
pub use queue::{ModerationQueue, Resolution, ResolveAction, ResolveRequest};
pub use reports::{FiledReport, ReportAggregator, ReportRequest};
pub use scoring::{RiskAssessment, RiskScorer, RuleSet, TriggeredSignal, trust_adjustment};

pub use vigil_common::{ModerationError, Result};
pub use vigil_store::{FileStore, MemoryStore, ModerationStore};
