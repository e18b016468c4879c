//! Domain types shared by the scorer, the store and the queue

/// Account metadata consumed by the trust signal
pub mod account;
/// Content items, visibility states and the moderation audit trail
pub mod content;
/// Typed identifiers
pub mod ids;
/// Admin-facing queue projection
pub mod queue;
/// Community reports
pub mod report;

pub use account::{Account, AccountType};
pub use content::{ContentItem, ModerationNote, Visibility};
pub use ids::{ContentId, ReportId, UserId};
pub use queue::QueueEntry;
pub use report::{Report, ReportReason, ReportStatus};
