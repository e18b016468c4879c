//! Heuristic text scoring and account trust
//!
//! [`RiskScorer`] is pure and synchronous: the same text against the same
//! [`RuleSet`] always produces the same [`RiskAssessment`].

/// Rule tables and their KDL-loaded matchers
pub mod rules;
/// Summing triggered rule tables into a score
pub mod scorer;
/// Account-age and role adjustment
pub mod trust;

pub use rules::{MatcherKind, Rule, RuleSet, RuleTable, SignalLevel};
pub use scorer::{RiskAssessment, RiskScorer, TriggeredSignal};
pub use trust::trust_adjustment;
