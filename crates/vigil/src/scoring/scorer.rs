use serde::Serialize;
use smol_str::SmolStr;
use std::sync::Arc;

use super::rules::{RuleSet, SignalLevel};

/// One table entry that matched the scored text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TriggeredSignal {
    /// Table the entry belongs to
    pub table: SmolStr,
    /// Entry category
    pub category: SmolStr,
    /// The phrase or pattern that matched
    pub matched: SmolStr,
    /// Points contributed
    pub points: i64,
    /// Signal level
    pub level: SignalLevel,
    /// Human-readable explanation
    pub description: String,
}

/// Result of scoring one text; never persisted
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct RiskAssessment {
    /// Sum of all contributed points, unbounded above
    pub score: i64,
    /// Every entry that matched, in table then entry order
    pub signals: Vec<TriggeredSignal>,
    /// Whether `score` reached the block threshold
    pub blocked: bool,
}

impl RiskAssessment {
    /// First flag-level signal, the one named when a post is blocked
    pub fn first_flag(&self) -> Option<&TriggeredSignal> {
        self.signals.iter().find(|s| s.level == SignalLevel::Flag)
    }
}

/// Deterministic heuristic risk scorer
///
/// Evaluates every entry of every table against the text. Each entry that
/// matches adds its table's points once, however many times it occurs; there
/// is no early exit and no ceiling.
#[derive(Debug, Clone)]
pub struct RiskScorer {
    rules: Arc<RuleSet>,
    block_threshold: i64,
}

impl RiskScorer {
    /// Create a scorer over an injected rule set
    pub fn new(rules: Arc<RuleSet>, block_threshold: i64) -> Self {
        Self {
            rules,
            block_threshold,
        }
    }

    /// Score at or above which text is blocked
    pub fn block_threshold(&self) -> i64 {
        self.block_threshold
    }

    /// The rule set in use
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Score `text`
    pub fn score(&self, text: &str) -> RiskAssessment {
        let text = normalize(text);
        if text.trim().is_empty() {
            return RiskAssessment::default();
        }

        let mut assessment = RiskAssessment::default();
        for table in self.rules.tables() {
            for rule in &table.rules {
                if rule.is_match(&text) {
                    assessment.score += table.points;
                    assessment.signals.push(TriggeredSignal {
                        table: table.name.clone(),
                        category: rule.category.clone(),
                        matched: rule.source.clone(),
                        points: table.points,
                        level: table.level,
                        description: rule.description.clone(),
                    });
                }
            }
        }
        assessment.blocked = assessment.score >= self.block_threshold;
        assessment
    }
}

/// Fold typographic apostrophes so `don’t` matches `don't`
fn normalize(text: &str) -> std::borrow::Cow<'_, str> {
    if text.contains(['\u{2018}', '\u{2019}']) {
        text.replace(['\u{2018}', '\u{2019}'], "'").into()
    } else {
        text.into()
    }
}
