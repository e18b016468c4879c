use regex::{Regex, RegexBuilder};
use serde::Serialize;
use smol_str::SmolStr;
use vigil_common::{ModerationError, Result};

/// How strongly a triggered signal counts toward review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalLevel {
    /// Likely policy violation; named as the reason when a post is blocked
    Flag,
    /// Worth a second look, never blocks on its own
    Warning,
}

impl SignalLevel {
    /// Parse the config spelling
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "flag" => Some(SignalLevel::Flag),
            "warning" => Some(SignalLevel::Warning),
            _ => None,
        }
    }
}

/// How a table's entries are matched against text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatcherKind {
    /// Literal phrase on word boundaries, whitespace-insensitive
    Term,
    /// Regular expression
    Pattern,
}

impl MatcherKind {
    /// Parse the config spelling
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "term" => Some(MatcherKind::Term),
            "pattern" => Some(MatcherKind::Pattern),
            _ => None,
        }
    }

    /// Name of the child nodes that hold entries of this kind
    pub fn node_name(&self) -> &'static str {
        match self {
            MatcherKind::Term => "term",
            MatcherKind::Pattern => "pattern",
        }
    }
}

/// A single compiled table entry
#[derive(Debug, Clone)]
pub struct Rule {
    /// The phrase or pattern source as written in the config
    pub source: SmolStr,
    /// Category the entry belongs to (e.g. `financial-scam`)
    pub category: SmolStr,
    /// Human-readable explanation shown to submitters and reviewers
    pub description: String,
    regex: Regex,
}

impl Rule {
    /// Compile a literal phrase
    pub fn term(
        phrase: &str,
        category: impl Into<SmolStr>,
        description: Option<String>,
    ) -> Result<Self> {
        let phrase = phrase.trim();
        if phrase.is_empty() {
            return Err(ModerationError::config("empty term"));
        }
        let category = category.into();
        let description =
            description.unwrap_or_else(|| format!("{} language (\"{}\")", category, phrase));
        Ok(Self {
            source: SmolStr::new(phrase),
            regex: compile(&term_pattern(phrase))?,
            category,
            description,
        })
    }

    /// Compile a regular expression
    pub fn pattern(
        pattern: &str,
        category: impl Into<SmolStr>,
        description: Option<String>,
    ) -> Result<Self> {
        let category = category.into();
        let description = description.unwrap_or_else(|| category.to_string());
        Ok(Self {
            source: SmolStr::new(pattern),
            regex: compile(pattern)?,
            category,
            description,
        })
    }

    /// Whether this entry occurs anywhere in `text`
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| ModerationError::config(format!("invalid pattern {:?}: {}", pattern, e)))
}

/// Build the regex for a literal phrase.
///
/// Word boundaries are only asserted next to word characters, so phrases
/// ending in punctuation still match.
fn term_pattern(phrase: &str) -> String {
    let body = phrase
        .split_whitespace()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"\s+");
    let is_word = |c: Option<char>| c.is_some_and(|c| c.is_alphanumeric() || c == '_');
    let lead = if is_word(phrase.chars().next()) { r"\b" } else { "" };
    let trail = if is_word(phrase.chars().last()) { r"\b" } else { "" };
    format!("{}{}{}", lead, body, trail)
}

/// A named group of entries sharing a point value and signal level
#[derive(Debug, Clone)]
pub struct RuleTable {
    /// Table name (e.g. `high-severity`)
    pub name: SmolStr,
    /// Points added per matching entry
    pub points: i64,
    /// Level of the signals this table records
    pub level: SignalLevel,
    /// Matcher kind shared by every entry
    pub kind: MatcherKind,
    /// Entries, in config order
    pub rules: Vec<Rule>,
}

/// Immutable set of rule tables the scorer evaluates
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    tables: Vec<RuleTable>,
}

impl RuleSet {
    /// Create a rule set from tables, rejecting empty tables and non-positive points
    pub fn new(tables: Vec<RuleTable>) -> Result<Self> {
        for table in &tables {
            if table.points <= 0 {
                return Err(ModerationError::config(format!(
                    "table {} must award positive points, got {}",
                    table.name, table.points
                )));
            }
            if table.rules.is_empty() {
                return Err(ModerationError::config(format!(
                    "table {} has no entries",
                    table.name
                )));
            }
        }
        Ok(Self { tables })
    }

    /// Tables in evaluation order
    pub fn tables(&self) -> &[RuleTable] {
        &self.tables
    }

    /// Total number of entries across all tables
    pub fn len(&self) -> usize {
        self.tables.iter().map(|t| t.rules.len()).sum()
    }

    /// Whether the set has no entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
