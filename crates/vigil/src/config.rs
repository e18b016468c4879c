//! Rule tables, thresholds and policies, loaded from KDL
//!
//! Configuration is read once at startup into an immutable [`Config`] and
//! shared with the engine components by `Arc`.

use std::path::Path;

use vigil_common::{ModerationError, Result};

use crate::admission::TrustPolicy;
use crate::scoring::{MatcherKind, Rule, RuleSet, RuleTable, SignalLevel};

/// Score at or above which a post is blocked
pub const DEFAULT_BLOCK_THRESHOLD: i64 = 60;
/// Open reports at which an item is hidden automatically
pub const DEFAULT_AUTO_HIDE_THRESHOLD: usize = 3;
/// Longest accepted post, in characters
pub const DEFAULT_MAX_TEXT_LENGTH: usize = 10_000;

/// Built-in rule document
pub const DEFAULT_RULES: &str = include_str!("../rules/default.kdl");

/// Tunable numeric limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    /// Score at or above which a post is blocked
    pub block: i64,
    /// Open reports at which an item is hidden automatically
    pub auto_hide: usize,
    /// Longest accepted post, in characters
    pub max_text_length: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            block: DEFAULT_BLOCK_THRESHOLD,
            auto_hide: DEFAULT_AUTO_HIDE_THRESHOLD,
            max_text_length: DEFAULT_MAX_TEXT_LENGTH,
        }
    }
}

/// Complete pipeline configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Numeric limits
    pub thresholds: Thresholds,
    /// How account trust feeds into admission
    pub trust_policy: TrustPolicy,
    /// Scorer rule tables
    pub rules: RuleSet,
}

impl Config {
    /// The built-in configuration
    pub fn builtin() -> Result<Self> {
        Self::from_kdl(DEFAULT_RULES)
    }

    /// Read and parse a KDL config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ModerationError::io(e).with_context(format!("reading {}", path.display())))?;
        Self::from_kdl(&text).map_err(|e| e.with_help(format!("while loading {}", path.display())))
    }

    /// Parse a KDL config document
    pub fn from_kdl(text: &str) -> Result<Self> {
        let doc = text
            .parse::<kdl::KdlDocument>()
            .map_err(|e| ModerationError::config(format!("Failed to parse KDL: {}", e)))?;

        let mut thresholds: Option<Thresholds> = None;
        let mut trust_policy: Option<TrustPolicy> = None;
        let mut tables = Vec::new();

        for node in doc.nodes() {
            match node.name().value() {
                "thresholds" => {
                    if thresholds.is_some() {
                        return Err(ModerationError::config("Multiple thresholds blocks found"));
                    }
                    thresholds = Some(parse_thresholds(node)?);
                }
                "trust-policy" => {
                    let val = arg_string(node, 0)
                        .ok_or_else(|| ModerationError::config("trust-policy expects a string value"))?;
                    trust_policy = Some(TrustPolicy::parse(val).ok_or_else(|| {
                        ModerationError::config(format!("Unknown trust policy: {}", val))
                    })?);
                }
                "table" => {
                    tables.push(parse_table(node)?);
                }
                other => {
                    return Err(ModerationError::config(format!("Unknown config node: {}", other)));
                }
            }
        }

        if tables.is_empty() {
            return Err(ModerationError::config("Config defines no rule tables"));
        }

        Ok(Config {
            thresholds: thresholds.unwrap_or_default(),
            trust_policy: trust_policy.unwrap_or_default(),
            rules: RuleSet::new(tables)?,
        })
    }
}

/// Positional argument `idx` of a node, as a string
fn arg_string(node: &kdl::KdlNode, idx: usize) -> Option<&str> {
    node.entries()
        .iter()
        .filter(|e| e.name().is_none())
        .nth(idx)
        .and_then(|e| e.value().as_string())
}

/// First positional argument of a node, as a positive integer
fn arg_positive<T: TryFrom<i128>>(node: &kdl::KdlNode) -> Result<T> {
    let name = node.name().value();
    let val = node
        .entries()
        .iter()
        .find(|e| e.name().is_none())
        .and_then(|e| e.value().as_integer())
        .ok_or_else(|| ModerationError::config(format!("{} expects an integer value", name)))?;
    if val <= 0 {
        return Err(ModerationError::config(format!("{} must be positive, got {}", name, val)));
    }
    T::try_from(val)
        .map_err(|_| ModerationError::config(format!("{} out of range: {}", name, val)))
}

fn parse_thresholds(node: &kdl::KdlNode) -> Result<Thresholds> {
    let mut thresholds = Thresholds::default();
    let Some(children) = node.children() else {
        return Ok(thresholds);
    };

    for child in children.nodes() {
        match child.name().value() {
            "block" => thresholds.block = arg_positive(child)?,
            "auto-hide" => thresholds.auto_hide = arg_positive(child)?,
            "max-text-length" => thresholds.max_text_length = arg_positive(child)?,
            other => {
                return Err(ModerationError::config(format!("Unknown threshold: {}", other)));
            }
        }
    }

    Ok(thresholds)
}

fn parse_table(node: &kdl::KdlNode) -> Result<RuleTable> {
    let name = arg_string(node, 0)
        .ok_or_else(|| ModerationError::config("table expects a name as first argument"))?
        .to_string();

    let points = node
        .get("points")
        .and_then(|v| v.as_integer())
        .ok_or_else(|| ModerationError::config(format!("table {} missing points attribute", name)))?;

    let level_str = node
        .get("level")
        .and_then(|v| v.as_string())
        .ok_or_else(|| ModerationError::config(format!("table {} missing level attribute", name)))?;
    let level = SignalLevel::parse(level_str)
        .ok_or_else(|| ModerationError::config(format!("Unknown signal level: {}", level_str)))?;

    let kind_str = node
        .get("kind")
        .and_then(|v| v.as_string())
        .ok_or_else(|| ModerationError::config(format!("table {} missing kind attribute", name)))?;
    let kind = MatcherKind::parse(kind_str)
        .ok_or_else(|| ModerationError::config(format!("Unknown matcher kind: {}", kind_str)))?;

    let children = node
        .children()
        .ok_or_else(|| ModerationError::config(format!("table {} has no children", name)))?;

    let mut rules = Vec::new();
    for child in children.nodes() {
        let child_name = child.name().value();
        if child_name != kind.node_name() {
            return Err(ModerationError::config(format!(
                "table {} of kind {} cannot contain {} entries",
                name,
                kind.node_name(),
                child_name
            )));
        }
        let source = arg_string(child, 0).ok_or_else(|| {
            ModerationError::config(format!("{} in table {} expects a string value", child_name, name))
        })?;
        let category = child
            .get("category")
            .and_then(|v| v.as_string())
            .unwrap_or(name.as_str())
            .to_string();
        let description = child
            .get("description")
            .and_then(|v| v.as_string())
            .map(str::to_string);

        rules.push(match kind {
            MatcherKind::Term => Rule::term(source, category, description)?,
            MatcherKind::Pattern => Rule::pattern(source, category, description)?,
        });
    }

    Ok(RuleTable {
        name: name.into(),
        points: i64::try_from(points)
            .map_err(|_| ModerationError::config(format!("points out of range: {}", points)))?,
        level,
        kind,
        rules,
    })
}
