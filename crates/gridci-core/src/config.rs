//! Orchestrator configuration.
//!
//! Configuration is authored as YAML (`ConfigFile`), then compiled once at
//! startup into an immutable `OrchestratorConfig` with validated targets and
//! pre-compiled ref patterns. Every validation failure is fatal before any
//! event is evaluated.

use crate::error::{Error, Result};
use crate::event::EventKind;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

/// OS families accepted as the leading component of a target identifier.
const KNOWN_FAMILIES: &[&str] = &[
    "ubuntu", "macos", "windows", "linux", "debian", "fedora", "alpine", "freebsd",
];

/// Raw, serde-facing configuration as authored in the YAML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
    pub matrix: Vec<String>,
    #[serde(default = "default_fail_fast")]
    pub fail_fast: bool,
    pub command: String,
    #[serde(default)]
    pub env: HashMap<String, String>,
}

fn default_fail_fast() -> bool {
    true
}

/// One trigger rule as authored: event kind plus accepted ref patterns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleConfig {
    pub on: EventKind,
    pub refs: Vec<String>,
}

/// A single matrix target, e.g. `ubuntu-latest` or `macos-13`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetId(String);

impl TargetId {
    /// Validate and wrap a target identifier.
    ///
    /// The identifier must be non-empty, use the `[a-z0-9._-]` charset, and
    /// start with a known OS family (`ubuntu`, `macos`, `windows`, ...).
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.is_empty()
            || !id
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || "._-".contains(c))
        {
            return Err(Error::UnknownTarget(id));
        }
        let family = id.split(['-', '.']).next().unwrap_or_default();
        if !KNOWN_FAMILIES.contains(&family) {
            return Err(Error::UnknownTarget(id));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A compiled ref pattern.
///
/// Plain names match exactly. Filter patterns support `*` (any run of
/// characters), postfix `?` and `+` quantifiers, and `[...]` character
/// classes, so version-tag patterns like `v[0-9]+.*` work. Filters are
/// compiled to anchored regexes at load time.
#[derive(Debug, Clone)]
pub enum RefPattern {
    Exact(String),
    Filter { source: String, regex: Regex },
}

impl RefPattern {
    pub fn parse(pattern: &str) -> Result<Self> {
        if pattern.is_empty() {
            return Err(Error::InvalidPattern {
                pattern: pattern.to_string(),
                reason: "pattern is empty".to_string(),
            });
        }
        if !pattern.chars().any(|c| "*?+[\\".contains(c)) {
            return Ok(RefPattern::Exact(pattern.to_string()));
        }
        let translated = translate(pattern)?;
        let regex = Regex::new(&translated).map_err(|e| Error::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        Ok(RefPattern::Filter {
            source: pattern.to_string(),
            regex,
        })
    }

    pub fn matches(&self, ref_name: &str) -> bool {
        match self {
            RefPattern::Exact(name) => name == ref_name,
            RefPattern::Filter { regex, .. } => regex.is_match(ref_name),
        }
    }

    /// The pattern as authored.
    pub fn source(&self) -> &str {
        match self {
            RefPattern::Exact(name) => name,
            RefPattern::Filter { source, .. } => source,
        }
    }
}

/// Translate a filter pattern into an anchored regex.
fn translate(pattern: &str) -> Result<String> {
    let invalid = |reason: String| Error::InvalidPattern {
        pattern: pattern.to_string(),
        reason,
    };

    let mut out = String::with_capacity(pattern.len() + 8);
    out.push_str("^(?:");
    // Tracks whether the previous token is an atom a quantifier may follow.
    let mut quantifiable = false;
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '*' => {
                out.push_str(".*");
                quantifiable = false;
            }
            '?' | '+' => {
                if !quantifiable {
                    return Err(invalid(format!("'{}' has nothing to repeat", c)));
                }
                out.push(c);
                quantifiable = false;
            }
            '[' => {
                out.push('[');
                let mut closed = false;
                for cc in chars.by_ref() {
                    out.push(cc);
                    if cc == ']' {
                        closed = true;
                        break;
                    }
                }
                if !closed {
                    return Err(invalid("unclosed character class".to_string()));
                }
                quantifiable = true;
            }
            '\\' => match chars.next() {
                Some(esc) => {
                    out.push_str(&regex::escape(&esc.to_string()));
                    quantifiable = true;
                }
                None => return Err(invalid("trailing escape".to_string())),
            },
            _ => {
                out.push_str(&regex::escape(&c.to_string()));
                quantifiable = true;
            }
        }
    }
    out.push_str(")$");
    Ok(out)
}

/// A compiled trigger rule: a predicate over events.
#[derive(Debug, Clone)]
pub struct TriggerRule {
    pub event_kind: EventKind,
    pub patterns: Vec<RefPattern>,
}

/// Immutable orchestrator configuration, constructed once at process start
/// and passed explicitly to the evaluator and expander.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub rules: Vec<TriggerRule>,
    pub matrix: Vec<TargetId>,
    pub fail_fast: bool,
    pub command: String,
    pub env: HashMap<String, String>,
}

impl OrchestratorConfig {
    /// Load and compile a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let file: ConfigFile = serde_yaml::from_str(&raw)?;
        Self::compile(file)
    }

    /// Compile a raw configuration, validating rules, matrix, and command.
    pub fn compile(file: ConfigFile) -> Result<Self> {
        if file.rules.is_empty() {
            return Err(Error::NoRules);
        }
        if file.matrix.is_empty() {
            return Err(Error::EmptyMatrix);
        }
        if file.command.trim().is_empty() {
            return Err(Error::EmptyCommand);
        }

        let mut rules = Vec::with_capacity(file.rules.len());
        for rule in &file.rules {
            if rule.refs.is_empty() {
                return Err(Error::Config(format!(
                    "rule for '{}' has no ref patterns",
                    rule.on
                )));
            }
            let patterns = rule
                .refs
                .iter()
                .map(|p| RefPattern::parse(p))
                .collect::<Result<Vec<_>>>()?;
            rules.push(TriggerRule {
                event_kind: rule.on,
                patterns,
            });
        }

        let mut matrix = Vec::with_capacity(file.matrix.len());
        for target in &file.matrix {
            let target = TargetId::new(target.clone())?;
            if matrix.contains(&target) {
                return Err(Error::DuplicateTarget(target.to_string()));
            }
            matrix.push(target);
        }

        Ok(Self {
            rules,
            matrix,
            fail_fast: file.fail_fast,
            command: file.command,
            env: file.env,
        })
    }
}
