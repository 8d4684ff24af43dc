//! Command categories, one record per recognized command family.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{CtkError, Result};

/// Named compaction transform applied after skip-pattern removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompactRule {
    #[default]
    Identity,
    GitStatus,
    Pytest,
    CargoTest,
    GoTest,
    ContainerTable,
}

impl CompactRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Identity => "identity",
            Self::GitStatus => "git-status",
            Self::Pytest => "pytest",
            Self::CargoTest => "cargo-test",
            Self::GoTest => "go-test",
            Self::ContainerTable => "container-table",
        }
    }
}

/// Locates the nested command inside a compound invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtractorKind {
    #[default]
    None,
    /// `docker compose exec [opts] <service> <cmd..>`
    ComposeExec,
    /// `docker [container] exec [opts] <container> <cmd..>`
    DockerExec,
    /// `kubectl exec [opts] <pod> -- <cmd..>`
    KubectlExec,
}

/// When two consecutive lines count as the same line for streak collapsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Similarity {
    #[default]
    Exact,
    /// Digit runs and long hex runs are masked before comparing.
    MaskNumbers,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupePolicy {
    pub similarity: Similarity,
    pub min_repeats: usize,
}

impl DedupePolicy {
    pub const DEFAULT_MIN_REPEATS: usize = 3;

    pub fn new(similarity: Similarity, min_repeats: usize) -> Self {
        Self { similarity, min_repeats }
    }

    /// Streaks shorter than this are left alone. Never below 2.
    pub fn effective_min_repeats(&self) -> usize {
        self.min_repeats.max(2)
    }
}

impl Default for DedupePolicy {
    fn default() -> Self {
        Self::new(Similarity::Exact, Self::DEFAULT_MIN_REPEATS)
    }
}

/// Serialized form of a match pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternSpec {
    /// Literal word prefix of the normalized command line.
    Prefix(String),
    Regex(String),
}

/// Compiled match pattern.
#[derive(Debug, Clone)]
pub enum MatchPattern {
    Prefix(String),
    Regex(Regex),
}

impl MatchPattern {
    /// Test against a normalized (single-space separated) command line.
    pub fn is_match(&self, normalized: &str) -> bool {
        match self {
            Self::Prefix(prefix) => {
                normalized == prefix
                    || (normalized.starts_with(prefix.as_str())
                        && normalized.as_bytes().get(prefix.len()) == Some(&b' '))
            }
            Self::Regex(re) => re.is_match(normalized),
        }
    }
}

fn default_true() -> bool {
    true
}

/// Declarative category definition, as stored in the versioned catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySpec {
    pub name: String,
    #[serde(default)]
    pub matches: Vec<PatternSpec>,
    #[serde(default)]
    pub extractor: ExtractorKind,
    #[serde(default)]
    pub skip: Vec<String>,
    #[serde(default)]
    pub compact: CompactRule,
    #[serde(default)]
    pub dedupe: DedupePolicy,
    /// Also match segments after `&&`, `||`, `;` or a newline.
    #[serde(default)]
    pub multi_segment: bool,
    /// Rewrite matched commands through the proxy.
    #[serde(default = "default_true")]
    pub proxy: bool,
}

impl CategorySpec {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            matches: Vec::new(),
            extractor: ExtractorKind::None,
            skip: Vec::new(),
            compact: CompactRule::Identity,
            dedupe: DedupePolicy::default(),
            multi_segment: false,
            proxy: true,
        }
    }

    pub fn prefix(mut self, prefix: &str) -> Self {
        self.matches.push(PatternSpec::Prefix(prefix.to_string()));
        self
    }

    pub fn regex(mut self, pattern: &str) -> Self {
        self.matches.push(PatternSpec::Regex(pattern.to_string()));
        self
    }

    pub fn skip(mut self, patterns: &[&str]) -> Self {
        self.skip.extend(patterns.iter().map(|p| p.to_string()));
        self
    }

    pub fn compact(mut self, rule: CompactRule) -> Self {
        self.compact = rule;
        self
    }

    pub fn dedupe(mut self, similarity: Similarity, min_repeats: usize) -> Self {
        self.dedupe = DedupePolicy::new(similarity, min_repeats);
        self
    }

    pub fn extractor(mut self, kind: ExtractorKind) -> Self {
        self.extractor = kind;
        self
    }

    pub fn multi_segment(mut self) -> Self {
        self.multi_segment = true;
        self
    }

    pub fn no_proxy(mut self) -> Self {
        self.proxy = false;
        self
    }
}

/// Immutable, compiled command category.
#[derive(Debug, Clone)]
pub struct CommandCategory {
    name: String,
    matchers: Vec<MatchPattern>,
    extractor: ExtractorKind,
    skip_patterns: Vec<Regex>,
    compact: CompactRule,
    dedupe: DedupePolicy,
    multi_segment: bool,
    proxy: bool,
}

impl CommandCategory {
    /// Compile a spec, validating every pattern.
    pub fn compile(spec: &CategorySpec) -> Result<Self> {
        if spec.matches.is_empty() {
            return Err(CtkError::EmptyCategory { name: spec.name.clone() });
        }
        let invalid = |pattern: &str, source| CtkError::InvalidPattern {
            category: spec.name.clone(),
            pattern: pattern.to_string(),
            source,
        };

        let mut matchers = Vec::with_capacity(spec.matches.len());
        for m in &spec.matches {
            matchers.push(match m {
                PatternSpec::Prefix(p) => {
                    MatchPattern::Prefix(p.split_whitespace().collect::<Vec<_>>().join(" "))
                }
                PatternSpec::Regex(p) => {
                    MatchPattern::Regex(Regex::new(p).map_err(|e| invalid(p, e))?)
                }
            });
        }

        let mut skip_patterns = Vec::with_capacity(spec.skip.len());
        for p in &spec.skip {
            skip_patterns.push(Regex::new(p).map_err(|e| invalid(p, e))?);
        }

        Ok(Self {
            name: spec.name.clone(),
            matchers,
            extractor: spec.extractor,
            skip_patterns,
            compact: spec.compact,
            dedupe: spec.dedupe,
            multi_segment: spec.multi_segment,
            proxy: spec.proxy,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn matchers(&self) -> &[MatchPattern] {
        &self.matchers
    }

    /// True when any match pattern accepts the normalized command line.
    pub fn matches(&self, normalized: &str) -> bool {
        self.matchers.iter().any(|m| m.is_match(normalized))
    }

    pub fn extractor(&self) -> ExtractorKind {
        self.extractor
    }

    /// Noise regexes, in evaluation order.
    pub fn skip_patterns(&self) -> &[Regex] {
        &self.skip_patterns
    }

    pub fn compact_rule(&self) -> CompactRule {
        self.compact
    }

    pub fn dedupe(&self) -> DedupePolicy {
        self.dedupe
    }

    pub fn is_multi_segment(&self) -> bool {
        self.multi_segment
    }

    pub fn proxies(&self) -> bool {
        self.proxy
    }
}
